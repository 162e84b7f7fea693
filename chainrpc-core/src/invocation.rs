//! # Invocations
//!
//! An [`Invocation`] is one resolved method call: a method descriptor plus its arguments,
//! optionally chained under the call that produced its receiver. `world.humans().find(1)` is the
//! two-link chain `humans()` → `find(1)`.
//!
//! Chains are built on the client side by an [`InvocationProxy`] and on the server side by the
//! protocol decoder, then replayed against a concrete service with [`Invocation::invoke`].
mod proxy;

pub use proxy::{InvocationProxy, Invoker, ProxyResult};

use crate::BoxError;
use crate::descriptors::MethodDescriptor;
use crate::format::FormatError;
use crate::rpc::{ProtocolError, TransportError};
use crate::value::{FromValue, Message, Value, ValueError};
use std::any::Any;
use std::sync::Arc;

/// The error every service method, dispatcher, invoker and session returns.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    #[error("Wrong number of arguments for '{method}', {expected} expected, {actual} got")]
    ArgumentCount {
        method: String,
        expected: usize,
        actual: usize,
    },
    #[error("Method '{0}' is terminal and cannot be followed by another call")]
    TerminalParent(String),
    #[error("Method '{method}' does not belong to interface '{interface}'")]
    UnknownMethod { interface: String, method: String },
    #[error("Method '{0}' does not return an interface")]
    NotContinuation(String),
    #[error("Method '{0}' returns an interface and must be followed by another call")]
    NotTerminal(String),
    #[error("The receiver of '{method}' is not a '{expected}'")]
    ReceiverMismatch {
        method: String,
        expected: &'static str,
    },
    #[error("No argument at position {0}")]
    MissingArgument(usize),
    #[error("Invalid argument at position {index}: {source}")]
    Argument {
        index: usize,
        #[source]
        source: ValueError,
    },
    #[error("Invalid result of '{method}': {source}")]
    InvalidResult {
        method: String,
        #[source]
        source: ValueError,
    },
    #[error("Application exception: {0:?}")]
    Application(Box<dyn Message>),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Other(BoxError),
}

impl InvokeError {
    /// Wraps an instance of the interface's declared exception.
    pub fn application(exception: impl Message) -> Self {
        InvokeError::Application(Box::new(exception))
    }

    /// Wraps any other failure of a service implementation.
    pub fn other(error: impl Into<BoxError>) -> Self {
        InvokeError::Other(error.into())
    }

    pub fn as_application(&self) -> Option<&dyn Message> {
        match self {
            InvokeError::Application(exception) => Some(exception.as_ref()),
            _ => None,
        }
    }
}

/// What a dispatcher produced: a terminal value or the receiver of the next call.
#[derive(Debug)]
pub enum Dispatched {
    Value(Option<Value>),
    Interface(Box<dyn Any + Send + Sync>),
}

impl Dispatched {
    pub fn data<T: Into<Value>>(value: Option<T>) -> Self {
        Dispatched::Value(value.map(Into::into))
    }

    pub fn void() -> Self {
        Dispatched::Value(None)
    }

    pub fn interface<R: Any + Send + Sync>(receiver: R) -> Self {
        Dispatched::Interface(Box::new(receiver))
    }
}

/// Reads argument `index` for a dispatcher.
pub fn arg<T: FromValue>(args: &[Option<Value>], index: usize) -> Result<Option<T>, InvokeError> {
    match args.get(index) {
        None => Err(InvokeError::MissingArgument(index)),
        Some(None) => Ok(None),
        Some(Some(value)) => T::from_value(value.clone())
            .map(Some)
            .map_err(|source| InvokeError::Argument { index, source }),
    }
}

/// One link of a call chain.
///
/// Arguments and parents are shared, so cloning a link and chaining onto it copy no values.
#[derive(Debug, Clone)]
pub struct Invocation {
    method: &'static MethodDescriptor,
    args: Arc<[Option<Value>]>,
    parent: Option<Arc<Invocation>>,
}

impl Invocation {
    /// Starts a chain. Arguments are copied, so later changes on either side stay invisible to
    /// the other.
    pub fn root(
        method: &'static MethodDescriptor,
        args: &[Option<Value>],
    ) -> Result<Self, InvokeError> {
        check_arity(method, args)?;
        Ok(Self::chained(method, args.to_vec(), None))
    }

    /// Continues the chain with a call on the interface this invocation returns.
    pub fn next(
        &self,
        method: &'static MethodDescriptor,
        args: &[Option<Value>],
    ) -> Result<Self, InvokeError> {
        if self.method.is_terminal() {
            return Err(InvokeError::TerminalParent(self.method.name().to_owned()));
        }

        check_arity(method, args)?;
        Ok(Self::chained(method, args.to_vec(), Some(self.clone())))
    }

    /// Links without checks, for callers that built `args` from the descriptor itself.
    pub(crate) fn chained(
        method: &'static MethodDescriptor,
        args: Vec<Option<Value>>,
        parent: Option<Invocation>,
    ) -> Self {
        Self {
            method,
            args: args.into(),
            parent: parent.map(Arc::new),
        }
    }

    pub fn method(&self) -> &'static MethodDescriptor {
        self.method
    }

    pub fn args(&self) -> &[Option<Value>] {
        &self.args
    }

    pub fn parent(&self) -> Option<&Invocation> {
        self.parent.as_deref()
    }

    /// The chain in call order, ending with `self`.
    pub fn to_chain(&self) -> Vec<&Invocation> {
        let mut chain = vec![self];
        let mut current = self;

        while let Some(parent) = current.parent.as_deref() {
            chain.push(parent);
            current = parent;
        }

        chain.reverse();
        chain
    }

    /// Replays the chain against `receiver`, feeding every continuation's result to the next
    /// call. The first error aborts the replay.
    pub fn invoke(&self, receiver: &dyn Any) -> Result<Option<Value>, InvokeError> {
        let chain = self.to_chain();
        let mut current: Option<Box<dyn Any + Send + Sync>> = None;

        for (position, invocation) in chain.iter().enumerate() {
            let target: &dyn Any = match &current {
                Some(next) => &**next,
                None => receiver,
            };

            tracing::debug!(method = invocation.method.name(), "dispatching");

            match invocation.method.dispatch(target, &invocation.args)? {
                Dispatched::Interface(next) => current = Some(next),
                Dispatched::Value(value) if position + 1 == chain.len() => return Ok(value),
                Dispatched::Value(_) => {
                    return Err(InvokeError::NotContinuation(
                        invocation.method.name().to_owned(),
                    ));
                }
            }
        }

        Err(InvokeError::NotTerminal(self.method.name().to_owned()))
    }
}

impl PartialEq for Invocation {
    fn eq(&self, other: &Self) -> bool {
        self.method == other.method && self.args == other.args && self.parent == other.parent
    }
}

fn check_arity(method: &MethodDescriptor, args: &[Option<Value>]) -> Result<(), InvokeError> {
    let expected = method.args().len();
    if args.len() != expected {
        return Err(InvokeError::ArgumentCount {
            method: method.name().to_owned(),
            expected,
            actual: args.len(),
        });
    }
    Ok(())
}
