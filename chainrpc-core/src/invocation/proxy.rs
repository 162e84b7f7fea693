use super::{Invocation, InvokeError};
use crate::descriptors::{InterfaceDescriptor, MethodDescriptor, MethodResult};
use crate::value::{FromValue, Value, from_optional};
use std::fmt;
use std::sync::Arc;

/// The single entry point a proxy forwards terminal calls to.
pub trait Invoker: Send + Sync {
    fn invoke(&self, invocation: Invocation) -> Result<Option<Value>, InvokeError>;
}

impl<F> Invoker for F
where
    F: Fn(Invocation) -> Result<Option<Value>, InvokeError> + Send + Sync,
{
    fn invoke(&self, invocation: Invocation) -> Result<Option<Value>, InvokeError> {
        self(invocation)
    }
}

pub enum ProxyResult {
    Value(Option<Value>),
    Proxy(InvocationProxy),
}

/// Captures calls on an interface into invocation chains.
///
/// Continuation methods return a new proxy over the result interface, bound to the extended
/// chain. Terminal methods hand the finished chain to the [`Invoker`]. Generated clients wrap a
/// proxy in one small struct per interface that implements the service trait.
#[derive(Clone)]
pub struct InvocationProxy {
    descriptor: &'static InterfaceDescriptor,
    invoker: Arc<dyn Invoker>,
    parent: Option<Invocation>,
}

impl InvocationProxy {
    pub fn new(descriptor: &'static InterfaceDescriptor, invoker: Arc<dyn Invoker>) -> Self {
        Self {
            descriptor,
            invoker,
            parent: None,
        }
    }

    pub fn descriptor(&self) -> &'static InterfaceDescriptor {
        self.descriptor
    }

    /// The chain captured so far, `None` for a root proxy.
    pub fn parent(&self) -> Option<&Invocation> {
        self.parent.as_ref()
    }

    pub fn invoke(
        &self,
        method: &'static MethodDescriptor,
        args: &[Option<Value>],
    ) -> Result<ProxyResult, InvokeError> {
        if !self.descriptor.contains(method) {
            return Err(InvokeError::UnknownMethod {
                interface: self.descriptor.name().to_owned(),
                method: method.name().to_owned(),
            });
        }

        let invocation = match &self.parent {
            Some(parent) => parent.next(method, args)?,
            None => Invocation::root(method, args)?,
        };

        match method.result() {
            MethodResult::Interface(next) => Ok(ProxyResult::Proxy(InvocationProxy {
                descriptor: next,
                invoker: self.invoker.clone(),
                parent: Some(invocation),
            })),
            MethodResult::Data(_) => self.invoker.invoke(invocation).map(ProxyResult::Value),
        }
    }

    /// Calls a terminal method.
    pub fn call(
        &self,
        method: &'static MethodDescriptor,
        args: &[Option<Value>],
    ) -> Result<Option<Value>, InvokeError> {
        if !method.is_terminal() {
            return Err(InvokeError::NotTerminal(method.name().to_owned()));
        }

        match self.invoke(method, args)? {
            ProxyResult::Value(value) => Ok(value),
            ProxyResult::Proxy(_) => Err(InvokeError::NotTerminal(method.name().to_owned())),
        }
    }

    /// Calls a terminal method and converts its result.
    pub fn call_as<T: FromValue>(
        &self,
        method: &'static MethodDescriptor,
        args: &[Option<Value>],
    ) -> Result<Option<T>, InvokeError> {
        from_optional(self.call(method, args)?).map_err(|source| InvokeError::InvalidResult {
            method: method.name().to_owned(),
            source,
        })
    }

    /// Calls a continuation method.
    pub fn chain(
        &self,
        method: &'static MethodDescriptor,
        args: &[Option<Value>],
    ) -> Result<InvocationProxy, InvokeError> {
        if method.is_terminal() {
            return Err(InvokeError::NotContinuation(method.name().to_owned()));
        }

        match self.invoke(method, args)? {
            ProxyResult::Proxy(proxy) => Ok(proxy),
            ProxyResult::Value(_) => Err(InvokeError::NotContinuation(method.name().to_owned())),
        }
    }
}

impl fmt::Debug for InvocationProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationProxy")
            .field("descriptor", &self.descriptor)
            .field("parent", &self.parent)
            .finish()
    }
}
