use super::{DataType, DescriptorError, LazyRef, MessageDescriptor, Visited, first_visit, verify_data_type};
use crate::invocation::{Dispatched, InvokeError};
use crate::value::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::ptr;

type Dispatcher =
    Box<dyn Fn(&dyn Any, &[Option<Value>]) -> Result<Dispatched, InvokeError> + Send + Sync>;

/// Where an argument travels in a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgRouting {
    /// Appended to the path, right after the method name.
    Path,
    Query,
    /// Sent as a form field of a POST body.
    Body,
}

#[derive(Debug, Clone)]
pub struct ArgumentDescriptor {
    name: String,
    ty: DataType,
    routing: ArgRouting,
}

impl ArgumentDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &DataType {
        &self.ty
    }

    pub fn routing(&self) -> ArgRouting {
        self.routing
    }
}

/// What a method returns: data ends a chain, an interface continues it.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodResult {
    Data(DataType),
    Interface(&'static InterfaceDescriptor),
}

impl MethodResult {
    pub fn data_type(&self) -> Option<&DataType> {
        match self {
            MethodResult::Data(ty) => Some(ty),
            MethodResult::Interface(_) => None,
        }
    }

    pub fn interface(&self) -> Option<&'static InterfaceDescriptor> {
        match self {
            MethodResult::Data(_) => None,
            MethodResult::Interface(descriptor) => Some(descriptor),
        }
    }
}

impl fmt::Display for MethodResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodResult::Data(ty) => ty.fmt(f),
            MethodResult::Interface(descriptor) => f.write_str(descriptor.name()),
        }
    }
}

/// An interface method with its arguments, result and bound dispatcher.
pub struct MethodDescriptor {
    name: String,
    args: Vec<ArgumentDescriptor>,
    result: LazyRef<MethodResult>,
    post: bool,
    dispatcher: Dispatcher,
}

impl MethodDescriptor {
    pub fn builder(name: impl Into<String>) -> MethodDescriptorBuilder {
        MethodDescriptorBuilder {
            name: name.into(),
            args: Vec::new(),
            result: None,
            post: false,
            dispatcher: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[ArgumentDescriptor] {
        &self.args
    }

    pub fn result(&self) -> &MethodResult {
        self.result.get()
    }

    /// True if the method must be called with POST.
    pub fn is_post(&self) -> bool {
        self.post
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.result(), MethodResult::Data(_))
    }

    /// Calls this method on `receiver` with already decoded arguments.
    pub fn dispatch(
        &self,
        receiver: &dyn Any,
        args: &[Option<Value>],
    ) -> Result<Dispatched, InvokeError> {
        (self.dispatcher)(receiver, args)
    }
}

impl PartialEq for MethodDescriptor {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self, other)
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MethodDescriptor").field(&self.name).finish()
    }
}

pub struct MethodDescriptorBuilder {
    name: String,
    args: Vec<ArgumentDescriptor>,
    result: Option<LazyRef<MethodResult>>,
    post: bool,
    dispatcher: Option<Dispatcher>,
}

impl MethodDescriptorBuilder {
    pub fn arg(mut self, name: impl Into<String>, ty: DataType, routing: ArgRouting) -> Self {
        self.args.push(ArgumentDescriptor {
            name: name.into(),
            ty,
            routing,
        });
        self
    }

    pub fn post(mut self) -> Self {
        self.post = true;
        self
    }

    pub fn returns(mut self, ty: DataType) -> Self {
        self.result = Some(LazyRef::Ready(MethodResult::Data(ty)));
        self
    }

    /// A data result resolved on first access.
    pub fn returns_lazy(mut self, ty: fn() -> DataType) -> Self {
        self.result = Some(LazyRef::deferred(move || MethodResult::Data(ty())));
        self
    }

    /// Makes this a continuation method: calling it yields another interface.
    pub fn returns_interface(mut self, interface: fn() -> &'static InterfaceDescriptor) -> Self {
        self.result = Some(LazyRef::deferred(move || {
            MethodResult::Interface(interface())
        }));
        self
    }

    /// Binds the function that calls this method on a concrete receiver of type `R`.
    ///
    /// The receiver is the service handed to [`crate::RpcHandler`] for root methods, and the
    /// value a continuation returned through [`Dispatched::interface`] otherwise.
    pub fn dispatcher<R, F>(mut self, dispatch: F) -> Self
    where
        R: Any,
        F: Fn(&R, &[Option<Value>]) -> Result<Dispatched, InvokeError> + Send + Sync + 'static,
    {
        let method = self.name.clone();
        let dispatcher = move |receiver: &dyn Any,
                               args: &[Option<Value>]|
              -> Result<Dispatched, InvokeError> {
            let receiver =
                receiver
                    .downcast_ref::<R>()
                    .ok_or_else(|| InvokeError::ReceiverMismatch {
                        method: method.clone(),
                        expected: std::any::type_name::<R>(),
                    })?;
            dispatch(receiver, args)
        };
        self.dispatcher = Some(Box::new(dispatcher));
        self
    }

    pub fn build(self) -> Result<MethodDescriptor, DescriptorError> {
        let name = self.name;

        for (i, arg) in self.args.iter().enumerate() {
            if self.args[..i].iter().any(|other| other.name == arg.name) {
                return Err(DescriptorError::DuplicateArgument {
                    method: name,
                    argument: arg.name.clone(),
                });
            }

            if arg.routing == ArgRouting::Body && !self.post {
                return Err(DescriptorError::BodyArgumentWithoutPost {
                    method: name,
                    argument: arg.name.clone(),
                });
            }
        }

        let result = self
            .result
            .ok_or_else(|| DescriptorError::MissingResult(name.clone()))?;
        let dispatcher = self
            .dispatcher
            .ok_or_else(|| DescriptorError::MissingDispatcher(name.clone()))?;

        Ok(MethodDescriptor {
            name,
            args: self.args,
            result,
            post: self.post,
            dispatcher,
        })
    }
}

/// An interface: an ordered set of methods and the one exception type they may throw.
pub struct InterfaceDescriptor {
    name: String,
    base: Option<&'static InterfaceDescriptor>,
    methods: Vec<&'static MethodDescriptor>,
    index: HashMap<String, usize>,
    exception: Option<&'static MessageDescriptor>,
}

impl InterfaceDescriptor {
    pub fn builder(name: impl Into<String>) -> InterfaceDescriptorBuilder {
        InterfaceDescriptorBuilder {
            name: name.into(),
            base: None,
            methods: Vec::new(),
            exception: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> Option<&'static InterfaceDescriptor> {
        self.base
    }

    /// All methods, inherited ones first.
    pub fn methods(&self) -> &[&'static MethodDescriptor] {
        &self.methods
    }

    pub fn method(&self, name: &str) -> Option<&'static MethodDescriptor> {
        self.index.get(name).map(|&i| self.methods[i])
    }

    pub fn contains(&self, method: &MethodDescriptor) -> bool {
        self.methods.iter().any(|known| ptr::eq(*known, method))
    }

    /// The declared exception, inherited from the base interface when not declared here.
    pub fn exception(&self) -> Option<&'static MessageDescriptor> {
        self.exception
    }

    /// Resolves every lazy reference reachable from this interface.
    pub fn verify(&'static self) -> Result<(), DescriptorError> {
        self.verify_with(&mut Visited::new())
    }

    fn verify_with(&'static self, visited: &mut Visited) -> Result<(), DescriptorError> {
        if !first_visit(visited, self) {
            return Ok(());
        }

        if let Some(exception) = self.exception {
            exception.verify_with(visited)?;
        }

        for method in &self.methods {
            for arg in method.args() {
                verify_data_type(arg.ty(), visited)?;
            }

            match method.result() {
                MethodResult::Data(ty) => verify_data_type(ty, visited)?,
                MethodResult::Interface(next) => next.verify_with(visited)?,
            }
        }

        Ok(())
    }
}

impl PartialEq for InterfaceDescriptor {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self, other)
    }
}

impl fmt::Debug for InterfaceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InterfaceDescriptor").field(&self.name).finish()
    }
}

pub struct InterfaceDescriptorBuilder {
    name: String,
    base: Option<&'static InterfaceDescriptor>,
    methods: Vec<&'static MethodDescriptor>,
    exception: Option<&'static MessageDescriptor>,
}

impl InterfaceDescriptorBuilder {
    pub fn base(mut self, base: &'static InterfaceDescriptor) -> Self {
        self.base = Some(base);
        self
    }

    pub fn exception(mut self, exception: &'static MessageDescriptor) -> Self {
        self.exception = Some(exception);
        self
    }

    pub fn method(mut self, method: &'static MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    pub fn build(self) -> Result<InterfaceDescriptor, DescriptorError> {
        let name = self.name;
        let mut methods: Vec<&'static MethodDescriptor> = self
            .base
            .map(|base| base.methods.clone())
            .unwrap_or_default();
        methods.extend(self.methods);

        let mut index = HashMap::with_capacity(methods.len());
        for (i, method) in methods.iter().enumerate() {
            if index.insert(method.name().to_owned(), i).is_some() {
                return Err(DescriptorError::DuplicateMethod {
                    interface: name,
                    method: method.name().to_owned(),
                });
            }
        }

        let exception = self
            .exception
            .or_else(|| self.base.and_then(InterfaceDescriptor::exception));

        Ok(InterfaceDescriptor {
            name,
            base: self.base,
            methods,
            index,
            exception,
        })
    }
}
