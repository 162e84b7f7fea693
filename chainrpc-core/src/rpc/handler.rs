use super::protocol::RpcProtocol;
use super::request::RpcRequest;
use super::result::{RpcResult, text_response};
use crate::descriptors::{DataType, DescriptorError, InterfaceDescriptor};
use crate::invocation::InvokeError;
use http::Response;
use std::any::Any;
use std::sync::Arc;

type Provider<S> = Arc<dyn Fn() -> S + Send + Sync>;

/// Serves an interface: decodes requests and replays them on a service.
///
/// `S` is the receiver the root interface's dispatchers expect, usually an `Arc<dyn Service>`.
/// The provider is asked for a service once per request.
pub struct RpcHandler<S> {
    descriptor: &'static InterfaceDescriptor,
    provider: Provider<S>,
    protocol: RpcProtocol,
}

impl<S: Any> RpcHandler<S> {
    /// Serves one shared service instance.
    pub fn new(descriptor: &'static InterfaceDescriptor, service: S) -> Result<Self, DescriptorError>
    where
        S: Clone + Send + Sync,
    {
        Self::with_provider(descriptor, move || service.clone())
    }

    pub fn with_provider(
        descriptor: &'static InterfaceDescriptor,
        provider: impl Fn() -> S + Send + Sync + 'static,
    ) -> Result<Self, DescriptorError> {
        descriptor.verify()?;

        Ok(Self {
            descriptor,
            provider: Arc::new(provider),
            protocol: RpcProtocol::default(),
        })
    }

    pub fn with_protocol(mut self, protocol: RpcProtocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn descriptor(&self) -> &'static InterfaceDescriptor {
        self.descriptor
    }

    /// Decodes and executes a request.
    ///
    /// The interface's declared exception, or any subtype of it, becomes an
    /// [`RpcResult::Exception`]. Every other error is returned as is.
    pub fn handle(&self, request: &RpcRequest) -> Result<RpcResult, InvokeError> {
        let invocation = self.protocol.decode(request, self.descriptor)?;
        let method = invocation.method();
        let data_type = method
            .result()
            .data_type()
            .cloned()
            .unwrap_or(DataType::Void);

        let service = (self.provider)();

        match (invocation.invoke(&service), self.descriptor.exception()) {
            (Ok(value), _) => Ok(RpcResult::Ok { value, data_type }),
            (Err(InvokeError::Application(exception)), Some(declared))
                if exception.descriptor().is_subtype_of(declared) =>
            {
                tracing::debug!(
                    method = method.name(),
                    exception = exception.descriptor().name(),
                    "Application exception"
                );
                Ok(RpcResult::Exception {
                    exception,
                    descriptor: declared,
                })
            }
            (Err(error), _) => {
                tracing::warn!(method = method.name(), %error, "Service call failed");
                Err(error)
            }
        }
    }

    /// Handles a request and renders the HTTP response.
    ///
    /// Protocol errors become plain text responses with their status. Other errors are left to
    /// the server, which should answer them as internal failures.
    pub fn respond(&self, request: &RpcRequest) -> Result<Response<String>, InvokeError> {
        match self.handle(request) {
            Ok(result) => Ok(result.to_response(self.protocol.format())?),
            Err(InvokeError::Protocol(error)) => {
                tracing::debug!(%error, path = %request.path, "Rejected request");
                Ok(text_response(error.status(), error.to_string()))
            }
            Err(error) => Err(error),
        }
    }
}
