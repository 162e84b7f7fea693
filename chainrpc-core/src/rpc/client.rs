use super::protocol::RpcProtocol;
use super::session::RpcSession;
use crate::descriptors::{DescriptorError, InterfaceDescriptor};
use crate::invocation::{Invocation, InvocationProxy, InvokeError, Invoker};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Sends the calls captured by its proxies through an [`RpcSession`].
///
/// ```rust,ignore
/// let session = HttpSession::new("http://localhost:8080", transport);
/// let client = RpcClient::new(&WORLD, session)?;
/// let world = WorldClient(client.proxy());
/// let human = world.humans()?.find(Some(1))?;
/// ```
#[derive(Clone)]
pub struct RpcClient {
    descriptor: &'static InterfaceDescriptor,
    session: Arc<dyn RpcSession>,
    protocol: RpcProtocol,
}

impl RpcClient {
    pub fn new(
        descriptor: &'static InterfaceDescriptor,
        session: impl RpcSession + 'static,
    ) -> Result<Self, DescriptorError> {
        descriptor.verify()?;

        Ok(Self {
            descriptor,
            session: Arc::new(session),
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

    /// A proxy over the root interface that invokes through this client.
    pub fn proxy(&self) -> InvocationProxy {
        InvocationProxy::new(self.descriptor, Arc::new(self.clone()))
    }
}

impl Invoker for RpcClient {
    fn invoke(&self, invocation: Invocation) -> Result<Option<Value>, InvokeError> {
        let method = invocation.method();
        let result = method
            .result()
            .data_type()
            .ok_or_else(|| InvokeError::NotTerminal(method.name().to_owned()))?;

        let request = self.protocol.encode(&invocation)?;
        tracing::debug!(method = method.name(), path = %request.path, "Invoking");

        self.session
            .send(request, result, self.descriptor.exception())
    }
}

impl fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcClient")
            .field("descriptor", &self.descriptor)
            .field("protocol", &self.protocol)
            .finish()
    }
}
