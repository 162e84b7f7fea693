use super::ProtocolError;
use super::request::{RpcRequest, decode_component, encode_component};
use crate::descriptors::{
    ArgRouting, ArgumentDescriptor, DataType, InterfaceDescriptor, MethodDescriptor, MethodResult,
};
use crate::format::{FormatError, JsonFormat};
use crate::invocation::Invocation;
use crate::value::Value;
use std::collections::VecDeque;

/// Encodes invocation chains into requests and decodes them back.
///
/// Every link of a chain adds `/` and its method name to the path, followed by its path
/// arguments. Query and body arguments go to their maps and are left out when absent.
/// Arguments are compact JSON; strings, enums and datetimes lose their outer quotes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RpcProtocol {
    format: JsonFormat,
}

impl RpcProtocol {
    pub fn new(format: JsonFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> &JsonFormat {
        &self.format
    }

    /// Builds the request for a chain ending in a terminal method.
    pub fn encode(&self, invocation: &Invocation) -> Result<RpcRequest, ProtocolError> {
        let method = invocation.method();
        if !method.is_terminal() {
            return Err(ProtocolError::NotSendable(method.name().to_owned()));
        }

        let mut request = if method.is_post() {
            RpcRequest::post("")
        } else {
            RpcRequest::get("")
        };

        for link in invocation.to_chain() {
            self.write_invocation(&mut request, link)?;
        }

        tracing::debug!(verb = %request.verb, path = %request.path, "Encoded invocation");
        Ok(request)
    }

    /// Walks the path left to right, resolving each segment on the interface the previous
    /// method returned.
    pub fn decode(
        &self,
        request: &RpcRequest,
        descriptor: &'static InterfaceDescriptor,
    ) -> Result<Invocation, ProtocolError> {
        let mut segments: VecDeque<&str> = request
            .path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();

        let mut interface = descriptor;
        let mut invocation: Option<Invocation> = None;

        while let Some(segment) = segments.pop_front() {
            let name = decode_component(segment)?;
            let method = interface
                .method(&name)
                .ok_or_else(|| ProtocolError::MethodNotFound(name.clone()))?;

            if method.is_post() && !request.is_post() {
                return Err(ProtocolError::MethodNotAllowed(name));
            }

            let args = self.read_args(method, &mut segments, request)?;
            invocation = Some(Invocation::chained(method, args, invocation.take()));

            match method.result() {
                MethodResult::Interface(next) => interface = *next,
                MethodResult::Data(_) => break,
            }
        }

        if !segments.is_empty() {
            return Err(ProtocolError::UnexpectedSegments(
                segments.into_iter().map(str::to_owned).collect(),
            ));
        }

        let invocation = invocation.ok_or(ProtocolError::NoInvocation)?;
        if !invocation.method().is_terminal() {
            return Err(ProtocolError::NotTerminal(invocation.method().name().to_owned()));
        }

        tracing::debug!(
            path = %request.path,
            method = invocation.method().name(),
            "Decoded invocation"
        );
        Ok(invocation)
    }

    fn write_invocation(
        &self,
        request: &mut RpcRequest,
        invocation: &Invocation,
    ) -> Result<(), ProtocolError> {
        let method = invocation.method();
        request.path.push('/');
        request.path.push_str(method.name());

        for (arg, value) in method.args().iter().zip(invocation.args()) {
            let text = value
                .as_ref()
                .map(|value| self.write_argument(method, arg, value))
                .transpose()?;

            match (arg.routing(), text) {
                (ArgRouting::Body, Some(text)) => {
                    request.post.insert(arg.name().to_owned(), text);
                }
                (ArgRouting::Query, Some(text)) => {
                    request.query.insert(arg.name().to_owned(), text);
                }
                (ArgRouting::Path, Some(text)) if text.is_empty() => {
                    return Err(ProtocolError::EmptyPathArgument {
                        method: method.name().to_owned(),
                        argument: arg.name().to_owned(),
                    });
                }
                (ArgRouting::Path, Some(text)) => {
                    request.path.push('/');
                    request.path.push_str(&encode_component(&text));
                }
                (ArgRouting::Path, None) => {
                    return Err(ProtocolError::MissingPathArgument {
                        method: method.name().to_owned(),
                        argument: arg.name().to_owned(),
                    });
                }
                (ArgRouting::Body | ArgRouting::Query, None) => {}
            }
        }

        Ok(())
    }

    fn read_args(
        &self,
        method: &MethodDescriptor,
        segments: &mut VecDeque<&str>,
        request: &RpcRequest,
    ) -> Result<Vec<Option<Value>>, ProtocolError> {
        let mut args = Vec::with_capacity(method.args().len());

        for arg in method.args() {
            let raw = match arg.routing() {
                ArgRouting::Body => request.post.get(arg.name()).cloned(),
                ArgRouting::Query => request.query.get(arg.name()).cloned(),
                ArgRouting::Path => {
                    let segment = segments
                        .pop_front()
                        .ok_or_else(|| ProtocolError::WrongArgumentCount(method.name().to_owned()))?;
                    Some(decode_component(segment)?)
                }
            };

            let value = match raw {
                Some(raw) => self.read_argument(method, arg, &raw)?,
                None => None,
            };
            args.push(value);
        }

        Ok(args)
    }

    fn write_argument(
        &self,
        method: &MethodDescriptor,
        arg: &ArgumentDescriptor,
        value: &Value,
    ) -> Result<String, ProtocolError> {
        let write = || -> Result<String, FormatError> {
            let tree = self.format.object().to_object(Some(value), arg.ty())?;
            Ok(serde_json::to_string(&tree)?)
        };

        let text = write().map_err(invalid_argument(method, arg))?;
        if is_quoted(arg.ty())
            && let Some(unquoted) = text.strip_prefix('"').and_then(|t| t.strip_suffix('"'))
        {
            return Ok(unquoted.to_owned());
        }

        Ok(text)
    }

    fn read_argument(
        &self,
        method: &MethodDescriptor,
        arg: &ArgumentDescriptor,
        raw: &str,
    ) -> Result<Option<Value>, ProtocolError> {
        let text = if is_quoted(arg.ty()) {
            format!("\"{raw}\"")
        } else {
            raw.to_owned()
        };

        self.format
            .from_json(&text, arg.ty())
            .map_err(invalid_argument(method, arg))
    }
}

/// Types written as JSON strings, sent without their quotes.
fn is_quoted(ty: &DataType) -> bool {
    matches!(ty, DataType::String | DataType::Enum(_) | DataType::Datetime)
}

fn invalid_argument<'a>(
    method: &'a MethodDescriptor,
    arg: &'a ArgumentDescriptor,
) -> impl FnOnce(FormatError) -> ProtocolError + 'a {
    move |source| ProtocolError::InvalidArgument {
        method: method.name().to_owned(),
        argument: arg.name().to_owned(),
        source,
    }
}
