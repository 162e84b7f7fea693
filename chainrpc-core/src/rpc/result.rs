use crate::descriptors::{DataType, MessageDescriptor};
use crate::format::{FormatError, JsonFormat};
use crate::value::{Message, Value};
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{Response, StatusCode};

/// Status of a response carrying the interface's declared exception.
pub const APPLICATION_EXCEPTION_STATUS: StatusCode = StatusCode::UNPROCESSABLE_ENTITY;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// The outcome of a handled request.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcResult {
    Ok {
        value: Option<Value>,
        data_type: DataType,
    },
    /// The service raised the interface's declared exception, or one of its subtypes.
    Exception {
        exception: Box<dyn Message>,
        descriptor: &'static MessageDescriptor,
    },
}

impl RpcResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, RpcResult::Ok { .. })
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RpcResult::Ok { .. } => StatusCode::OK,
            RpcResult::Exception { .. } => APPLICATION_EXCEPTION_STATUS,
        }
    }

    /// The response body: the JSON result, or the JSON exception.
    pub fn to_json(&self, format: &JsonFormat) -> Result<String, FormatError> {
        match self {
            RpcResult::Ok { value, data_type } => format.to_json(value.as_ref(), data_type),
            RpcResult::Exception {
                exception,
                descriptor,
            } => format.to_json(
                Some(&Value::Message(exception.clone())),
                &DataType::Message(*descriptor),
            ),
        }
    }

    pub fn to_response(&self, format: &JsonFormat) -> Result<Response<String>, FormatError> {
        let mut response = Response::new(self.to_json(format)?);
        *response.status_mut() = self.status();
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        Ok(response)
    }
}

/// A plain text response, used for protocol errors.
pub(crate) fn text_response(status: StatusCode, message: String) -> Response<String> {
    let mut response = Response::new(message);
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_CONTENT_TYPE));
    response
}
