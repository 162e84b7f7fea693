use super::request::{RpcRequest, encode_form};
use super::result::APPLICATION_EXCEPTION_STATUS;
use super::TransportError;
use crate::BoxError;
use crate::descriptors::{DataType, MessageDescriptor};
use crate::format::JsonFormat;
use crate::invocation::InvokeError;
use crate::value::Value;
use http::header::CONTENT_TYPE;
use http::{Request, Response, StatusCode};

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=utf-8";

/// Longest error text kept from an unexpected response.
pub const DEFAULT_MAX_ERROR_LEN: usize = 256;

/// Delivers an encoded request and reads its outcome.
///
/// Returns the decoded result, [`InvokeError::Application`] with the reconstructed declared
/// exception, or any other error for failed exchanges.
pub trait RpcSession: Send + Sync {
    fn send(
        &self,
        request: RpcRequest,
        result: &DataType,
        exception: Option<&'static MessageDescriptor>,
    ) -> Result<Option<Value>, InvokeError>;
}

impl<F> RpcSession for F
where
    F: Fn(RpcRequest, &DataType, Option<&'static MessageDescriptor>) -> Result<Option<Value>, InvokeError>
        + Send
        + Sync,
{
    fn send(
        &self,
        request: RpcRequest,
        result: &DataType,
        exception: Option<&'static MessageDescriptor>,
    ) -> Result<Option<Value>, InvokeError> {
        self(request, result, exception)
    }
}

/// A blocking HTTP client.
pub trait HttpTransport: Send + Sync {
    fn execute(&self, request: Request<String>) -> Result<Response<String>, BoxError>;
}

impl<F> HttpTransport for F
where
    F: Fn(Request<String>) -> Result<Response<String>, BoxError> + Send + Sync,
{
    fn execute(&self, request: Request<String>) -> Result<Response<String>, BoxError> {
        self(request)
    }
}

/// An [`RpcSession`] speaking HTTP through an [`HttpTransport`].
pub struct HttpSession<T> {
    base_url: String,
    transport: T,
    format: JsonFormat,
    max_error_len: usize,
}

impl<T: HttpTransport> HttpSession<T> {
    /// `base_url` is prepended to every request path, e.g. `http://localhost:8080/world`.
    pub fn new(base_url: impl Into<String>, transport: T) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            transport,
            format: JsonFormat::default(),
            max_error_len: DEFAULT_MAX_ERROR_LEN,
        }
    }

    pub fn with_format(mut self, format: JsonFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_max_error_len(mut self, max_error_len: usize) -> Self {
        self.max_error_len = max_error_len;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn to_http_request(&self, request: &RpcRequest) -> Result<Request<String>, TransportError> {
        let mut uri = format!("{}{}", self.base_url, request.path);
        if !request.query.is_empty() {
            uri.push('?');
            uri.push_str(&encode_form(&request.query));
        }

        let builder = Request::builder().method(request.verb.clone()).uri(uri);
        let request = if request.is_post() {
            builder
                .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                .body(encode_form(&request.post))?
        } else {
            builder.body(String::new())?
        };

        Ok(request)
    }

    fn read_response(
        &self,
        response: Response<String>,
        result: &DataType,
        exception: Option<&'static MessageDescriptor>,
    ) -> Result<Option<Value>, InvokeError> {
        let status = response.status();
        let body = response.into_body();

        if status == StatusCode::OK {
            return self
                .format
                .from_json(&body, result)
                .map_err(|error| TransportError::Malformed(error).into());
        }

        if status == APPLICATION_EXCEPTION_STATUS {
            if body.trim().is_empty() {
                return Err(TransportError::NoData.into());
            }
            let exception = exception.ok_or(TransportError::UnsupportedException)?;

            return match self
                .format
                .from_json(&body, &DataType::Message(exception))
                .map_err(TransportError::Malformed)?
            {
                Some(Value::Message(exception)) => Err(InvokeError::Application(exception)),
                _ => Err(TransportError::NoData.into()),
            };
        }

        Err(TransportError::Status {
            status,
            message: self.error_message(&body),
        }
        .into())
    }

    /// Single-line, bounded error text.
    fn error_message(&self, body: &str) -> String {
        if body.is_empty() {
            return "No error description".to_owned();
        }

        let mut message: String = body.chars().take(self.max_error_len).collect();
        if message.len() < body.len() {
            message.push_str("...");
        }
        message.replace(['\n', '\r'], " ")
    }
}

impl<T: HttpTransport> RpcSession for HttpSession<T> {
    fn send(
        &self,
        request: RpcRequest,
        result: &DataType,
        exception: Option<&'static MessageDescriptor>,
    ) -> Result<Option<Value>, InvokeError> {
        let request = self.to_http_request(&request)?;
        tracing::debug!(method = %request.method(), uri = %request.uri(), "Sending request");

        let response = self.transport.execute(request).map_err(TransportError::Io)?;
        tracing::debug!(status = %response.status(), "Received response");

        self.read_response(response, result, exception)
    }
}
