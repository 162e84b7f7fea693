//! # RPC
//!
//! Maps invocation chains onto HTTP-shaped requests and back.
//!
//! * [`RpcProtocol`] encodes an [`Invocation`](crate::Invocation) chain into an [`RpcRequest`]
//!   and decodes it again against an interface descriptor.
//! * [`RpcClient`] is the [`Invoker`](crate::Invoker) behind client proxies: it encodes every
//!   terminal call and hands the request to an [`RpcSession`].
//! * [`RpcHandler`] decodes incoming requests, replays them on a service and classifies the
//!   outcome as an [`RpcResult`].
//! * [`HttpSession`] is the HTTP binding of [`RpcSession`] over a pluggable, blocking
//!   [`HttpTransport`].
//!
//! ## Wire mapping
//!
//! `world.humans().find(1)` is `GET /humans/find/1`. Query arguments travel in the query string,
//! body arguments as form fields of a POST. A success is status 200 with the JSON result, the
//! interface's declared exception is status 422 with the JSON exception.
mod client;
mod error;
mod handler;
mod protocol;
mod request;
mod result;
mod session;

pub use client::RpcClient;
pub use error::{ProtocolError, TransportError};
pub use handler::RpcHandler;
pub use protocol::RpcProtocol;
pub use request::RpcRequest;
pub use result::{APPLICATION_EXCEPTION_STATUS, JSON_CONTENT_TYPE, RpcResult, TEXT_CONTENT_TYPE};
pub use session::{DEFAULT_MAX_ERROR_LEN, FORM_CONTENT_TYPE, HttpSession, HttpTransport, RpcSession};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};

/// Everything but RFC 3986 unreserved characters is escaped.
pub(crate) const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');
