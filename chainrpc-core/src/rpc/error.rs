use crate::BoxError;
use crate::format::FormatError;
use http::StatusCode;

/// A request that does not map onto the interface, raised by the protocol codec.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Method is not found: {0}")]
    MethodNotFound(String),
    #[error("Method not allowed, POST required")]
    MethodNotAllowed(String),
    #[error("Wrong number of method args")]
    WrongArgumentCount(String),
    #[error("Failed to parse an invocation chain")]
    UnexpectedSegments(Vec<String>),
    #[error("Methods required")]
    NoInvocation,
    #[error("The last method must be a terminal one. It must return a data type or be void.")]
    NotTerminal(String),
    #[error("Invalid percent-encoded text '{0}'")]
    InvalidEncoding(String),
    #[error("Invalid argument '{argument}' of method '{method}': {source}")]
    InvalidArgument {
        method: String,
        argument: String,
        #[source]
        source: FormatError,
    },
    #[error("Path argument '{argument}' of method '{method}' is required")]
    MissingPathArgument { method: String, argument: String },
    #[error("Path argument '{argument}' of method '{method}' cannot be empty")]
    EmptyPathArgument { method: String, argument: String },
    #[error("Only a terminal method can be sent, '{0}' returns an interface")]
    NotSendable(String),
}

impl ProtocolError {
    /// The HTTP status a server answers this error with.
    pub fn status(&self) -> StatusCode {
        match self {
            ProtocolError::MethodNotFound(_)
            | ProtocolError::WrongArgumentCount(_)
            | ProtocolError::UnexpectedSegments(_)
            | ProtocolError::NoInvocation
            | ProtocolError::NotTerminal(_) => StatusCode::NOT_FOUND,
            ProtocolError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ProtocolError::InvalidEncoding(_)
            | ProtocolError::InvalidArgument { .. }
            | ProtocolError::MissingPathArgument { .. }
            | ProtocolError::EmptyPathArgument { .. }
            | ProtocolError::NotSendable(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// A failed exchange as seen by the client.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Any status other than a success or an application exception.
    #[error("Server responded with {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("The server returned no data")]
    NoData,
    #[error("Unsupported application exception")]
    UnsupportedException,
    #[error("Malformed response: {0}")]
    Malformed(#[source] FormatError),
    #[error("Invalid HTTP request: {0}")]
    Request(#[from] http::Error),
    #[error("Transport failure: {0}")]
    Io(#[source] BoxError),
}

impl TransportError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
