//! # Formats
//!
//! Conversions between [`Value`](crate::Value)s and their wire representations.
//!
//! * [`ObjectFormat`] maps typed values to and from `serde_json::Value` trees, following a
//!   [`DataType`](crate::DataType). This is where every type rule lives: numeric strings,
//!   lowercase enums, string map keys and polymorphic messages.
//! * [`JsonFormat`] layers JSON text on top of it.
//!
//! Both are plain values. Build one, configure it and hand it to whoever needs it.
mod json;
mod object;

pub use json::JsonFormat;
pub use object::{DATETIME_FORMAT, ObjectFormat};

use crate::BoxError;
use crate::descriptors::DescriptorError;
use crate::value::ValueError;

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("Expected {expected}, got {actual}")]
    Mismatch { expected: String, actual: String },
    #[error("Failed to parse '{input}' as {expected}: {source}")]
    Parse {
        expected: String,
        input: String,
        #[source]
        source: BoxError,
    },
    #[error("Value {value} is out of range for {expected}")]
    OutOfRange { expected: String, value: String },
    #[error("Non-finite number {0} has no JSON representation")]
    NonFinite(f64),
    #[error("Unsupported map key type '{0}', keys must be primitives or enums")]
    UnsupportedMapKey(String),
    #[error("Null key in {0}")]
    NullMapKey(String),
    #[error("Null element in {0}")]
    NullElement(String),
    #[error("Invalid field '{field}': {source}")]
    Field {
        field: String,
        #[source]
        source: Box<FormatError>,
    },
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Value(#[from] ValueError),
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
}

impl FormatError {
    pub(crate) fn field(field: &str) -> impl FnOnce(FormatError) -> FormatError + '_ {
        move |source| FormatError::Field {
            field: field.to_owned(),
            source: Box::new(source),
        }
    }
}
