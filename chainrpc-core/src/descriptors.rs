//! # Descriptors
//!
//! Runtime descriptions of every shape a chainrpc service exchanges.
//!
//! Descriptors are built once, usually in `static` items wrapped in [`std::sync::LazyLock`], and
//! are immutable afterwards. Descriptors compare by identity: two descriptors are equal only if
//! they are the same object.
//!
//! ## Lazy references
//!
//! Field types, method results and subtype registrations may point at descriptors that are not
//! built yet (a message holding a field of its own type, an interface method returning the
//! interface itself). Those references are given as providers and resolved on first access.
//! [`InterfaceDescriptor::verify`] and [`MessageDescriptor::verify`] force every provider in a
//! descriptor graph so misconfiguration surfaces at startup instead of mid-request.
mod enumeration;
mod interface;
mod message;

pub use enumeration::EnumDescriptor;
pub use interface::{
    ArgRouting, ArgumentDescriptor, InterfaceDescriptor, InterfaceDescriptorBuilder,
    MethodDescriptor, MethodDescriptorBuilder, MethodResult,
};
pub use message::{FieldAccessor, FieldDescriptor, MessageDescriptor, MessageDescriptorBuilder};

use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    #[error("Message '{0}' has no instance factory")]
    MissingFactory(String),
    #[error("Duplicate field '{field}' in message '{message}'")]
    DuplicateField { message: String, field: String },
    #[error("Message '{0}' declares more than one discriminator field")]
    MultipleDiscriminators(String),
    #[error("Discriminator field '{field}' of message '{message}' is not an enum")]
    DiscriminatorNotEnum { message: String, field: String },
    #[error("Message '{0}' has a discriminator value but no discriminator field")]
    DiscriminatorValueWithoutField(String),
    #[error("Discriminator value '{value}' of message '{message}' is not a value of enum '{expected}'")]
    DiscriminatorValueMismatch {
        message: String,
        value: String,
        expected: String,
    },
    #[error("Message '{subtype}' is registered as a subtype of '{message}' but does not extend it")]
    NotASubtype { message: String, subtype: String },
    #[error("Subtype '{0}' has no discriminator value")]
    MissingDiscriminatorValue(String),
    #[error("Discriminator value '{value}' is used by both '{first}' and '{second}'")]
    DuplicateDiscriminatorValue {
        value: String,
        first: String,
        second: String,
    },
    #[error("Method '{0}' has no result type")]
    MissingResult(String),
    #[error("Method '{0}' has no dispatcher")]
    MissingDispatcher(String),
    #[error("Duplicate argument '{argument}' in method '{method}'")]
    DuplicateArgument { method: String, argument: String },
    #[error("Argument '{argument}' of method '{method}' is sent in the body, but the method is not POST")]
    BodyArgumentWithoutPost { method: String, argument: String },
    #[error("Duplicate method '{method}' in interface '{interface}'")]
    DuplicateMethod { interface: String, method: String },
    #[error("Duplicate value '{value}' in enum '{name}'")]
    DuplicateEnumValue { name: String, value: String },
}

/// The kind of a described type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Bool,
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    String,
    Datetime,
    List,
    Set,
    Map,
    Void,
    Enum,
    Message,
    Interface,
}

impl TypeTag {
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            TypeTag::Bool
                | TypeTag::Int16
                | TypeTag::Int32
                | TypeTag::Int64
                | TypeTag::Float
                | TypeTag::Double
                | TypeTag::String
                | TypeTag::Datetime
        )
    }

    pub fn is_data_type(self) -> bool {
        self != TypeTag::Interface
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeTag::Bool => "bool",
            TypeTag::Int16 => "int16",
            TypeTag::Int32 => "int32",
            TypeTag::Int64 => "int64",
            TypeTag::Float => "float",
            TypeTag::Double => "double",
            TypeTag::String => "string",
            TypeTag::Datetime => "datetime",
            TypeTag::List => "list",
            TypeTag::Set => "set",
            TypeTag::Map => "map",
            TypeTag::Void => "void",
            TypeTag::Enum => "enum",
            TypeTag::Message => "message",
            TypeTag::Interface => "interface",
        };
        f.write_str(name)
    }
}

/// The descriptor of a data type: anything that can be a field, an argument or a terminal result.
#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    Bool,
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    String,
    Datetime,
    Void,
    List(Box<DataType>),
    Set(Box<DataType>),
    Map(Box<DataType>, Box<DataType>),
    Enum(&'static EnumDescriptor),
    Message(&'static MessageDescriptor),
}

impl DataType {
    pub fn list(element: DataType) -> Self {
        DataType::List(Box::new(element))
    }

    pub fn set(element: DataType) -> Self {
        DataType::Set(Box::new(element))
    }

    pub fn map(key: DataType, value: DataType) -> Self {
        DataType::Map(Box::new(key), Box::new(value))
    }

    pub fn tag(&self) -> TypeTag {
        match self {
            DataType::Bool => TypeTag::Bool,
            DataType::Int16 => TypeTag::Int16,
            DataType::Int32 => TypeTag::Int32,
            DataType::Int64 => TypeTag::Int64,
            DataType::Float => TypeTag::Float,
            DataType::Double => TypeTag::Double,
            DataType::String => TypeTag::String,
            DataType::Datetime => TypeTag::Datetime,
            DataType::Void => TypeTag::Void,
            DataType::List(_) => TypeTag::List,
            DataType::Set(_) => TypeTag::Set,
            DataType::Map(_, _) => TypeTag::Map,
            DataType::Enum(_) => TypeTag::Enum,
            DataType::Message(_) => TypeTag::Message,
        }
    }

    pub fn is_primitive(&self) -> bool {
        self.tag().is_primitive()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::List(element) => write!(f, "list<{element}>"),
            DataType::Set(element) => write!(f, "set<{element}>"),
            DataType::Map(key, value) => write!(f, "map<{key}, {value}>"),
            DataType::Enum(descriptor) => f.write_str(descriptor.name()),
            DataType::Message(descriptor) => f.write_str(descriptor.name()),
            other => write!(f, "{}", other.tag()),
        }
    }
}

/// A value given up front or produced by a provider on first access.
pub(crate) enum LazyRef<T> {
    Ready(T),
    Deferred(Box<dyn Fn() -> T + Send + Sync>, OnceLock<T>),
}

impl<T> LazyRef<T> {
    pub(crate) fn deferred(provider: impl Fn() -> T + Send + Sync + 'static) -> Self {
        LazyRef::Deferred(Box::new(provider), OnceLock::new())
    }

    pub(crate) fn get(&self) -> &T {
        match self {
            LazyRef::Ready(value) => value,
            LazyRef::Deferred(provider, cell) => cell.get_or_init(provider),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for LazyRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LazyRef::Ready(value) => value.fmt(f),
            LazyRef::Deferred(_, cell) => match cell.get() {
                Some(value) => value.fmt(f),
                None => f.write_str("<unresolved>"),
            },
        }
    }
}

/// Descriptors already visited while verifying a graph.
pub(crate) type Visited = HashSet<*const ()>;

pub(crate) fn first_visit<T>(visited: &mut Visited, descriptor: &T) -> bool {
    visited.insert((descriptor as *const T).cast::<()>())
}

pub(crate) fn verify_data_type(ty: &DataType, visited: &mut Visited) -> Result<(), DescriptorError> {
    match ty {
        DataType::List(element) | DataType::Set(element) => verify_data_type(element, visited),
        DataType::Map(key, value) => {
            verify_data_type(key, visited)?;
            verify_data_type(value, visited)
        }
        DataType::Message(descriptor) => descriptor.verify_with(visited),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_fixtures::{BASE, TEST_ENUM, TEST_MESSAGE};

    #[test]
    fn test_data_type_display() {
        let ty = DataType::map(DataType::Int32, DataType::list(DataType::Message(&TEST_MESSAGE)));
        assert_eq!(ty.to_string(), "map<int32, list<TestMessage>>");
        assert_eq!(DataType::Enum(&TEST_ENUM).to_string(), "TestEnum");
        assert_eq!(DataType::Datetime.to_string(), "datetime");
    }

    #[test]
    fn test_primitive_classification() {
        assert!(DataType::Datetime.is_primitive());
        assert!(DataType::String.is_primitive());
        assert!(!DataType::Void.is_primitive());
        assert!(!DataType::Enum(&TEST_ENUM).is_primitive());
        assert!(!TypeTag::Interface.is_data_type());
        assert!(TypeTag::Message.is_data_type());
    }

    #[test]
    fn test_descriptors_compare_by_identity() {
        assert_eq!(DataType::Message(&BASE), DataType::Message(&BASE));
        assert_ne!(DataType::Message(&BASE), DataType::Message(&TEST_MESSAGE));
    }

    #[test]
    fn test_lazy_ref_resolves_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static CALLS: AtomicUsize = AtomicUsize::new(0);

        let lazy = LazyRef::deferred(|| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            DataType::Int32
        });

        assert_eq!(lazy.get(), &DataType::Int32);
        assert_eq!(lazy.get(), &DataType::Int32);
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }
}
