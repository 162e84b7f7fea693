//! # Values
//!
//! The dynamic value model shared by formats, invocations and the protocol.
//!
//! A [`Value`] is always present; absence ("null") is expressed with `Option<Value>` at field,
//! argument and result boundaries. Generated types convert into values with `From` and back
//! with [`FromValue`].
//!
//! ## Messages
//!
//! Generated message structs implement [`Message`] (usually through [`crate::impl_message!`]).
//! A subtype embeds its base message in a field and exposes it through [`Message::base`], so
//! accessors registered on the base descriptor keep working on subtype instances
//! (see [`downcast_ref`] and [`downcast_mut`]).
use crate::descriptors::{EnumDescriptor, MessageDescriptor, TypeTag};
use chrono::{DateTime, Utc};
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt::{self, Debug};
use std::hash::{Hash, Hasher};
use std::ptr;

/// The contract every generated message type fulfils.
pub trait Message: Any + Debug + Send + Sync {
    /// The runtime descriptor of this instance, which may be a subtype of the declared one.
    fn descriptor(&self) -> &'static MessageDescriptor;

    fn clone_message(&self) -> Box<dyn Message>;

    /// Exact equality: instances of different concrete types are never equal.
    fn eq_message(&self, other: &dyn Message) -> bool;

    /// The embedded base message, if this type extends another message.
    fn base(&self) -> Option<&dyn Message> {
        None
    }

    fn base_mut(&mut self) -> Option<&mut dyn Message> {
        None
    }
}

impl Clone for Box<dyn Message> {
    fn clone(&self) -> Self {
        self.clone_message()
    }
}

impl PartialEq for dyn Message {
    fn eq(&self, other: &Self) -> bool {
        self.eq_message(other)
    }
}

/// Finds `M` in `message` or in its chain of embedded base messages.
pub fn downcast_ref<M: Message>(message: &dyn Message) -> Option<&M> {
    let any: &dyn Any = message;
    match any.downcast_ref::<M>() {
        Some(found) => Some(found),
        None => message.base().and_then(downcast_ref::<M>),
    }
}

/// Mutable counterpart of [`downcast_ref`].
pub fn downcast_mut<M: Message>(message: &mut dyn Message) -> Option<&mut M> {
    let matches = {
        let any: &dyn Any = &*message;
        any.is::<M>()
    };

    if matches {
        let any: &mut dyn Any = message;
        return any.downcast_mut::<M>();
    }

    message.base_mut().and_then(downcast_mut::<M>)
}

/// Takes ownership of a boxed message if it is exactly an `M`.
pub fn downcast<M: Message>(message: Box<dyn Message>) -> Option<M> {
    let any: Box<dyn Any> = message;
    any.downcast::<M>().ok().map(|message| *message)
}

/// Used by [`crate::impl_message!`].
pub fn message_from_value<M: Message>(value: Value) -> Result<M, ValueError> {
    match value {
        Value::Message(message) => {
            let actual = message.descriptor().name().to_owned();
            downcast::<M>(message).ok_or_else(|| ValueError::MessageMismatch {
                expected: std::any::type_name::<M>().to_owned(),
                actual,
            })
        }
        other => Err(ValueError::Mismatch {
            expected: TypeTag::Message,
            actual: other.tag(),
        }),
    }
}

/// The contract every generated enum fulfils.
pub trait EnumType: Copy + Sized + 'static {
    fn descriptor() -> &'static EnumDescriptor;

    fn ordinal(self) -> usize;

    fn from_ordinal(ordinal: usize) -> Option<Self>;
}

/// Used by [`crate::impl_enum!`].
pub fn enum_from_value<E: EnumType>(value: Value) -> Result<E, ValueError> {
    match value {
        Value::Enum(value) => value.to::<E>().ok_or_else(|| ValueError::EnumMismatch {
            expected: E::descriptor().name().to_owned(),
            actual: value.descriptor().name().to_owned(),
        }),
        other => Err(ValueError::Mismatch {
            expected: TypeTag::Enum,
            actual: other.tag(),
        }),
    }
}

/// One value of an enum, bound to its descriptor.
#[derive(Clone, Copy)]
pub struct EnumValue {
    descriptor: &'static EnumDescriptor,
    ordinal: usize,
}

impl EnumValue {
    /// Returns `None` if `ordinal` is not a value of `descriptor`.
    pub fn new(descriptor: &'static EnumDescriptor, ordinal: usize) -> Option<Self> {
        (ordinal < descriptor.values().len()).then_some(Self {
            descriptor,
            ordinal,
        })
    }

    pub fn of<E: EnumType>(value: E) -> Self {
        Self {
            descriptor: E::descriptor(),
            ordinal: value.ordinal(),
        }
    }

    pub fn descriptor(&self) -> &'static EnumDescriptor {
        self.descriptor
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// The declared token, e.g. `MALE`.
    pub fn name(&self) -> &'static str {
        self.descriptor.values()[self.ordinal].as_str()
    }

    /// Converts back into the generated enum, if the descriptors match.
    pub fn to<E: EnumType>(&self) -> Option<E> {
        if ptr::eq(self.descriptor, E::descriptor()) {
            E::from_ordinal(self.ordinal)
        } else {
            None
        }
    }
}

impl PartialEq for EnumValue {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.descriptor, other.descriptor) && self.ordinal == other.ordinal
    }
}

impl Eq for EnumValue {}

impl Hash for EnumValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        ptr::hash(self.descriptor, state);
        self.ordinal.hash(state);
    }
}

impl Debug for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.descriptor.name(), self.name())
    }
}

/// A dynamically typed value described by a [`crate::descriptors::DataType`].
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float(f32),
    Double(f64),
    String(String),
    Datetime(DateTime<Utc>),
    List(Vec<Value>),
    /// Element order carries no meaning.
    Set(Vec<Value>),
    /// Entry order carries no meaning.
    Map(Vec<(Value, Value)>),
    Enum(EnumValue),
    Message(Box<dyn Message>),
    Void,
}

impl Value {
    pub fn tag(&self) -> TypeTag {
        match self {
            Value::Bool(_) => TypeTag::Bool,
            Value::Int16(_) => TypeTag::Int16,
            Value::Int32(_) => TypeTag::Int32,
            Value::Int64(_) => TypeTag::Int64,
            Value::Float(_) => TypeTag::Float,
            Value::Double(_) => TypeTag::Double,
            Value::String(_) => TypeTag::String,
            Value::Datetime(_) => TypeTag::Datetime,
            Value::List(_) => TypeTag::List,
            Value::Set(_) => TypeTag::Set,
            Value::Map(_) => TypeTag::Map,
            Value::Enum(_) => TypeTag::Enum,
            Value::Message(_) => TypeTag::Message,
            Value::Void => TypeTag::Void,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&dyn Message> {
        match self {
            Value::Message(message) => Some(message.as_ref()),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int16(a), Value::Int16(b)) => a == b,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Datetime(a), Value::Datetime(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => {
                a.len() == b.len()
                    && a.iter().all(|item| b.contains(item))
                    && b.iter().all(|item| a.contains(item))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len() && a.iter().all(|entry| b.contains(entry))
            }
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Message(a), Value::Message(b)) => a == b,
            (Value::Void, Value::Void) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    #[error("Expected a {expected} value, got {actual}")]
    Mismatch { expected: TypeTag, actual: TypeTag },
    #[error("Expected message '{expected}', got '{actual}'")]
    MessageMismatch { expected: String, actual: String },
    #[error("Expected a value of enum '{expected}', got one of '{actual}'")]
    EnumMismatch { expected: String, actual: String },
}

/// Extracts a typed Rust value out of a [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, ValueError>;
}

/// Converts an optional value, as returned by terminal calls.
pub fn from_optional<T: FromValue>(value: Option<Value>) -> Result<Option<T>, ValueError> {
    value.map(T::from_value).transpose()
}

macro_rules! primitive_value {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Value::$variant(value)
            }
        }

        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self, ValueError> {
                match value {
                    Value::$variant(value) => Ok(value),
                    other => Err(ValueError::Mismatch {
                        expected: TypeTag::$variant,
                        actual: other.tag(),
                    }),
                }
            }
        }
    };
}

primitive_value!(bool, Bool);
primitive_value!(i16, Int16);
primitive_value!(i32, Int32);
primitive_value!(i64, Int64);
primitive_value!(f32, Float);
primitive_value!(f64, Double);
primitive_value!(String, String);
primitive_value!(DateTime<Utc>, Datetime);
primitive_value!(EnumValue, Enum);
primitive_value!(Box<dyn Message>, Message);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Void
    }
}

impl FromValue for () {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Void => Ok(()),
            other => Err(ValueError::Mismatch {
                expected: TypeTag::Void,
                actual: other.tag(),
            }),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        Ok(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<HashSet<T>> for Value {
    fn from(items: HashSet<T>) -> Self {
        Value::Set(items.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<Value>, V: Into<Value>> From<HashMap<K, V>> for Value {
    fn from(entries: HashMap<K, V>) -> Self {
        Value::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

fn container_items(value: Value, expected: TypeTag) -> Result<Vec<Value>, ValueError> {
    match value {
        Value::List(items) | Value::Set(items) => Ok(items),
        other => Err(ValueError::Mismatch {
            expected,
            actual: other.tag(),
        }),
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        container_items(value, TypeTag::List)?
            .into_iter()
            .map(T::from_value)
            .collect()
    }
}

impl<T: FromValue + Eq + Hash> FromValue for HashSet<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        container_items(value, TypeTag::Set)?
            .into_iter()
            .map(T::from_value)
            .collect()
    }
}

impl<K: FromValue + Eq + Hash, V: FromValue> FromValue for HashMap<K, V> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(key, value)| Ok((K::from_value(key)?, V::from_value(value)?)))
                .collect(),
            other => Err(ValueError::Mismatch {
                expected: TypeTag::Map,
                actual: other.tag(),
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_fixtures::{Base, MultiLevelSubtype, PolymorphicType, Subtype, TestEnum};

    #[test]
    fn test_sets_and_maps_compare_without_order() {
        let a = Value::Set(vec![Value::from(1), Value::from(2)]);
        let b = Value::Set(vec![Value::from(2), Value::from(1)]);
        assert_eq!(a, b);

        let a = Value::Map(vec![("a".into(), 1.into()), ("b".into(), 2.into())]);
        let b = Value::Map(vec![("b".into(), 2.into()), ("a".into(), 1.into())]);
        assert_eq!(a, b);

        let c = Value::Map(vec![("b".into(), 3.into()), ("a".into(), 1.into())]);
        assert_ne!(a, c);
    }

    #[test]
    fn test_list_order_matters() {
        let a = Value::from(vec![1, 2]);
        let b = Value::from(vec![2, 1]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_typed_extraction() {
        let value = Value::from(vec!["a", "b"]);
        let strings = Vec::<String>::from_value(value).expect("list of strings");
        assert_eq!(strings, vec!["a".to_string(), "b".to_string()]);

        let error = i32::from_value(Value::from("1")).unwrap_err();
        assert_eq!(
            error,
            ValueError::Mismatch {
                expected: TypeTag::Int32,
                actual: TypeTag::String
            }
        );
    }

    #[test]
    fn test_enum_values_round_trip_through_generated_enum() {
        let value = Value::from(TestEnum::Two);

        match &value {
            Value::Enum(enum_value) => {
                assert_eq!(enum_value.name(), "TWO");
                assert_eq!(enum_value.ordinal(), 1);
            }
            other => panic!("Expected an enum value, got {other:?}"),
        }

        assert_eq!(TestEnum::from_value(value).unwrap(), TestEnum::Two);
        assert!(PolymorphicType::from_value(Value::from(TestEnum::One)).is_err());
    }

    #[test]
    fn test_downcast_walks_embedded_bases() {
        let mut message = MultiLevelSubtype::default();
        message.base.subfield = Some("sub".to_string());

        let base = downcast_ref::<Base>(&message).expect("base is reachable");
        assert_eq!(base.type_, Some(PolymorphicType::MultilevelSubtype));

        let subtype = downcast_mut::<Subtype>(&mut message).expect("subtype is reachable");
        subtype.base.field = Some("field".to_string());

        assert_eq!(message.base.base.field.as_deref(), Some("field"));
    }

    #[test]
    fn test_message_equality_is_exact() {
        let subtype = Subtype::default();
        let multi = MultiLevelSubtype::default();

        let a: Box<dyn Message> = Box::new(subtype.clone());
        let b: Box<dyn Message> = Box::new(subtype);
        let c: Box<dyn Message> = Box::new(multi);

        assert!(*a == *b);
        assert!(*a != *c);
    }

    #[test]
    fn test_message_extraction_rejects_other_types() {
        let value = Value::from(Subtype::default());
        let error = Base::from_value(value).unwrap_err();

        match error {
            ValueError::MessageMismatch { actual, .. } => assert_eq!(actual, "Subtype"),
            other => panic!("Expected a message mismatch, got {other:?}"),
        }
    }
}
