//! # Chainrpc Core
//!
//! `chainrpc-core` is the runtime behind chainrpc services. It describes data and interfaces
//! with runtime descriptors, converts values to and from JSON, and maps chained interface
//! calls (`world.humans().find(1)`) onto HTTP-shaped requests (`GET /humans/find/1`).
//!
//! ## Key Components
//!
//! * **[`descriptors`]:** Immutable type descriptors for messages, enums, interfaces and methods.
//!   Generated code builds them once in `static` items and registers bound accessors and
//!   dispatchers on them.
//! * **[`value`]:** The dynamic [`Value`] model moved through descriptors, plus the [`Message`]
//!   and [`EnumType`] contracts generated types implement.
//! * **[`format`]:** [`ObjectFormat`] (values to `serde_json::Value` trees) and [`JsonFormat`]
//!   (trees to JSON text), including discriminator-based polymorphic messages.
//! * **[`invocation`]:** A chain of resolved method calls, replayable against a concrete service,
//!   and the [`InvocationProxy`] that captures calls into such chains.
//! * **[`rpc`]:** The [`RpcProtocol`] codec, the [`RpcClient`], the [`RpcHandler`] and the HTTP
//!   mapping of both sides.
//!
//! ## Generated code
//!
//! Messages and enums implement their contracts through [`impl_message!`] and [`impl_enum!`].
//! Interfaces are plain traits whose client side is a small adapter over [`InvocationProxy`].
//!
//! ## Re-exports
//!
//! This crate re-exports `http` and `serde_json` so consumers build requests and inspect
//! object trees with compatible versions.
pub mod descriptors;
pub mod format;
pub mod invocation;
pub mod rpc;
pub mod value;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use descriptors::{
    ArgRouting, DataType, DescriptorError, EnumDescriptor, FieldAccessor, FieldDescriptor,
    InterfaceDescriptor, MessageDescriptor, MethodDescriptor, MethodResult, TypeTag,
};
pub use format::{FormatError, JsonFormat, ObjectFormat};
pub use invocation::{Dispatched, Invocation, InvocationProxy, InvokeError, Invoker, ProxyResult};
pub use rpc::{
    HttpSession, HttpTransport, ProtocolError, RpcClient, RpcHandler, RpcProtocol, RpcRequest,
    RpcResult, RpcSession, TransportError,
};
pub use value::{EnumType, EnumValue, FromValue, Message, Value, ValueError};

// Re-exports
pub use http;
pub use serde_json;

/// Type alias for the standard boxed error used for opaque causes.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Implements [`Message`], `From<T> for Value` and [`FromValue`] for a generated message struct.
///
/// The struct must be `Clone + PartialEq + Debug` and its descriptor a `static` item. Subtypes
/// name the field that embeds their base message:
///
/// ```rust,ignore
/// impl_message!(Human, HUMAN);
/// impl_message!(BirthEvent, BIRTH_EVENT, base = event);
/// ```
#[macro_export]
macro_rules! impl_message {
    ($ty:ty, $descriptor:path $(, base = $base:ident)?) => {
        impl $crate::value::Message for $ty {
            fn descriptor(&self) -> &'static $crate::descriptors::MessageDescriptor {
                &*$descriptor
            }

            fn clone_message(&self) -> ::std::boxed::Box<dyn $crate::value::Message> {
                ::std::boxed::Box::new(::std::clone::Clone::clone(self))
            }

            fn eq_message(&self, other: &dyn $crate::value::Message) -> bool {
                let other: &dyn ::std::any::Any = other;
                other.downcast_ref::<$ty>().is_some_and(|other| self == other)
            }

            $(
                fn base(&self) -> ::std::option::Option<&dyn $crate::value::Message> {
                    ::std::option::Option::Some(&self.$base)
                }

                fn base_mut(&mut self) -> ::std::option::Option<&mut dyn $crate::value::Message> {
                    ::std::option::Option::Some(&mut self.$base)
                }
            )?
        }

        impl ::std::convert::From<$ty> for $crate::value::Value {
            fn from(message: $ty) -> Self {
                $crate::value::Value::Message(::std::boxed::Box::new(message))
            }
        }

        impl $crate::value::FromValue for $ty {
            fn from_value(
                value: $crate::value::Value,
            ) -> ::std::result::Result<Self, $crate::value::ValueError> {
                $crate::value::message_from_value(value)
            }
        }

        // Boxed fields let a message refer to its own type.
        impl ::std::convert::From<::std::boxed::Box<$ty>> for $crate::value::Value {
            fn from(message: ::std::boxed::Box<$ty>) -> Self {
                $crate::value::Value::Message(message)
            }
        }

        impl $crate::value::FromValue for ::std::boxed::Box<$ty> {
            fn from_value(
                value: $crate::value::Value,
            ) -> ::std::result::Result<Self, $crate::value::ValueError> {
                $crate::value::message_from_value::<$ty>(value).map(::std::boxed::Box::new)
            }
        }
    };
}

/// Implements [`EnumType`], the [`Value`] conversions and [`FromValue`] for a generated,
/// fieldless enum. Variants must be listed in declaration order.
///
/// ```rust,ignore
/// impl_enum!(Sex, SEX, [Male, Female, Centaur]);
/// ```
#[macro_export]
macro_rules! impl_enum {
    ($ty:ident, $descriptor:path, [$($variant:ident),+ $(,)?]) => {
        impl $crate::value::EnumType for $ty {
            fn descriptor() -> &'static $crate::descriptors::EnumDescriptor {
                &*$descriptor
            }

            fn ordinal(self) -> usize {
                self as usize
            }

            fn from_ordinal(ordinal: usize) -> ::std::option::Option<Self> {
                [$($ty::$variant),+].get(ordinal).copied()
            }
        }

        impl ::std::convert::From<$ty> for $crate::value::EnumValue {
            fn from(value: $ty) -> Self {
                $crate::value::EnumValue::of(value)
            }
        }

        impl ::std::convert::From<$ty> for $crate::value::Value {
            fn from(value: $ty) -> Self {
                $crate::value::Value::Enum($crate::value::EnumValue::of(value))
            }
        }

        impl $crate::value::FromValue for $ty {
            fn from_value(
                value: $crate::value::Value,
            ) -> ::std::result::Result<Self, $crate::value::ValueError> {
                $crate::value::enum_from_value(value)
            }
        }
    };
}
