//! Descriptors, messages and services shared by the unit tests, written the way generated code
//! writes them.
use crate::descriptors::{
    ArgRouting, DataType, EnumDescriptor, FieldAccessor, FieldDescriptor, InterfaceDescriptor,
    MessageDescriptor, MethodDescriptor,
};
use crate::invocation::{Dispatched, InvocationProxy, InvokeError, arg};
use crate::value::Value;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, LazyLock};

macro_rules! field {
    ($message:ty, $name:literal, $field:ident, $ty:expr) => {
        FieldDescriptor::new(
            $name,
            $ty,
            FieldAccessor::of(|m: &$message| &m.$field, |m: &mut $message| &mut m.$field),
        )
    };
}

// Enums

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestEnum {
    One,
    Two,
    Three,
}

pub static TEST_ENUM: LazyLock<EnumDescriptor> = LazyLock::new(|| {
    EnumDescriptor::new("TestEnum", ["ONE", "TWO", "THREE"]).expect("valid enum")
});

crate::impl_enum!(TestEnum, TEST_ENUM, [One, Two, Three]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolymorphicType {
    Subtype,
    Subtype2,
    MultilevelSubtype,
}

pub static POLYMORPHIC_TYPE: LazyLock<EnumDescriptor> = LazyLock::new(|| {
    EnumDescriptor::new(
        "PolymorphicType",
        ["SUBTYPE", "SUBTYPE2", "MULTILEVEL_SUBTYPE"],
    )
    .expect("valid enum")
});

crate::impl_enum!(
    PolymorphicType,
    POLYMORPHIC_TYPE,
    [Subtype, Subtype2, MultilevelSubtype]
);

// Messages

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestMessage {
    pub string0: Option<String>,
    pub bool0: Option<bool>,
    pub short0: Option<i16>,
    pub int0: Option<i32>,
    pub long0: Option<i64>,
    pub float0: Option<f32>,
    pub double0: Option<f64>,
    pub datetime0: Option<DateTime<Utc>>,
    pub enum0: Option<TestEnum>,
    pub list0: Option<Vec<i32>>,
    pub set0: Option<HashSet<String>>,
    pub map0: Option<HashMap<i32, f32>>,
    pub message0: Option<Box<TestMessage>>,
    pub polymorphic: Option<Box<dyn crate::value::Message>>,
}

pub static TEST_MESSAGE: LazyLock<MessageDescriptor> = LazyLock::new(|| {
    MessageDescriptor::builder("TestMessage")
        .factory(|| Box::new(TestMessage::default()))
        .field(field!(TestMessage, "string0", string0, DataType::String))
        .field(field!(TestMessage, "bool0", bool0, DataType::Bool))
        .field(field!(TestMessage, "short0", short0, DataType::Int16))
        .field(field!(TestMessage, "int0", int0, DataType::Int32))
        .field(field!(TestMessage, "long0", long0, DataType::Int64))
        .field(field!(TestMessage, "float0", float0, DataType::Float))
        .field(field!(TestMessage, "double0", double0, DataType::Double))
        .field(field!(TestMessage, "datetime0", datetime0, DataType::Datetime))
        .field(field!(TestMessage, "enum0", enum0, DataType::Enum(&TEST_ENUM)))
        .field(field!(TestMessage, "list0", list0, DataType::list(DataType::Int32)))
        .field(field!(TestMessage, "set0", set0, DataType::set(DataType::String)))
        .field(field!(
            TestMessage,
            "map0",
            map0,
            DataType::map(DataType::Int32, DataType::Float)
        ))
        .field(FieldDescriptor::lazy(
            "message0",
            || DataType::Message(&TEST_MESSAGE),
            FieldAccessor::of(|m: &TestMessage| &m.message0, |m: &mut TestMessage| &mut m.message0),
        ))
        .field(field!(TestMessage, "polymorphic", polymorphic, DataType::Message(&BASE)))
        .build()
        .expect("valid message")
});

crate::impl_message!(TestMessage, TEST_MESSAGE);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Base {
    pub type_: Option<PolymorphicType>,
    pub field: Option<String>,
}

pub static BASE: LazyLock<MessageDescriptor> = LazyLock::new(|| {
    MessageDescriptor::builder("Base")
        .factory(|| Box::new(Base::default()))
        .field(
            field!(Base, "type", type_, DataType::Enum(&POLYMORPHIC_TYPE)).discriminator(),
        )
        .field(field!(Base, "field", field, DataType::String))
        .subtype(|| &*SUBTYPE)
        .subtype(|| &*SUBTYPE2)
        .build()
        .expect("valid message")
});

crate::impl_message!(Base, BASE);

#[derive(Debug, Clone, PartialEq)]
pub struct Subtype {
    pub base: Base,
    pub subfield: Option<String>,
}

impl Default for Subtype {
    fn default() -> Self {
        Self {
            base: Base {
                type_: Some(PolymorphicType::Subtype),
                field: None,
            },
            subfield: None,
        }
    }
}

pub static SUBTYPE: LazyLock<MessageDescriptor> = LazyLock::new(|| {
    MessageDescriptor::builder("Subtype")
        .factory(|| Box::new(Subtype::default()))
        .base(&BASE)
        .discriminator_value(PolymorphicType::Subtype)
        .field(field!(Subtype, "subfield", subfield, DataType::String))
        .subtype(|| &*MULTI_LEVEL_SUBTYPE)
        .build()
        .expect("valid message")
});

crate::impl_message!(Subtype, SUBTYPE, base = base);

#[derive(Debug, Clone, PartialEq)]
pub struct Subtype2 {
    pub base: Base,
    pub subfield2: Option<String>,
}

impl Default for Subtype2 {
    fn default() -> Self {
        Self {
            base: Base {
                type_: Some(PolymorphicType::Subtype2),
                field: None,
            },
            subfield2: None,
        }
    }
}

pub static SUBTYPE2: LazyLock<MessageDescriptor> = LazyLock::new(|| {
    MessageDescriptor::builder("Subtype2")
        .factory(|| Box::new(Subtype2::default()))
        .base(&BASE)
        .discriminator_value(PolymorphicType::Subtype2)
        .field(field!(Subtype2, "subfield2", subfield2, DataType::String))
        .build()
        .expect("valid message")
});

crate::impl_message!(Subtype2, SUBTYPE2, base = base);

#[derive(Debug, Clone, PartialEq)]
pub struct MultiLevelSubtype {
    pub base: Subtype,
    pub mfield: Option<String>,
}

impl Default for MultiLevelSubtype {
    fn default() -> Self {
        Self {
            base: Subtype {
                base: Base {
                    type_: Some(PolymorphicType::MultilevelSubtype),
                    field: None,
                },
                subfield: None,
            },
            mfield: None,
        }
    }
}

pub static MULTI_LEVEL_SUBTYPE: LazyLock<MessageDescriptor> = LazyLock::new(|| {
    MessageDescriptor::builder("MultiLevelSubtype")
        .factory(|| Box::new(MultiLevelSubtype::default()))
        .base(&SUBTYPE)
        .discriminator_value(PolymorphicType::MultilevelSubtype)
        .field(field!(MultiLevelSubtype, "mfield", mfield, DataType::String))
        .build()
        .expect("valid message")
});

crate::impl_message!(MultiLevelSubtype, MULTI_LEVEL_SUBTYPE, base = base);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestException {
    pub text: Option<String>,
}

pub static TEST_EXCEPTION: LazyLock<MessageDescriptor> = LazyLock::new(|| {
    MessageDescriptor::builder("TestException")
        .factory(|| Box::new(TestException::default()))
        .field(field!(TestException, "text", text, DataType::String))
        .build()
        .expect("valid message")
});

crate::impl_message!(TestException, TEST_EXCEPTION);

// Interfaces

pub trait TestService: Send + Sync {
    fn method(&self, arg0: Option<i32>, arg1: Option<i32>) -> Result<Option<i32>, InvokeError>;

    fn query(&self, arg0: Option<i32>, arg1: Option<i32>) -> Result<Option<i32>, InvokeError>;

    fn post(&self, arg0: Option<i32>, arg1: Option<i32>) -> Result<Option<i32>, InvokeError>;

    fn string0(&self, text: Option<String>) -> Result<Option<String>, InvokeError>;

    fn datetime0(
        &self,
        datetime: Option<DateTime<Utc>>,
    ) -> Result<Option<DateTime<Utc>>, InvokeError>;

    fn message0(&self, message: Option<TestMessage>) -> Result<Option<TestMessage>, InvokeError>;

    fn interface_method(
        &self,
        arg0: Option<i32>,
        arg1: Option<i32>,
    ) -> Result<TestReceiver, InvokeError>;

    fn void0(&self) -> Result<(), InvokeError>;

    fn exc0(&self) -> Result<(), InvokeError>;

    fn fail(&self) -> Result<(), InvokeError>;
}

/// The receiver type every `TestInterface` dispatcher expects.
pub type TestReceiver = Arc<dyn TestService>;

fn args2(args: &[Option<Value>]) -> Result<(Option<i32>, Option<i32>), InvokeError> {
    Ok((arg(args, 0)?, arg(args, 1)?))
}

pub static TEST_METHOD: LazyLock<MethodDescriptor> = LazyLock::new(|| {
    MethodDescriptor::builder("method")
        .arg("arg0", DataType::Int32, ArgRouting::Path)
        .arg("arg1", DataType::Int32, ArgRouting::Path)
        .returns(DataType::Int32)
        .dispatcher(|service: &TestReceiver, args| {
            let (arg0, arg1) = args2(args)?;
            Ok(Dispatched::data(service.method(arg0, arg1)?))
        })
        .build()
        .expect("valid method")
});

pub static TEST_QUERY: LazyLock<MethodDescriptor> = LazyLock::new(|| {
    MethodDescriptor::builder("query")
        .arg("arg0", DataType::Int32, ArgRouting::Query)
        .arg("arg1", DataType::Int32, ArgRouting::Query)
        .returns(DataType::Int32)
        .dispatcher(|service: &TestReceiver, args| {
            let (arg0, arg1) = args2(args)?;
            Ok(Dispatched::data(service.query(arg0, arg1)?))
        })
        .build()
        .expect("valid method")
});

pub static TEST_POST: LazyLock<MethodDescriptor> = LazyLock::new(|| {
    MethodDescriptor::builder("post")
        .arg("arg0", DataType::Int32, ArgRouting::Body)
        .arg("arg1", DataType::Int32, ArgRouting::Body)
        .post()
        .returns(DataType::Int32)
        .dispatcher(|service: &TestReceiver, args| {
            let (arg0, arg1) = args2(args)?;
            Ok(Dispatched::data(service.post(arg0, arg1)?))
        })
        .build()
        .expect("valid method")
});

pub static TEST_STRING: LazyLock<MethodDescriptor> = LazyLock::new(|| {
    MethodDescriptor::builder("string0")
        .arg("text", DataType::String, ArgRouting::Path)
        .returns(DataType::String)
        .dispatcher(|service: &TestReceiver, args| {
            Ok(Dispatched::data(service.string0(arg(args, 0)?)?))
        })
        .build()
        .expect("valid method")
});

pub static TEST_DATETIME: LazyLock<MethodDescriptor> = LazyLock::new(|| {
    MethodDescriptor::builder("datetime0")
        .arg("datetime", DataType::Datetime, ArgRouting::Query)
        .returns(DataType::Datetime)
        .dispatcher(|service: &TestReceiver, args| {
            Ok(Dispatched::data(service.datetime0(arg(args, 0)?)?))
        })
        .build()
        .expect("valid method")
});

pub static TEST_MESSAGE_METHOD: LazyLock<MethodDescriptor> = LazyLock::new(|| {
    MethodDescriptor::builder("message0")
        .arg("message", DataType::Message(&TEST_MESSAGE), ArgRouting::Body)
        .post()
        .returns(DataType::Message(&TEST_MESSAGE))
        .dispatcher(|service: &TestReceiver, args| {
            Ok(Dispatched::data(service.message0(arg(args, 0)?)?))
        })
        .build()
        .expect("valid method")
});

pub static TEST_INTERFACE_METHOD: LazyLock<MethodDescriptor> = LazyLock::new(|| {
    MethodDescriptor::builder("interfaceMethod")
        .arg("arg0", DataType::Int32, ArgRouting::Path)
        .arg("arg1", DataType::Int32, ArgRouting::Path)
        .returns_interface(|| &*TEST_INTERFACE)
        .dispatcher(|service: &TestReceiver, args| {
            let (arg0, arg1) = args2(args)?;
            Ok(Dispatched::interface(service.interface_method(arg0, arg1)?))
        })
        .build()
        .expect("valid method")
});

pub static TEST_VOID: LazyLock<MethodDescriptor> = LazyLock::new(|| {
    MethodDescriptor::builder("void0")
        .returns(DataType::Void)
        .dispatcher(|service: &TestReceiver, _| {
            service.void0()?;
            Ok(Dispatched::void())
        })
        .build()
        .expect("valid method")
});

pub static TEST_EXC: LazyLock<MethodDescriptor> = LazyLock::new(|| {
    MethodDescriptor::builder("exc0")
        .returns(DataType::Void)
        .dispatcher(|service: &TestReceiver, _| {
            service.exc0()?;
            Ok(Dispatched::void())
        })
        .build()
        .expect("valid method")
});

pub static TEST_FAIL: LazyLock<MethodDescriptor> = LazyLock::new(|| {
    MethodDescriptor::builder("fail")
        .returns(DataType::Void)
        .dispatcher(|service: &TestReceiver, _| {
            service.fail()?;
            Ok(Dispatched::void())
        })
        .build()
        .expect("valid method")
});

pub static TEST_INTERFACE: LazyLock<InterfaceDescriptor> = LazyLock::new(|| {
    InterfaceDescriptor::builder("TestInterface")
        .exception(&TEST_EXCEPTION)
        .method(&TEST_METHOD)
        .method(&TEST_QUERY)
        .method(&TEST_POST)
        .method(&TEST_STRING)
        .method(&TEST_DATETIME)
        .method(&TEST_MESSAGE_METHOD)
        .method(&TEST_INTERFACE_METHOD)
        .method(&TEST_VOID)
        .method(&TEST_EXC)
        .method(&TEST_FAIL)
        .build()
        .expect("valid interface")
});

pub static TEST_EXTRA: LazyLock<MethodDescriptor> = LazyLock::new(|| {
    MethodDescriptor::builder("extra")
        .returns(DataType::String)
        .dispatcher(|_: &TestReceiver, _| Ok(Dispatched::data(Some("extra"))))
        .build()
        .expect("valid method")
});

pub static EXTENDED_INTERFACE: LazyLock<InterfaceDescriptor> = LazyLock::new(|| {
    InterfaceDescriptor::builder("ExtendedInterface")
        .base(&TEST_INTERFACE)
        .method(&TEST_EXTRA)
        .build()
        .expect("valid interface")
});

/// Sums its arguments on top of an offset; `interfaceMethod` moves the offset.
#[derive(Debug, Default)]
pub struct Calculator {
    pub offset: i32,
}

impl Calculator {
    fn sum(&self, arg0: Option<i32>, arg1: Option<i32>) -> i32 {
        self.offset + arg0.unwrap_or_default() + arg1.unwrap_or_default()
    }
}

impl TestService for Calculator {
    fn method(&self, arg0: Option<i32>, arg1: Option<i32>) -> Result<Option<i32>, InvokeError> {
        Ok(Some(self.sum(arg0, arg1)))
    }

    fn query(&self, arg0: Option<i32>, arg1: Option<i32>) -> Result<Option<i32>, InvokeError> {
        Ok(Some(self.sum(arg0, arg1)))
    }

    fn post(&self, arg0: Option<i32>, arg1: Option<i32>) -> Result<Option<i32>, InvokeError> {
        Ok(Some(self.sum(arg0, arg1)))
    }

    fn string0(&self, text: Option<String>) -> Result<Option<String>, InvokeError> {
        Ok(text)
    }

    fn datetime0(
        &self,
        datetime: Option<DateTime<Utc>>,
    ) -> Result<Option<DateTime<Utc>>, InvokeError> {
        Ok(datetime)
    }

    fn message0(&self, message: Option<TestMessage>) -> Result<Option<TestMessage>, InvokeError> {
        Ok(message)
    }

    fn interface_method(
        &self,
        arg0: Option<i32>,
        arg1: Option<i32>,
    ) -> Result<TestReceiver, InvokeError> {
        Ok(Arc::new(Calculator {
            offset: self.sum(arg0, arg1),
        }))
    }

    fn void0(&self) -> Result<(), InvokeError> {
        Ok(())
    }

    fn exc0(&self) -> Result<(), InvokeError> {
        Err(InvokeError::application(TestException {
            text: Some("Application exception".to_string()),
        }))
    }

    fn fail(&self) -> Result<(), InvokeError> {
        Err(InvokeError::other("Unclassified failure"))
    }
}

/// Client-side adapter over a proxy.
pub struct TestServiceProxy(pub InvocationProxy);

fn int_args(arg0: Option<i32>, arg1: Option<i32>) -> [Option<Value>; 2] {
    [arg0.map(Value::from), arg1.map(Value::from)]
}

impl TestService for TestServiceProxy {
    fn method(&self, arg0: Option<i32>, arg1: Option<i32>) -> Result<Option<i32>, InvokeError> {
        self.0.call_as(&TEST_METHOD, &int_args(arg0, arg1))
    }

    fn query(&self, arg0: Option<i32>, arg1: Option<i32>) -> Result<Option<i32>, InvokeError> {
        self.0.call_as(&TEST_QUERY, &int_args(arg0, arg1))
    }

    fn post(&self, arg0: Option<i32>, arg1: Option<i32>) -> Result<Option<i32>, InvokeError> {
        self.0.call_as(&TEST_POST, &int_args(arg0, arg1))
    }

    fn string0(&self, text: Option<String>) -> Result<Option<String>, InvokeError> {
        self.0.call_as(&TEST_STRING, &[text.map(Value::from)])
    }

    fn datetime0(
        &self,
        datetime: Option<DateTime<Utc>>,
    ) -> Result<Option<DateTime<Utc>>, InvokeError> {
        self.0.call_as(&TEST_DATETIME, &[datetime.map(Value::from)])
    }

    fn message0(&self, message: Option<TestMessage>) -> Result<Option<TestMessage>, InvokeError> {
        self.0.call_as(&TEST_MESSAGE_METHOD, &[message.map(Value::from)])
    }

    fn interface_method(
        &self,
        arg0: Option<i32>,
        arg1: Option<i32>,
    ) -> Result<TestReceiver, InvokeError> {
        let proxy = self.0.chain(&TEST_INTERFACE_METHOD, &int_args(arg0, arg1))?;
        Ok(Arc::new(TestServiceProxy(proxy)))
    }

    fn void0(&self) -> Result<(), InvokeError> {
        self.0.call(&TEST_VOID, &[]).map(drop)
    }

    fn exc0(&self) -> Result<(), InvokeError> {
        self.0.call(&TEST_EXC, &[]).map(drop)
    }

    fn fail(&self) -> Result<(), InvokeError> {
        self.0.call(&TEST_FAIL, &[]).map(drop)
    }
}
