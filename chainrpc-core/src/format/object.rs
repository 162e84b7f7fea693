use super::FormatError;
use crate::descriptors::{DataType, EnumDescriptor, MessageDescriptor};
use crate::value::{EnumValue, Message, Value};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Number};
use std::ptr;

/// Canonical datetime text, always UTC.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

type Tree = serde_json::Value;

/// Converts values to and from `serde_json::Value` trees.
///
/// Absence is `null` on both sides. Writing a message walks its *runtime* descriptor, so a
/// subtype held in a base-typed field writes all of its fields. Reading a polymorphic message
/// first reads the discriminator, then instantiates the matching subtype.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectFormat;

impl ObjectFormat {
    pub fn to_object(&self, value: Option<&Value>, ty: &DataType) -> Result<Tree, FormatError> {
        let Some(value) = value else {
            return Ok(Tree::Null);
        };

        match (ty, value) {
            (DataType::Void, _) => Ok(Tree::Null),
            (DataType::Bool, Value::Bool(value)) => Ok(Tree::Bool(*value)),
            (DataType::Int16, Value::Int16(value)) => Ok(Tree::from(*value)),
            (DataType::Int32, Value::Int32(value)) => Ok(Tree::from(*value)),
            (DataType::Int64, Value::Int64(value)) => Ok(Tree::from(*value)),
            (DataType::Float, Value::Float(value)) => write_float(*value),
            (DataType::Double, Value::Double(value)) => write_double(*value),
            (DataType::String, Value::String(value)) => Ok(Tree::String(value.clone())),
            (DataType::Datetime, Value::Datetime(value)) => {
                Ok(Tree::String(value.format(DATETIME_FORMAT).to_string()))
            }
            (DataType::Enum(descriptor), Value::Enum(value)) => write_enum(descriptor, value),
            (
                DataType::List(element) | DataType::Set(element),
                Value::List(items) | Value::Set(items),
            ) => items
                .iter()
                .map(|item| self.to_object(Some(item), element))
                .collect::<Result<Vec<_>, _>>()
                .map(Tree::Array),
            (DataType::Map(key_type, value_type), Value::Map(entries)) => {
                check_map_key(ty, key_type)?;

                let mut map = Map::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = self.write_key(key, key_type, ty)?;
                    map.insert(key, self.to_object(Some(value), value_type)?);
                }
                Ok(Tree::Object(map))
            }
            (DataType::Message(descriptor), Value::Message(message)) => {
                self.write_message(descriptor, message.as_ref())
            }
            (ty, value) => Err(FormatError::Mismatch {
                expected: ty.to_string(),
                actual: value.tag().to_string(),
            }),
        }
    }

    pub fn from_object(&self, object: &Tree, ty: &DataType) -> Result<Option<Value>, FormatError> {
        if object.is_null() {
            return Ok(None);
        }

        let value = match ty {
            DataType::Void => return Ok(None),
            DataType::Bool => Value::Bool(read_bool(object)?),
            DataType::Int16 => Value::Int16(narrow(read_integer(object, ty)?, ty)?),
            DataType::Int32 => Value::Int32(narrow(read_integer(object, ty)?, ty)?),
            DataType::Int64 => Value::Int64(read_integer(object, ty)?),
            DataType::Float => Value::Float(read_float(object)?),
            DataType::Double => Value::Double(read_double(object, ty)?),
            DataType::String => match object {
                Tree::String(value) => Value::String(value.clone()),
                other => return Err(mismatch(ty, other)),
            },
            DataType::Datetime => match object {
                Tree::String(value) => Value::Datetime(parse_datetime(value)?),
                other => return Err(mismatch(ty, other)),
            },
            DataType::Enum(descriptor) => match object {
                Tree::String(value) => return Ok(descriptor.find(value).map(Value::Enum)),
                other => return Err(mismatch(ty, other)),
            },
            DataType::List(element) => Value::List(self.read_elements(object, element, ty)?),
            DataType::Set(element) => {
                let mut unique: Vec<Value> = Vec::new();
                for item in self.read_elements(object, element, ty)? {
                    if !unique.contains(&item) {
                        unique.push(item);
                    }
                }
                Value::Set(unique)
            }
            DataType::Map(key_type, value_type) => {
                check_map_key(ty, key_type)?;

                let Tree::Object(map) = object else {
                    return Err(mismatch(ty, object));
                };

                let mut entries = Vec::with_capacity(map.len());
                for (key, value) in map {
                    let key = self
                        .from_object(&Tree::String(key.clone()), key_type)?
                        .ok_or_else(|| FormatError::NullMapKey(ty.to_string()))?;
                    let value = self
                        .from_object(value, value_type)?
                        .ok_or_else(|| FormatError::NullElement(ty.to_string()))?;
                    entries.push((key, value));
                }
                Value::Map(entries)
            }
            DataType::Message(descriptor) => Value::Message(self.read_message(*descriptor, object)?),
        };

        Ok(Some(value))
    }

    fn write_key(&self, key: &Value, key_type: &DataType, map: &DataType) -> Result<String, FormatError> {
        match self.to_object(Some(key), key_type)? {
            Tree::String(key) => Ok(key),
            Tree::Number(key) => Ok(key.to_string()),
            Tree::Bool(key) => Ok(key.to_string()),
            Tree::Null => Err(FormatError::NullMapKey(map.to_string())),
            _ => Err(FormatError::UnsupportedMapKey(key_type.to_string())),
        }
    }

    fn write_message(
        &self,
        declared: &MessageDescriptor,
        message: &dyn Message,
    ) -> Result<Tree, FormatError> {
        let descriptor = message.descriptor();
        if !descriptor.is_subtype_of(declared) {
            return Err(FormatError::Mismatch {
                expected: declared.name().to_owned(),
                actual: descriptor.name().to_owned(),
            });
        }

        let mut map = Map::new();
        for field in descriptor.fields() {
            if let Some(value) = field.get(message) {
                let object = self
                    .to_object(Some(&value), field.ty())
                    .map_err(FormatError::field(field.name()))?;
                map.insert(field.name().to_owned(), object);
            }
        }

        Ok(Tree::Object(map))
    }

    fn read_message(
        &self,
        declared: &'static MessageDescriptor,
        object: &Tree,
    ) -> Result<Box<dyn Message>, FormatError> {
        let Tree::Object(map) = object else {
            return Err(FormatError::Mismatch {
                expected: declared.name().to_owned(),
                actual: kind(object).to_owned(),
            });
        };

        let descriptor = match declared.discriminator() {
            Some(field) => {
                let value = match map.get(field.name()) {
                    Some(raw) => self
                        .from_object(raw, field.ty())
                        .map_err(FormatError::field(field.name()))?,
                    None => None,
                };
                let value = match value {
                    Some(Value::Enum(value)) => Some(value),
                    _ => None,
                };
                declared.get_subtype(value.as_ref())?
            }
            None => declared,
        };

        let mut message = descriptor.new_instance();
        for field in descriptor.fields() {
            let Some(raw) = map.get(field.name()) else {
                continue;
            };

            if let Some(value) = self
                .from_object(raw, field.ty())
                .map_err(FormatError::field(field.name()))?
            {
                field
                    .set(message.as_mut(), value)
                    .map_err(|error| FormatError::field(field.name())(error.into()))?;
            }
        }

        Ok(message)
    }

    fn read_elements(
        &self,
        object: &Tree,
        element: &DataType,
        container: &DataType,
    ) -> Result<Vec<Value>, FormatError> {
        let Tree::Array(items) = object else {
            return Err(mismatch(container, object));
        };

        items
            .iter()
            .map(|item| {
                self.from_object(item, element)?
                    .ok_or_else(|| FormatError::NullElement(container.to_string()))
            })
            .collect()
    }
}

fn kind(object: &Tree) -> &'static str {
    match object {
        Tree::Null => "null",
        Tree::Bool(_) => "boolean",
        Tree::Number(_) => "number",
        Tree::String(_) => "string",
        Tree::Array(_) => "array",
        Tree::Object(_) => "object",
    }
}

fn mismatch(ty: &DataType, object: &Tree) -> FormatError {
    FormatError::Mismatch {
        expected: ty.to_string(),
        actual: kind(object).to_owned(),
    }
}

fn check_map_key(map: &DataType, key: &DataType) -> Result<(), FormatError> {
    if key.is_primitive() || matches!(key, DataType::Enum(_)) {
        Ok(())
    } else {
        Err(FormatError::UnsupportedMapKey(map.to_string()))
    }
}

fn write_enum(descriptor: &EnumDescriptor, value: &EnumValue) -> Result<Tree, FormatError> {
    if !ptr::eq(descriptor, value.descriptor()) {
        return Err(FormatError::Mismatch {
            expected: descriptor.name().to_owned(),
            actual: value.descriptor().name().to_owned(),
        });
    }
    Ok(Tree::String(value.name().to_lowercase()))
}

fn write_double(value: f64) -> Result<Tree, FormatError> {
    Number::from_f64(value)
        .map(Tree::Number)
        .ok_or(FormatError::NonFinite(value))
}

/// Writes the shortest decimal that reads back as the same `f32`, so `0.1f32` is `0.1`.
fn write_float(value: f32) -> Result<Tree, FormatError> {
    let widened = value
        .to_string()
        .parse::<f64>()
        .unwrap_or(f64::from(value));
    write_double(widened)
}

fn read_bool(object: &Tree) -> Result<bool, FormatError> {
    match object {
        Tree::Bool(value) => Ok(*value),
        Tree::String(text) if text.eq_ignore_ascii_case("true") => Ok(true),
        Tree::String(text) if text.eq_ignore_ascii_case("false") => Ok(false),
        Tree::String(text) => Err(FormatError::Parse {
            expected: "bool".to_owned(),
            input: text.clone(),
            source: "expected 'true' or 'false'".into(),
        }),
        other => Err(mismatch(&DataType::Bool, other)),
    }
}

fn read_integer(object: &Tree, ty: &DataType) -> Result<i64, FormatError> {
    match object {
        Tree::Number(number) => number.as_i64().ok_or_else(|| FormatError::OutOfRange {
            expected: ty.to_string(),
            value: number.to_string(),
        }),
        Tree::String(text) => text.trim().parse().map_err(|error| FormatError::Parse {
            expected: ty.to_string(),
            input: text.clone(),
            source: Box::new(error),
        }),
        other => Err(mismatch(ty, other)),
    }
}

fn narrow<T: TryFrom<i64>>(value: i64, ty: &DataType) -> Result<T, FormatError> {
    T::try_from(value).map_err(|_| FormatError::OutOfRange {
        expected: ty.to_string(),
        value: value.to_string(),
    })
}

fn read_double(object: &Tree, ty: &DataType) -> Result<f64, FormatError> {
    let value = match object {
        Tree::Number(number) => number.as_f64().ok_or_else(|| FormatError::OutOfRange {
            expected: ty.to_string(),
            value: number.to_string(),
        })?,
        Tree::String(text) => text.trim().parse().map_err(|error| FormatError::Parse {
            expected: ty.to_string(),
            input: text.clone(),
            source: Box::new(error),
        })?,
        other => return Err(mismatch(ty, other)),
    };

    if value.is_finite() {
        Ok(value)
    } else {
        Err(FormatError::NonFinite(value))
    }
}

fn read_float(object: &Tree) -> Result<f32, FormatError> {
    let value = read_double(object, &DataType::Float)?;
    let narrowed = value as f32;

    if narrowed.is_finite() {
        Ok(narrowed)
    } else {
        Err(FormatError::OutOfRange {
            expected: DataType::Float.to_string(),
            value: value.to_string(),
        })
    }
}

fn parse_datetime(text: &str) -> Result<DateTime<Utc>, FormatError> {
    NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
        .map(|datetime| datetime.and_utc())
        .map_err(|error| FormatError::Parse {
            expected: DataType::Datetime.to_string(),
            input: text.to_owned(),
            source: Box::new(error),
        })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_fixtures::{
        BASE, Base, MULTI_LEVEL_SUBTYPE, MultiLevelSubtype, POLYMORPHIC_TYPE, SUBTYPE, Subtype,
        TEST_ENUM, TEST_MESSAGE, TestEnum, TestMessage,
    };
    use crate::value::{FromValue, downcast};
    use chrono::TimeZone;
    use serde_json::json;

    fn write(value: impl Into<Value>, ty: &DataType) -> Tree {
        ObjectFormat.to_object(Some(&value.into()), ty).unwrap()
    }

    fn read(object: Tree, ty: &DataType) -> Option<Value> {
        ObjectFormat.from_object(&object, ty).unwrap()
    }

    #[test]
    fn test_absent_values_are_null() {
        assert_eq!(ObjectFormat.to_object(None, &DataType::String).unwrap(), Tree::Null);
        assert_eq!(read(Tree::Null, &DataType::Message(&TEST_MESSAGE)), None);
        assert_eq!(read(json!("anything"), &DataType::Void), None);
        assert_eq!(write(Value::Void, &DataType::Void), Tree::Null);
    }

    #[test]
    fn test_numbers_accept_numeric_strings() {
        assert_eq!(read(json!(42), &DataType::Int32), Some(Value::Int32(42)));
        assert_eq!(read(json!(" 42 "), &DataType::Int32), Some(Value::Int32(42)));
        assert_eq!(read(json!("-7"), &DataType::Int16), Some(Value::Int16(-7)));
        assert_eq!(read(json!("2.5"), &DataType::Double), Some(Value::Double(2.5)));
        assert_eq!(read(json!(1.5), &DataType::Float), Some(Value::Float(1.5)));
    }

    #[test]
    fn test_out_of_range_integers_are_rejected() {
        let error = ObjectFormat
            .from_object(&json!(40000), &DataType::Int16)
            .unwrap_err();
        assert!(matches!(error, FormatError::OutOfRange { .. }));

        let error = ObjectFormat
            .from_object(&json!(1.5), &DataType::Int64)
            .unwrap_err();
        assert!(matches!(error, FormatError::OutOfRange { .. }));

        let error = ObjectFormat
            .from_object(&json!("1e400"), &DataType::Double)
            .unwrap_err();
        assert!(matches!(error, FormatError::NonFinite(_)));
    }

    #[test]
    fn test_unparsable_primitives_carry_their_cause() {
        let error = ObjectFormat
            .from_object(&json!("abc"), &DataType::Int32)
            .unwrap_err();

        match error {
            FormatError::Parse { expected, input, .. } => {
                assert_eq!(expected, "int32");
                assert_eq!(input, "abc");
            }
            other => panic!("Expected a parse error, got {other:?}"),
        }

        assert!(
            ObjectFormat
                .from_object(&json!([1]), &DataType::String)
                .is_err()
        );
    }

    #[test]
    fn test_floats_write_their_shortest_form() {
        assert_eq!(write(0.1f32, &DataType::Float), json!(0.1));
        assert_eq!(write(1.5f32, &DataType::Float), json!(1.5));

        let error = ObjectFormat
            .to_object(Some(&Value::Double(f64::NAN)), &DataType::Double)
            .unwrap_err();
        assert!(matches!(error, FormatError::NonFinite(_)));
    }

    #[test]
    fn test_bools_accept_strings_ignoring_case() {
        assert_eq!(read(json!("TRUE"), &DataType::Bool), Some(Value::Bool(true)));
        assert_eq!(read(json!("false"), &DataType::Bool), Some(Value::Bool(false)));
        assert!(ObjectFormat.from_object(&json!("yes"), &DataType::Bool).is_err());
    }

    #[test]
    fn test_datetimes_use_whole_seconds_utc() {
        let datetime = Utc.with_ymd_and_hms(2015, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(write(datetime, &DataType::Datetime), json!("2015-01-02T03:04:05Z"));
        assert_eq!(
            read(json!("2015-01-02T03:04:05Z"), &DataType::Datetime),
            Some(Value::Datetime(datetime))
        );

        let error = ObjectFormat
            .from_object(&json!("2013-11-17T19:41Z"), &DataType::Datetime)
            .unwrap_err();
        assert!(matches!(error, FormatError::Parse { .. }));
    }

    #[test]
    fn test_enums_are_lowercase_and_lenient() {
        let ty = DataType::Enum(&TEST_ENUM);
        assert_eq!(write(TestEnum::Three, &ty), json!("three"));
        assert_eq!(read(json!("ThReE"), &ty), Some(Value::from(TestEnum::Three)));
        assert_eq!(read(json!("four"), &ty), None);

        let error = ObjectFormat
            .to_object(Some(&Value::from(TestEnum::One)), &DataType::Enum(&POLYMORPHIC_TYPE))
            .unwrap_err();
        assert!(matches!(error, FormatError::Mismatch { .. }));
    }

    #[test]
    fn test_sets_are_deduplicated_on_read() {
        let ty = DataType::set(DataType::Int32);
        let value = read(json!([1, 2, 1, "2"]), &ty).unwrap();
        assert_eq!(value, Value::Set(vec![Value::Int32(1), Value::Int32(2)]));
    }

    #[test]
    fn test_null_elements_are_rejected() {
        let ty = DataType::list(DataType::String);
        let error = ObjectFormat.from_object(&json!(["a", null]), &ty).unwrap_err();
        assert!(matches!(error, FormatError::NullElement(_)));
    }

    #[test]
    fn test_map_keys_are_strings() {
        let ty = DataType::map(DataType::Int32, DataType::Float);
        let value = Value::Map(vec![(Value::Int32(1), Value::Float(1.5))]);
        assert_eq!(write(value.clone(), &ty), json!({"1": 1.5}));
        assert_eq!(read(json!({"1": 1.5}), &ty), Some(value));

        let ty = DataType::map(DataType::Enum(&TEST_ENUM), DataType::Bool);
        let value = Value::Map(vec![(TestEnum::Two.into(), true.into())]);
        assert_eq!(write(value.clone(), &ty), json!({"two": true}));
        assert_eq!(read(json!({"TWO": true}), &ty), Some(value));
    }

    #[test]
    fn test_invalid_map_keys() {
        let ty = DataType::map(DataType::list(DataType::Int32), DataType::Int32);
        let error = ObjectFormat.from_object(&json!({}), &ty).unwrap_err();
        assert!(matches!(error, FormatError::UnsupportedMapKey(_)));

        // Unknown enum names read as absent, which a key cannot be.
        let ty = DataType::map(DataType::Enum(&TEST_ENUM), DataType::Int32);
        let error = ObjectFormat.from_object(&json!({"four": 4}), &ty).unwrap_err();
        assert!(matches!(error, FormatError::NullMapKey(_)));
    }

    #[test]
    fn test_messages_omit_absent_fields() {
        let message = TestMessage {
            string0: Some("hello".to_string()),
            int0: Some(1),
            list0: Some(vec![1, 2]),
            message0: Some(Box::new(TestMessage {
                bool0: Some(true),
                ..Default::default()
            })),
            ..Default::default()
        };
        let ty = DataType::Message(&TEST_MESSAGE);

        let object = write(message.clone(), &ty);
        assert_eq!(
            object,
            json!({
                "string0": "hello",
                "int0": 1,
                "list0": [1, 2],
                "message0": {"bool0": true}
            })
        );

        let value = read(object, &ty).unwrap();
        assert_eq!(TestMessage::from_value(value).unwrap(), message);
    }

    #[test]
    fn test_polymorphic_write_uses_runtime_descriptor() {
        let message = TestMessage {
            polymorphic: Some(Box::new(Subtype {
                base: Base {
                    field: Some("field".to_string()),
                    ..Subtype::default().base
                },
                subfield: Some("subfield".to_string()),
            })),
            ..Default::default()
        };

        let object = write(message, &DataType::Message(&TEST_MESSAGE));
        assert_eq!(
            object,
            json!({
                "polymorphic": {"type": "subtype", "field": "field", "subfield": "subfield"}
            })
        );
    }

    #[test]
    fn test_polymorphic_read_resolves_subtype() {
        let object = json!({"type": "multilevel_subtype", "field": "a", "mfield": "b"});
        let value = read(object, &DataType::Message(&BASE)).unwrap();

        let Value::Message(message) = value else {
            panic!("Expected a message");
        };
        assert!(ptr::eq(message.descriptor(), &*MULTI_LEVEL_SUBTYPE));

        let message = downcast::<MultiLevelSubtype>(message).unwrap();
        assert_eq!(message.mfield.as_deref(), Some("b"));
        assert_eq!(message.base.base.field.as_deref(), Some("a"));
    }

    #[test]
    fn test_unknown_discriminator_falls_back_to_declared_type() {
        let object = json!({"type": "unknown", "field": "a", "subfield": "ignored"});
        let value = read(object, &DataType::Message(&BASE)).unwrap();

        let Value::Message(message) = value else {
            panic!("Expected a message");
        };
        assert!(ptr::eq(message.descriptor(), &*BASE));

        let message = downcast::<Base>(message).unwrap();
        assert_eq!(
            message,
            Base {
                type_: None,
                field: Some("a".to_string())
            }
        );
    }

    #[test]
    fn test_subtype_of_another_branch_is_rejected() {
        let error = ObjectFormat
            .to_object(Some(&Value::from(Base::default())), &DataType::Message(&SUBTYPE))
            .unwrap_err();
        assert!(matches!(error, FormatError::Mismatch { .. }));
    }

    #[test]
    fn test_field_errors_name_the_field() {
        let error = ObjectFormat
            .from_object(&json!({"int0": "x"}), &DataType::Message(&TEST_MESSAGE))
            .unwrap_err();

        match error {
            FormatError::Field { field, source } => {
                assert_eq!(field, "int0");
                assert!(matches!(*source, FormatError::Parse { .. }));
            }
            other => panic!("Expected a field error, got {other:?}"),
        }
    }
}
