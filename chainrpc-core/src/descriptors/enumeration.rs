use super::DescriptorError;
use crate::value::EnumValue;
use std::collections::HashMap;
use std::fmt;

/// An enum: a name and its ordered value tokens.
pub struct EnumDescriptor {
    name: String,
    values: Vec<String>,
    index: HashMap<String, usize>,
}

impl EnumDescriptor {
    /// Tokens must be unique, ignoring case.
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Result<Self, DescriptorError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        let mut index = HashMap::with_capacity(values.len());

        for (ordinal, value) in values.iter().enumerate() {
            if index.insert(value.to_lowercase(), ordinal).is_some() {
                return Err(DescriptorError::DuplicateEnumValue {
                    name,
                    value: value.clone(),
                });
            }
        }

        Ok(Self {
            name,
            values,
            index,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Case-insensitive lookup by token.
    pub fn find(&'static self, name: &str) -> Option<EnumValue> {
        let ordinal = *self.index.get(&name.to_lowercase())?;
        EnumValue::new(self, ordinal)
    }

    pub fn value(&'static self, ordinal: usize) -> Option<EnumValue> {
        EnumValue::new(self, ordinal)
    }
}

impl PartialEq for EnumDescriptor {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl fmt::Debug for EnumDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EnumDescriptor").field(&self.name).finish()
    }
}
