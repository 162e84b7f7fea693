use super::{FormatError, ObjectFormat};
use crate::descriptors::DataType;
use crate::value::Value;

/// Converts values to and from JSON text through an [`ObjectFormat`].
///
/// The default instance writes compact JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat {
    object: ObjectFormat,
    pretty: bool,
}

impl JsonFormat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes indented, multi-line JSON when enabled.
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn is_pretty(&self) -> bool {
        self.pretty
    }

    pub fn object(&self) -> &ObjectFormat {
        &self.object
    }

    pub fn to_json(&self, value: Option<&Value>, ty: &DataType) -> Result<String, FormatError> {
        let tree = self.object.to_object(value, ty)?;
        self.write_tree(&tree)
    }

    pub fn from_json(&self, text: &str, ty: &DataType) -> Result<Option<Value>, FormatError> {
        let tree: serde_json::Value = serde_json::from_str(text)?;
        self.object.from_object(&tree, ty)
    }

    /// Serializes an already built object tree with this format's layout.
    pub fn write_tree(&self, tree: &serde_json::Value) -> Result<String, FormatError> {
        let text = if self.pretty {
            serde_json::to_string_pretty(tree)?
        } else {
            serde_json::to_string(tree)?
        };
        Ok(text)
    }
}
