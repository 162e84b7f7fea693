use super::{DataType, DescriptorError, LazyRef, Visited, first_visit, verify_data_type};
use crate::value::{EnumValue, FromValue, Message, Value, ValueError, downcast_mut, downcast_ref};
use std::collections::HashMap;
use std::fmt;
use std::ptr;
use std::sync::{Arc, OnceLock};

type Getter = Box<dyn Fn(&dyn Message) -> Option<Value> + Send + Sync>;
type Setter = Box<dyn Fn(&mut dyn Message, Value) -> Result<(), ValueError> + Send + Sync>;
type Factory = fn() -> Box<dyn Message>;
type SubtypeProvider = fn() -> &'static MessageDescriptor;

/// Bound get/set functions for one field of a generated message.
pub struct FieldAccessor {
    getter: Getter,
    setter: Setter,
}

impl FieldAccessor {
    /// Binds a field stored as `Option<T>` on message `M`.
    ///
    /// The accessor also works on subtypes of `M`, which embed an `M` as their base.
    ///
    /// ```rust,ignore
    /// FieldAccessor::of(|h: &Human| &h.name, |h: &mut Human| &mut h.name)
    /// ```
    pub fn of<M, T>(get: fn(&M) -> &Option<T>, get_mut: fn(&mut M) -> &mut Option<T>) -> Self
    where
        M: Message,
        T: Clone + Into<Value> + FromValue + 'static,
    {
        let getter = move |message: &dyn Message| -> Option<Value> {
            downcast_ref::<M>(message)
                .and_then(|message| get(message).clone())
                .map(Into::into)
        };

        let setter = move |message: &mut dyn Message, value: Value| -> Result<(), ValueError> {
            let actual = message.descriptor().name().to_owned();
            let target = downcast_mut::<M>(message).ok_or_else(|| ValueError::MessageMismatch {
                expected: std::any::type_name::<M>().to_owned(),
                actual,
            })?;
            *get_mut(target) = Some(T::from_value(value)?);
            Ok(())
        };

        Self {
            getter: Box::new(getter),
            setter: Box::new(setter),
        }
    }
}

/// A message field: its name, its (possibly lazy) type and its accessor.
pub struct FieldDescriptor {
    name: String,
    ty: LazyRef<DataType>,
    discriminator: bool,
    accessor: FieldAccessor,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, ty: DataType, accessor: FieldAccessor) -> Self {
        Self {
            name: name.into(),
            ty: LazyRef::Ready(ty),
            discriminator: false,
            accessor,
        }
    }

    /// A field whose type is resolved on first access, for self-referential messages.
    pub fn lazy(
        name: impl Into<String>,
        ty: fn() -> DataType,
        accessor: FieldAccessor,
    ) -> Self {
        Self {
            name: name.into(),
            ty: LazyRef::deferred(ty),
            discriminator: false,
            accessor,
        }
    }

    /// Marks this field as the discriminator of a polymorphic hierarchy.
    pub fn discriminator(mut self) -> Self {
        self.discriminator = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &DataType {
        self.ty.get()
    }

    pub fn is_discriminator(&self) -> bool {
        self.discriminator
    }

    pub fn get(&self, message: &dyn Message) -> Option<Value> {
        (self.accessor.getter)(message)
    }

    pub fn set(&self, message: &mut dyn Message, value: Value) -> Result<(), ValueError> {
        (self.accessor.setter)(message, value)
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("discriminator", &self.discriminator)
            .finish()
    }
}

#[derive(Default)]
struct SubtypeIndex {
    all: Vec<&'static MessageDescriptor>,
    by_value: HashMap<EnumValue, &'static MessageDescriptor>,
}

impl SubtypeIndex {
    fn build(root: &'static MessageDescriptor) -> Result<Self, DescriptorError> {
        let mut index = SubtypeIndex::default();

        for provider in &root.subtype_providers {
            let subtype = provider();
            index.insert(root, subtype)?;

            for &nested in subtype.subtypes()? {
                index.insert(root, nested)?;
            }
        }

        Ok(index)
    }

    fn insert(
        &mut self,
        root: &'static MessageDescriptor,
        subtype: &'static MessageDescriptor,
    ) -> Result<(), DescriptorError> {
        if self.all.iter().any(|known| ptr::eq(*known, subtype)) {
            return Ok(());
        }

        if ptr::eq(root, subtype) || !subtype.is_subtype_of(root) {
            return Err(DescriptorError::NotASubtype {
                message: root.name.clone(),
                subtype: subtype.name.clone(),
            });
        }

        let value = subtype
            .discriminator_value
            .ok_or_else(|| DescriptorError::MissingDiscriminatorValue(subtype.name.clone()))?;

        if let Some(existing) = self.by_value.insert(value, subtype) {
            return Err(DescriptorError::DuplicateDiscriminatorValue {
                value: value.name().to_owned(),
                first: existing.name.clone(),
                second: subtype.name.clone(),
            });
        }

        self.all.push(subtype);
        Ok(())
    }
}

/// A message type, possibly part of a polymorphic hierarchy.
///
/// Fields are ordered: the base's fields come first, in the base's own order, followed by the
/// fields this message declares.
pub struct MessageDescriptor {
    name: String,
    factory: Factory,
    base: Option<&'static MessageDescriptor>,
    declared_fields: Vec<Arc<FieldDescriptor>>,
    fields: Vec<Arc<FieldDescriptor>>,
    discriminator: Option<Arc<FieldDescriptor>>,
    discriminator_value: Option<EnumValue>,
    subtype_providers: Vec<SubtypeProvider>,
    subtypes: OnceLock<Result<SubtypeIndex, DescriptorError>>,
}

impl MessageDescriptor {
    pub fn builder(name: impl Into<String>) -> MessageDescriptorBuilder {
        MessageDescriptorBuilder {
            name: name.into(),
            factory: None,
            base: None,
            fields: Vec::new(),
            discriminator_value: None,
            subtypes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> Option<&'static MessageDescriptor> {
        self.base
    }

    /// The combined field list, base fields first.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().map(Arc::as_ref)
    }

    pub fn declared_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.declared_fields.iter().map(Arc::as_ref)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields().find(|field| field.name() == name)
    }

    pub fn discriminator(&self) -> Option<&FieldDescriptor> {
        self.discriminator.as_deref()
    }

    pub fn discriminator_value(&self) -> Option<EnumValue> {
        self.discriminator_value
    }

    pub fn is_polymorphic(&self) -> bool {
        self.discriminator.is_some()
    }

    /// True if `self` is `other` or extends it, directly or transitively.
    pub fn is_subtype_of(&self, other: &MessageDescriptor) -> bool {
        let mut current = Some(self);
        while let Some(descriptor) = current {
            if ptr::eq(descriptor, other) {
                return true;
            }
            current = descriptor.base;
        }
        false
    }

    pub fn new_instance(&self) -> Box<dyn Message> {
        (self.factory)()
    }

    /// Every registered subtype, including subtypes of subtypes.
    pub fn subtypes(&'static self) -> Result<&'static [&'static MessageDescriptor], DescriptorError> {
        Ok(&self.subtype_index()?.all)
    }

    /// Selects the descriptor to read a message with, given its discriminator value.
    ///
    /// Falls back to `self` when `value` is `None` or matches no registered subtype.
    pub fn get_subtype(
        &'static self,
        value: Option<&EnumValue>,
    ) -> Result<&'static MessageDescriptor, DescriptorError> {
        let Some(value) = value else {
            return Ok(self);
        };

        if self.discriminator_value.as_ref() == Some(value) {
            return Ok(self);
        }

        Ok(self
            .subtype_index()?
            .by_value
            .get(value)
            .copied()
            .unwrap_or(self))
    }

    /// Resolves every lazy type reachable from this message.
    pub fn verify(&'static self) -> Result<(), DescriptorError> {
        self.verify_with(&mut Visited::new())
    }

    pub(crate) fn verify_with(&'static self, visited: &mut Visited) -> Result<(), DescriptorError> {
        if !first_visit(visited, self) {
            return Ok(());
        }

        if let Some(base) = self.base {
            base.verify_with(visited)?;
        }

        for field in self.fields() {
            verify_data_type(field.ty(), visited)?;
        }

        for &subtype in self.subtypes()? {
            subtype.verify_with(visited)?;
        }

        Ok(())
    }

    fn subtype_index(&'static self) -> Result<&'static SubtypeIndex, DescriptorError> {
        self.subtypes
            .get_or_init(|| SubtypeIndex::build(self))
            .as_ref()
            .map_err(Clone::clone)
    }
}

impl PartialEq for MessageDescriptor {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self, other)
    }
}

impl fmt::Debug for MessageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MessageDescriptor").field(&self.name).finish()
    }
}

pub struct MessageDescriptorBuilder {
    name: String,
    factory: Option<Factory>,
    base: Option<&'static MessageDescriptor>,
    fields: Vec<FieldDescriptor>,
    discriminator_value: Option<EnumValue>,
    subtypes: Vec<SubtypeProvider>,
}

impl MessageDescriptorBuilder {
    pub fn factory(mut self, factory: Factory) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn base(mut self, base: &'static MessageDescriptor) -> Self {
        self.base = Some(base);
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// The value the hierarchy's discriminator field holds for this message.
    pub fn discriminator_value(mut self, value: impl Into<EnumValue>) -> Self {
        self.discriminator_value = Some(value.into());
        self
    }

    /// Registers a direct subtype. Its own subtypes are picked up transitively.
    pub fn subtype(mut self, provider: SubtypeProvider) -> Self {
        self.subtypes.push(provider);
        self
    }

    pub fn build(self) -> Result<MessageDescriptor, DescriptorError> {
        let name = self.name;
        let factory = self
            .factory
            .ok_or_else(|| DescriptorError::MissingFactory(name.clone()))?;

        let declared_fields: Vec<Arc<FieldDescriptor>> =
            self.fields.into_iter().map(Arc::new).collect();

        let mut fields: Vec<Arc<FieldDescriptor>> = self
            .base
            .map(|base| base.fields.clone())
            .unwrap_or_default();

        for field in &declared_fields {
            if fields.iter().any(|known| known.name() == field.name()) {
                return Err(DescriptorError::DuplicateField {
                    message: name,
                    field: field.name().to_owned(),
                });
            }
            fields.push(field.clone());
        }

        let mut discriminators = fields.iter().filter(|field| field.is_discriminator());
        let discriminator = discriminators.next().cloned();
        if discriminators.next().is_some() {
            return Err(DescriptorError::MultipleDiscriminators(name));
        }

        if let Some(field) = &discriminator {
            let DataType::Enum(expected) = field.ty() else {
                return Err(DescriptorError::DiscriminatorNotEnum {
                    message: name,
                    field: field.name().to_owned(),
                });
            };

            if let Some(value) = &self.discriminator_value
                && !ptr::eq(value.descriptor(), *expected)
            {
                return Err(DescriptorError::DiscriminatorValueMismatch {
                    message: name,
                    value: value.name().to_owned(),
                    expected: expected.name().to_owned(),
                });
            }
        } else if self.discriminator_value.is_some() {
            return Err(DescriptorError::DiscriminatorValueWithoutField(name));
        }

        Ok(MessageDescriptor {
            name,
            factory,
            base: self.base,
            declared_fields,
            fields,
            discriminator,
            discriminator_value: self.discriminator_value,
            subtype_providers: self.subtypes,
            subtypes: OnceLock::new(),
        })
    }
}
