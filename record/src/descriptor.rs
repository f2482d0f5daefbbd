//! Record descriptors:
//! the ordered list of attributes which make up a kind of record,
//! with a nested descriptor for each sequence attribute.
//!
//! Descriptors are immutable once built,
//! and are meant to be shared behind an [`Arc`].

use crate::registry::SchemaLookup;
use crate::schema::{AttributeSchema, Multiplicity, Requirement};
use dicom_core::Tag;
use snafu::{ensure, Backtrace, Snafu};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// An error raised when a record descriptor is inconsistent.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum DescriptorError {
    /// A sequence attribute has no nested descriptor
    #[snafu(display(
        "{}: sequence attribute {} ({}) has no nested descriptor",
        descriptor,
        tag,
        name
    ))]
    MissingNestedDescriptor {
        descriptor: String,
        tag: Tag,
        name: String,
        backtrace: Backtrace,
    },
    /// A nested descriptor was given for an attribute which is not a sequence
    #[snafu(display("{}: attribute {} is not a sequence of this record", descriptor, tag))]
    UnexpectedNestedDescriptor {
        descriptor: String,
        tag: Tag,
        backtrace: Backtrace,
    },
    /// The multiplicity bounds admit no value count
    #[snafu(display(
        "{}: attribute {} has inconsistent multiplicity {}",
        descriptor,
        tag,
        multiplicity
    ))]
    InconsistentMultiplicity {
        descriptor: String,
        tag: Tag,
        multiplicity: Multiplicity,
        backtrace: Backtrace,
    },
    /// The same attribute was declared more than once
    #[snafu(display("{}: attribute {} is declared more than once", descriptor, tag))]
    DuplicateAttribute {
        descriptor: String,
        tag: Tag,
        backtrace: Backtrace,
    },
    /// The attribute is not in the schema registry
    #[snafu(display("{}: attribute {} is not registered", descriptor, tag))]
    UnregisteredAttribute {
        descriptor: String,
        tag: Tag,
        backtrace: Backtrace,
    },
}

/// The description of one kind of record:
/// which attributes it holds, in which order,
/// and how the items of its sequences are described.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDescriptor {
    name: Cow<'static, str>,
    attributes: Vec<AttributeSchema>,
    nested: HashMap<Tag, Arc<RecordDescriptor>>,
}

impl RecordDescriptor {
    /// Create a record descriptor,
    /// checking that it is consistent.
    ///
    /// `nested` must hold exactly one descriptor
    /// for each sequence attribute in `attributes`.
    pub fn describe<I>(
        name: impl Into<Cow<'static, str>>,
        attributes: Vec<AttributeSchema>,
        nested: I,
    ) -> Result<Self, DescriptorError>
    where
        I: IntoIterator<Item = (Tag, Arc<RecordDescriptor>)>,
    {
        let name = name.into();
        let nested: HashMap<_, _> = nested.into_iter().collect();

        let mut seen = HashSet::with_capacity(attributes.len());
        for schema in &attributes {
            let tag = schema.tag();
            ensure!(
                seen.insert(tag),
                DuplicateAttributeSnafu {
                    descriptor: &*name,
                    tag
                }
            );
            ensure!(
                schema.multiplicity().is_consistent(),
                InconsistentMultiplicitySnafu {
                    descriptor: &*name,
                    tag,
                    multiplicity: schema.multiplicity(),
                }
            );
            if schema.kind().is_sequence() {
                ensure!(
                    nested.contains_key(&tag),
                    MissingNestedDescriptorSnafu {
                        descriptor: &*name,
                        tag,
                        name: schema.name(),
                    }
                );
            }
        }

        for tag in nested.keys() {
            let is_sequence = attributes
                .iter()
                .any(|schema| schema.tag() == *tag && schema.kind().is_sequence());
            ensure!(
                is_sequence,
                UnexpectedNestedDescriptorSnafu {
                    descriptor: &*name,
                    tag: *tag,
                }
            );
        }

        Ok(RecordDescriptor {
            name,
            attributes,
            nested,
        })
    }

    /// Start building a record descriptor with the given name.
    pub fn builder(name: impl Into<Cow<'static, str>>) -> RecordDescriptorBuilder {
        RecordDescriptorBuilder {
            name: name.into(),
            attributes: Vec::new(),
            nested: Vec::new(),
            unresolved: None,
        }
    }

    /// The name of this kind of record.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The attributes in processing order.
    pub fn attributes(&self) -> &[AttributeSchema] {
        &self.attributes
    }

    /// The definition of the attribute with the given tag.
    pub fn attribute(&self, tag: Tag) -> Option<&AttributeSchema> {
        self.attributes.iter().find(|schema| schema.tag() == tag)
    }

    /// The descriptor of the items of the sequence attribute
    /// with the given tag.
    pub fn nested(&self, tag: Tag) -> Option<&Arc<RecordDescriptor>> {
        self.nested.get(&tag)
    }

    /// The number of attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Whether the record has no attributes.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// A builder for a [`RecordDescriptor`].
///
/// Problems are only reported on [`build`](RecordDescriptorBuilder::build).
///
/// # Example
///
/// ```
/// # use dicom_record::{AttributeSchema, RecordDescriptor, Requirement, ValueKind};
/// # use dicom_core::Tag;
/// let item = RecordDescriptor::builder("Item")
///     .attribute(AttributeSchema::new(Tag(0x0009, 0x1010), "Name", ValueKind::LongString))
///     .build()?;
/// let record = RecordDescriptor::builder("Record")
///     .attribute(
///         AttributeSchema::new(Tag(0x0009, 0x1001), "Count", ValueKind::IntegerString)
///             .with_requirement(Requirement::Required),
///     )
///     .sequence(
///         AttributeSchema::new(Tag(0x0009, 0x1002), "Items", ValueKind::Sequence),
///         item,
///     )
///     .build()?;
/// assert_eq!(record.len(), 2);
/// assert_eq!(record.nested(Tag(0x0009, 0x1002)).map(|d| d.name()), Some("Item"));
/// # Ok::<_, dicom_record::DescriptorError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RecordDescriptorBuilder {
    name: Cow<'static, str>,
    attributes: Vec<AttributeSchema>,
    nested: Vec<(Tag, Arc<RecordDescriptor>)>,
    /// the first attribute not found in a registry
    unresolved: Option<Tag>,
}

impl RecordDescriptorBuilder {
    /// Append an attribute.
    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.push(schema);
        self
    }

    /// Append a sequence attribute
    /// along with the descriptor of its items.
    pub fn sequence(
        mut self,
        schema: AttributeSchema,
        nested: impl Into<Arc<RecordDescriptor>>,
    ) -> Self {
        self.nested.push((schema.tag(), nested.into()));
        self.attributes.push(schema);
        self
    }

    /// Append an attribute defined in a registry,
    /// with the requirement it has in this record.
    pub fn registered<L>(mut self, registry: &L, tag: Tag, requirement: Requirement) -> Self
    where
        L: SchemaLookup + ?Sized,
    {
        match registry.lookup(tag) {
            Some(schema) => {
                self.attributes
                    .push(schema.clone().with_requirement(requirement));
            }
            None => {
                self.unresolved.get_or_insert(tag);
            }
        }
        self
    }

    /// Append a sequence attribute defined in a registry,
    /// with the requirement it has in this record
    /// and the descriptor of its items.
    pub fn registered_sequence<L>(
        self,
        registry: &L,
        tag: Tag,
        requirement: Requirement,
        nested: impl Into<Arc<RecordDescriptor>>,
    ) -> Self
    where
        L: SchemaLookup + ?Sized,
    {
        let mut builder = self.registered(registry, tag, requirement);
        builder.nested.push((tag, nested.into()));
        builder
    }

    /// Build the record descriptor.
    pub fn build(self) -> Result<RecordDescriptor, DescriptorError> {
        if let Some(tag) = self.unresolved {
            return UnregisteredAttributeSnafu {
                descriptor: &*self.name,
                tag,
            }
            .fail();
        }
        RecordDescriptor::describe(self.name, self.attributes, self.nested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SchemaRegistry;
    use crate::schema::ValueKind;

    const COUNT: Tag = Tag(0x0009, 0x1001);
    const ITEMS: Tag = Tag(0x0009, 0x1002);
    const NAME: Tag = Tag(0x0009, 0x1010);

    fn item() -> Arc<RecordDescriptor> {
        Arc::new(
            RecordDescriptor::describe(
                "Item",
                vec![AttributeSchema::new(NAME, "Name", ValueKind::LongString)],
                [],
            )
            .unwrap(),
        )
    }

    #[test]
    fn attribute_order_is_kept() {
        let descriptor = RecordDescriptor::describe(
            "Record",
            vec![
                AttributeSchema::new(ITEMS, "Items", ValueKind::Sequence),
                AttributeSchema::new(COUNT, "Count", ValueKind::IntegerString),
            ],
            [(ITEMS, item())],
        )
        .unwrap();
        let tags: Vec<_> = descriptor.attributes().iter().map(|a| a.tag()).collect();
        assert_eq!(tags, vec![ITEMS, COUNT]);
        assert_eq!(descriptor.attribute(COUNT).unwrap().name(), "Count");
        assert!(descriptor.nested(COUNT).is_none());
        assert_eq!(descriptor.nested(ITEMS).unwrap().name(), "Item");
    }

    #[test]
    fn inconsistent_descriptors() {
        let missing = RecordDescriptor::describe(
            "Record",
            vec![AttributeSchema::new(ITEMS, "Items", ValueKind::Sequence)],
            [],
        );
        assert!(matches!(
            missing,
            Err(DescriptorError::MissingNestedDescriptor { tag: ITEMS, .. })
        ));

        let unexpected = RecordDescriptor::describe(
            "Record",
            vec![AttributeSchema::new(COUNT, "Count", ValueKind::IntegerString)],
            [(COUNT, item())],
        );
        assert!(matches!(
            unexpected,
            Err(DescriptorError::UnexpectedNestedDescriptor { tag: COUNT, .. })
        ));

        let bad_vm = RecordDescriptor::describe(
            "Record",
            vec![AttributeSchema::new(COUNT, "Count", ValueKind::IntegerString)
                .with_multiplicity(Multiplicity::range(3, 2))],
            [],
        );
        assert!(matches!(
            bad_vm,
            Err(DescriptorError::InconsistentMultiplicity { tag: COUNT, .. })
        ));

        let duplicate = RecordDescriptor::describe(
            "Record",
            vec![
                AttributeSchema::new(COUNT, "Count", ValueKind::IntegerString),
                AttributeSchema::new(COUNT, "Count", ValueKind::IntegerString),
            ],
            [],
        );
        assert!(matches!(
            duplicate,
            Err(DescriptorError::DuplicateAttribute { tag: COUNT, .. })
        ));
    }

    #[test]
    fn build_from_registry() {
        let mut registry = SchemaRegistry::new();
        registry
            .register(AttributeSchema::new(COUNT, "Count", ValueKind::IntegerString))
            .unwrap();
        registry
            .register(AttributeSchema::new(ITEMS, "Items", ValueKind::Sequence))
            .unwrap();
        let registry = registry.freeze();

        let descriptor = RecordDescriptor::builder("Record")
            .registered(&registry, COUNT, Requirement::Required)
            .registered_sequence(&registry, ITEMS, Requirement::RequiredNullable, item())
            .build()
            .unwrap();
        assert_eq!(descriptor.len(), 2);
        assert_eq!(
            descriptor.attribute(COUNT).unwrap().requirement(),
            &Requirement::Required
        );
        // the registry keeps its own definition
        assert_eq!(
            registry.lookup(COUNT).unwrap().requirement(),
            &Requirement::Optional
        );

        let unresolved = RecordDescriptor::builder("Record")
            .registered(&registry, NAME, Requirement::Required)
            .registered(&registry, COUNT, Requirement::Required)
            .build();
        assert!(matches!(
            unresolved,
            Err(DescriptorError::UnregisteredAttribute { tag: NAME, .. })
        ));
    }
}
