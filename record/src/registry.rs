//! The schema registry:
//! the table of attribute definitions from which descriptors are composed.
//!
//! Attributes are registered into a [`SchemaRegistry`] once,
//! which is then [frozen](SchemaRegistry::freeze)
//! into a [`FrozenSchemaRegistry`] that only serves lookups.
//! The frozen registry is cheap to clone
//! and can be shared across threads without synchronization.
//!
//! ```
//! # use dicom_record::{AttributeSchema, Registration, SchemaLookup, SchemaRegistry, ValueKind};
//! # use dicom_core::Tag;
//! let mut registry = SchemaRegistry::new();
//! let count = AttributeSchema::from_codes(
//!     Tag(0x0009, 0x1001),
//!     "Count",
//!     ValueKind::IntegerString,
//!     "1",
//!     "1",
//! )?;
//! assert_eq!(registry.register(count.clone())?, Registration::Inserted);
//! assert_eq!(registry.register(count)?, Registration::AlreadyRegistered);
//!
//! let registry = registry.freeze();
//! assert_eq!(registry.lookup_by_name("Count").map(|s| s.tag()), Some(Tag(0x0009, 0x1001)));
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```

use crate::schema::{AttributeSchema, SchemaCodeError};
use dicom_core::Tag;
use snafu::{ensure, Backtrace, ResultExt, Snafu};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// An error raised when registering attribute definitions.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum RegistryError {
    /// A different definition is already registered for this tag
    #[snafu(display("Attribute {} is already registered as `{}`", tag, existing))]
    DuplicateKey {
        tag: Tag,
        existing: String,
        backtrace: Backtrace,
    },
    /// The name is already bound to another attribute
    #[snafu(display("Attribute name `{}` is already bound to {}", name, existing))]
    DuplicateName {
        name: String,
        existing: Tag,
        backtrace: Backtrace,
    },
    /// Could not build a definition from the standard dictionary
    #[snafu(display("Could not derive a definition for attribute {}", tag))]
    StandardDefinition {
        tag: Tag,
        #[snafu(backtrace)]
        source: SchemaCodeError,
    },
}

/// The outcome of a successful registration.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Registration {
    /// The definition was added to the registry
    Inserted,
    /// The very same definition was already in the registry
    AlreadyRegistered,
}

/// Read access to a table of attribute definitions.
pub trait SchemaLookup {
    /// Find the definition of an attribute by tag.
    fn lookup(&self, tag: Tag) -> Option<&AttributeSchema>;

    /// Find the definition of an attribute by name.
    fn lookup_by_name(&self, name: &str) -> Option<&AttributeSchema>;
}

impl<L: SchemaLookup + ?Sized> SchemaLookup for &L {
    fn lookup(&self, tag: Tag) -> Option<&AttributeSchema> {
        (**self).lookup(tag)
    }

    fn lookup_by_name(&self, name: &str) -> Option<&AttributeSchema> {
        (**self).lookup_by_name(name)
    }
}

#[derive(Debug, Default)]
struct SchemaTable {
    by_tag: BTreeMap<Tag, AttributeSchema>,
    by_name: HashMap<String, Tag>,
}

impl SchemaTable {
    fn lookup(&self, tag: Tag) -> Option<&AttributeSchema> {
        self.by_tag.get(&tag)
    }

    fn lookup_by_name(&self, name: &str) -> Option<&AttributeSchema> {
        self.by_name.get(name).and_then(|tag| self.by_tag.get(tag))
    }
}

/// A registry of attribute definitions under construction.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    table: SchemaTable,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of registered definitions.
    pub fn len(&self) -> usize {
        self.table.by_tag.len()
    }

    /// Whether no definitions were registered.
    pub fn is_empty(&self) -> bool {
        self.table.by_tag.is_empty()
    }

    /// Register an attribute definition.
    ///
    /// Registering the same definition twice is not an error.
    /// Registering a different definition under a tag already taken
    /// fails with [`DuplicateKey`](RegistryError::DuplicateKey),
    /// and reusing a name of another tag
    /// fails with [`DuplicateName`](RegistryError::DuplicateName).
    /// The registry is left unchanged on failure.
    pub fn register(&mut self, schema: AttributeSchema) -> Result<Registration, RegistryError> {
        let tag = schema.tag();
        if let Some(existing) = self.table.by_tag.get(&tag) {
            ensure!(
                *existing == schema,
                DuplicateKeySnafu {
                    tag,
                    existing: existing.to_string(),
                }
            );
            return Ok(Registration::AlreadyRegistered);
        }
        if let Some(existing) = self.table.by_name.get(schema.name()) {
            return DuplicateNameSnafu {
                name: schema.name(),
                existing: *existing,
            }
            .fail();
        }

        tracing::trace!("Registered attribute {}", schema);
        self.table.by_name.insert(schema.name().to_string(), tag);
        self.table.by_tag.insert(tag, schema);
        Ok(Registration::Inserted)
    }

    /// Register a sequence of attribute definitions,
    /// stopping at the first failure.
    pub fn register_all<I>(&mut self, schemas: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = AttributeSchema>,
    {
        for schema in schemas {
            self.register(schema)?;
        }
        Ok(())
    }

    /// Register an attribute with the name and value kind
    /// of its entry in the standard data dictionary,
    /// plus the given multiplicity and type codes.
    pub fn register_standard(
        &mut self,
        tag: Tag,
        vm: &str,
        type_code: &str,
    ) -> Result<Registration, RegistryError> {
        let schema = AttributeSchema::from_dictionary(tag, vm, type_code)
            .context(StandardDefinitionSnafu { tag })?;
        self.register(schema)
    }

    /// Turn this registry into an immutable one
    /// which can be shared freely.
    pub fn freeze(self) -> FrozenSchemaRegistry {
        FrozenSchemaRegistry {
            table: Arc::new(self.table),
        }
    }
}

impl SchemaLookup for SchemaRegistry {
    fn lookup(&self, tag: Tag) -> Option<&AttributeSchema> {
        self.table.lookup(tag)
    }

    fn lookup_by_name(&self, name: &str) -> Option<&AttributeSchema> {
        self.table.lookup_by_name(name)
    }
}

/// An immutable registry of attribute definitions.
///
/// Clones share the same table.
#[derive(Debug, Clone)]
pub struct FrozenSchemaRegistry {
    table: Arc<SchemaTable>,
}

impl FrozenSchemaRegistry {
    /// The number of registered definitions.
    pub fn len(&self) -> usize {
        self.table.by_tag.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.table.by_tag.is_empty()
    }

    /// Iterate over all definitions in ascending tag order.
    pub fn iter(&self) -> impl Iterator<Item = &AttributeSchema> + '_ {
        self.table.by_tag.values()
    }
}

impl SchemaLookup for FrozenSchemaRegistry {
    fn lookup(&self, tag: Tag) -> Option<&AttributeSchema> {
        self.table.lookup(tag)
    }

    fn lookup_by_name(&self, name: &str) -> Option<&AttributeSchema> {
        self.table.lookup_by_name(name)
    }
}
