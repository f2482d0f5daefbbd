#![allow(clippy::derive_partial_eq_without_eq)]
//! This crate provides typed records on top of DICOM data sets,
//! driven by data rather than by code:
//! each kind of data set item is described once,
//! and a single engine reads, writes and checks all of them.
//!
//! - A [`SchemaRegistry`] holds the definitions of attributes
//!   ([`AttributeSchema`]):
//!   tag, name, [kind of value](ValueKind),
//!   [multiplicity](Multiplicity) and [requirement](Requirement).
//!   Once frozen, it can be shared freely.
//! - A [`RecordDescriptor`] lists the attributes of one kind of record
//!   in processing order,
//!   with a nested descriptor for each sequence attribute.
//! - [`decode`], [`encode`] and [`validate`]
//!   convert between raw data sets and [`Record`]s,
//!   checking them against a descriptor.
//! - A [`RecordSequence`] holds the items of a sequence
//!   with a cursor for traversal.
//!
//! Raw data sets are reached through the [`DataSetHandle`] trait,
//! which is implemented for [`InMemDicomObject`](dicom_object::InMemDicomObject).
//!
//! # Example
//!
//! ```
//! use dicom_core::value::PrimitiveValue;
//! use dicom_core::{Tag, VR};
//! use dicom_object::InMemDicomObject;
//! use dicom_record::{
//!     decode, encode, AttributeSchema, DataSetHandle, DecodeErrorKind, RecordDescriptor,
//!     Requirement, ValueKind,
//! };
//!
//! # fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let descriptor = RecordDescriptor::builder("Counter")
//!     .attribute(
//!         AttributeSchema::new(Tag(0x0009, 0x1001), "Count", ValueKind::IntegerString)
//!             .with_requirement(Requirement::Required),
//!     )
//!     .attribute(AttributeSchema::new(Tag(0x0009, 0x1002), "Label", ValueKind::LongString))
//!     .build()?;
//!
//! let mut obj = InMemDicomObject::new_empty();
//! obj.insert_primitive(Tag(0x0009, 0x1001), VR::IS, PrimitiveValue::from("5"))?;
//!
//! let record = decode(&descriptor, &obj)?;
//! assert_eq!(record.get_as::<i32>(Tag(0x0009, 0x1001))?, 5);
//! assert_eq!(record.get_opt_as::<String>(Tag(0x0009, 0x1002))?, None);
//!
//! // encode back into a new data set
//! let copy: InMemDicomObject = encode(&descriptor, &record)?;
//! assert_eq!(decode(&descriptor, &copy)?, record);
//!
//! // a missing required attribute is an error
//! let err = decode(&descriptor, &InMemDicomObject::new_empty()).unwrap_err();
//! assert_eq!(err.kind(), DecodeErrorKind::MissingRequiredAttribute);
//! # Ok(())
//! # }
//! # run().unwrap();
//! ```
pub mod dataset;
pub mod decode;
pub mod descriptor;
pub mod encode;
pub mod record;
pub mod registry;
pub mod schema;
pub mod sequence;
pub mod validate;
pub mod value;

pub use crate::dataset::{CoerceError, DataSetHandle, ElementHandle};
pub use crate::decode::{decode, Conformance, DecodeError, DecodeErrorKind, DecodeOptions};
pub use crate::descriptor::{DescriptorError, RecordDescriptor, RecordDescriptorBuilder};
pub use crate::encode::{encode, encode_into, EncodeError, EncodeErrorKind};
pub use crate::record::{AccessError, Record};
pub use crate::registry::{
    FrozenSchemaRegistry, Registration, RegistryError, SchemaLookup, SchemaRegistry,
};
pub use crate::schema::{
    AttributeProbe, AttributeSchema, Condition, Multiplicity, Presence, Requirement,
    SchemaCodeError, ValueKind,
};
pub use crate::sequence::{Cursor, CursorError, RecordSequence};
pub use crate::validate::{validate, IssueKind, ValidationIssue};
pub use crate::value::{AttributeValue, FromAttributeValue, ValueAccessError};
