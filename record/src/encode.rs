//! Encoding records into raw data sets.
//!
//! Attributes are written in descriptor order.
//! Absent attributes are written as empty elements
//! when they must be present but may be empty (type 2),
//! and empty sequences are omitted unless they have to be there.

use crate::dataset::DataSetHandle;
use crate::decode::child_path;
use crate::descriptor::RecordDescriptor;
use crate::record::Record;
use crate::schema::{AttributeSchema, Presence, ValueKind};
use crate::sequence::RecordSequence;
use crate::value::AttributeValue;
use dicom_core::value::PrimitiveValue;
use dicom_core::{Tag, VR};
use snafu::{Backtrace, ResultExt, Snafu};

type DynError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The kind of an [`EncodeError`], for matching purposes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum EncodeErrorKind {
    /// A required attribute is not in the record
    RequiredAttributeAbsent,
    /// A required sequence has no items
    EmptySequenceNotAllowed,
    /// The value does not fit the declared kind
    ValueKindMismatch,
    /// An item of a sequence could not be encoded
    InvalidSequenceItem,
    /// The data set refused an element
    InsertElement,
}

/// An error raised when encoding a record.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum EncodeError {
    /// A required attribute is not in the record
    #[snafu(display("{}: required attribute {} is absent", path, tag))]
    RequiredAttributeAbsent {
        tag: Tag,
        name: String,
        path: String,
        backtrace: Backtrace,
    },
    /// A required sequence has no items
    #[snafu(display("{}: required sequence {} has no items", path, tag))]
    EmptySequenceNotAllowed {
        tag: Tag,
        name: String,
        path: String,
        backtrace: Backtrace,
    },
    /// The value does not fit the declared kind
    #[snafu(display("{}: attribute {} is a {}, but holds a {} value", path, tag, expected, got))]
    ValueKindMismatch {
        tag: Tag,
        name: String,
        path: String,
        expected: ValueKind,
        got: &'static str,
        backtrace: Backtrace,
    },
    /// An item of a sequence could not be encoded
    #[snafu(display("{}: could not encode item #{} of sequence {}", path, index, tag))]
    InvalidSequenceItem {
        tag: Tag,
        name: String,
        path: String,
        index: usize,
        #[snafu(source(from(EncodeError, Box::new)))]
        source: Box<EncodeError>,
        backtrace: Backtrace,
    },
    /// The data set refused an element
    #[snafu(display("{}: could not put element {}", path, tag))]
    InsertElement {
        tag: Tag,
        path: String,
        source: DynError,
        backtrace: Backtrace,
    },
}

impl EncodeError {
    /// The kind of error.
    pub fn kind(&self) -> EncodeErrorKind {
        match self {
            EncodeError::RequiredAttributeAbsent { .. } => EncodeErrorKind::RequiredAttributeAbsent,
            EncodeError::EmptySequenceNotAllowed { .. } => EncodeErrorKind::EmptySequenceNotAllowed,
            EncodeError::ValueKindMismatch { .. } => EncodeErrorKind::ValueKindMismatch,
            EncodeError::InvalidSequenceItem { .. } => EncodeErrorKind::InvalidSequenceItem,
            EncodeError::InsertElement { .. } => EncodeErrorKind::InsertElement,
        }
    }

    /// The tag of the offending attribute.
    pub fn tag(&self) -> Tag {
        match self {
            EncodeError::RequiredAttributeAbsent { tag, .. }
            | EncodeError::EmptySequenceNotAllowed { tag, .. }
            | EncodeError::ValueKindMismatch { tag, .. }
            | EncodeError::InvalidSequenceItem { tag, .. }
            | EncodeError::InsertElement { tag, .. } => *tag,
        }
    }

    /// The error at the bottom of a chain of invalid sequence items.
    pub fn innermost(&self) -> &EncodeError {
        let mut error = self;
        while let EncodeError::InvalidSequenceItem { source, .. } = error {
            error = source.as_ref();
        }
        error
    }
}

/// Encode a record into a new raw data set.
pub fn encode<H>(descriptor: &RecordDescriptor, record: &Record) -> Result<H, EncodeError>
where
    H: DataSetHandle,
{
    let mut dataset = H::new_item();
    encode_into(descriptor, record, &mut dataset)?;
    Ok(dataset)
}

/// Encode a record into an existing raw data set,
/// replacing the elements it describes.
///
/// Elements not described by the descriptor are left untouched.
pub fn encode_into<H>(
    descriptor: &RecordDescriptor,
    record: &Record,
    dataset: &mut H,
) -> Result<(), EncodeError>
where
    H: DataSetHandle,
{
    tracing::debug!("Encoding {} record", descriptor.name());
    encode_item(descriptor, record, dataset, "")
}

fn encode_item<H>(
    descriptor: &RecordDescriptor,
    record: &Record,
    dataset: &mut H,
    path: &str,
) -> Result<(), EncodeError>
where
    H: DataSetHandle,
{
    for tag in record.tags() {
        if descriptor.attribute(tag).is_none() {
            tracing::warn!(
                "{}: attribute {} is not part of {}, not written",
                path,
                tag,
                descriptor.name()
            );
        }
    }

    for schema in descriptor.attributes() {
        let tag = schema.tag();
        let attribute_path = child_path(path, schema.name());
        let presence = schema.requirement().resolve(record);

        let Some(value) = record.get(tag) else {
            match presence {
                Presence::Required => {
                    return RequiredAttributeAbsentSnafu {
                        tag,
                        name: schema.name(),
                        path: attribute_path,
                    }
                    .fail();
                }
                Presence::RequiredNullable => {
                    // type 2 attributes are always written
                    if schema.kind().is_sequence() {
                        write_sequence(dataset, tag, Vec::new(), &attribute_path)?;
                    } else {
                        write_primitive(
                            dataset,
                            tag,
                            schema.kind().vr(),
                            PrimitiveValue::Empty,
                            &attribute_path,
                        )?;
                    }
                }
                Presence::Optional => {}
            }
            continue;
        };

        if !value.fits(schema.kind()) {
            return ValueKindMismatchSnafu {
                tag,
                name: schema.name(),
                path: attribute_path,
                expected: schema.kind(),
                got: value.type_name(),
            }
            .fail();
        }

        warn_on_multiplicity(schema, presence, value, &attribute_path);

        match (value, descriptor.nested(tag)) {
            (AttributeValue::Sequence(items), Some(nested)) => {
                if items.is_empty() {
                    match presence {
                        Presence::Required => {
                            return EmptySequenceNotAllowedSnafu {
                                tag,
                                name: schema.name(),
                                path: attribute_path,
                            }
                            .fail();
                        }
                        Presence::RequiredNullable => {
                            write_sequence(dataset, tag, Vec::new(), &attribute_path)?;
                        }
                        Presence::Optional => {
                            tracing::trace!(
                                "{}: empty optional sequence not written",
                                attribute_path
                            );
                        }
                    }
                    continue;
                }
                let encoded = encode_items::<H>(nested, items, schema, &attribute_path)?;
                write_sequence(dataset, tag, encoded, &attribute_path)?;
            }
            _ => {
                let primitive = to_primitive(value, schema.kind());
                write_primitive(dataset, tag, schema.kind().vr(), primitive, &attribute_path)?;
            }
        }
    }
    Ok(())
}

fn encode_items<H>(
    nested: &RecordDescriptor,
    items: &RecordSequence,
    schema: &AttributeSchema,
    path: &str,
) -> Result<Vec<H>, EncodeError>
where
    H: DataSetHandle,
{
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let mut dataset = H::new_item();
            encode_item(nested, item, &mut dataset, &format!("{}[{}]", path, index)).context(
                InvalidSequenceItemSnafu {
                    tag: schema.tag(),
                    name: schema.name(),
                    path,
                    index,
                },
            )?;
            Ok(dataset)
        })
        .collect()
}

fn warn_on_multiplicity(
    schema: &AttributeSchema,
    presence: Presence,
    value: &AttributeValue,
    path: &str,
) {
    let count = value.multiplicity();
    let admitted = if count == 0 {
        presence.admits_empty()
    } else {
        schema.multiplicity().admits(count)
    };
    if !admitted {
        tracing::warn!(
            "{}: attribute {} has {} value(s), but multiplicity is {}",
            path,
            schema.tag(),
            count,
            schema.multiplicity()
        );
    }
}

fn write_primitive<H>(
    dataset: &mut H,
    tag: Tag,
    vr: VR,
    value: PrimitiveValue,
    path: &str,
) -> Result<(), EncodeError>
where
    H: DataSetHandle,
{
    dataset
        .insert_primitive(tag, vr, value)
        .map_err(|e| Box::new(e) as DynError)
        .context(InsertElementSnafu { tag, path })
}

fn write_sequence<H>(
    dataset: &mut H,
    tag: Tag,
    items: Vec<H>,
    path: &str,
) -> Result<(), EncodeError>
where
    H: DataSetHandle,
{
    dataset
        .insert_sequence(tag, items)
        .map_err(|e| Box::new(e) as DynError)
        .context(InsertElementSnafu { tag, path })
}

/// Format a decimal string value,
/// preferring the shorter of plain and scientific notation.
pub(crate) fn format_decimal(value: f64) -> String {
    let plain = value.to_string();
    let scientific = format!("{:e}", value);
    if scientific.len() < plain.len() {
        scientific
    } else {
        plain
    }
}

/// Convert an attribute value into a primitive value
/// of the given kind's value representation.
///
/// The value must [fit](AttributeValue::fits) the kind.
pub(crate) fn to_primitive(value: &AttributeValue, kind: ValueKind) -> PrimitiveValue {
    if value.is_empty() {
        return PrimitiveValue::Empty;
    }
    match value {
        AttributeValue::Strs(c) => PrimitiveValue::Strs(c.clone()),
        AttributeValue::I32(c) if kind == ValueKind::IntegerString => {
            PrimitiveValue::Strs(c.iter().map(|v| v.to_string()).collect())
        }
        AttributeValue::I32(c) => PrimitiveValue::I32(c.clone()),
        AttributeValue::F64(c) if kind == ValueKind::DecimalString => {
            PrimitiveValue::Strs(c.iter().map(|v| format_decimal(*v)).collect())
        }
        AttributeValue::F64(c) => PrimitiveValue::F64(c.clone()),
        AttributeValue::F32(c) => PrimitiveValue::F32(c.clone()),
        AttributeValue::U16(c) => PrimitiveValue::U16(c.clone()),
        AttributeValue::I16(c) => PrimitiveValue::I16(c.clone()),
        AttributeValue::U32(c) => PrimitiveValue::U32(c.clone()),
        AttributeValue::Date(c) => PrimitiveValue::Date(c.clone()),
        AttributeValue::Time(c) => PrimitiveValue::Time(c.clone()),
        AttributeValue::Tags(c) => PrimitiveValue::Tags(c.clone()),
        AttributeValue::Sequence(_) => PrimitiveValue::Empty,
    }
}
