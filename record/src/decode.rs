//! Decoding raw data sets into records.
//!
//! The decoder walks the attributes of a [`RecordDescriptor`] in order,
//! looks each of them up in the raw data set,
//! and coerces what it finds into the declared value kind.
//! Sequence attributes are decoded recursively
//! with the descriptor of their items.
//!
//! In [strict](Conformance::Strict) mode
//! the first problem found is returned as a [`DecodeError`].
//! In [lenient](Conformance::Lenient) mode
//! problems are logged as warnings and decoding carries on.

use crate::dataset::{CoerceError, DataSetHandle, ElementHandle, RawProbe, UnexpectedVrSnafu};
use crate::descriptor::RecordDescriptor;
use crate::record::Record;
use crate::schema::{AttributeSchema, Multiplicity, Presence, ValueKind};
use crate::sequence::RecordSequence;
use crate::value::AttributeValue;
use dicom_core::Tag;
use snafu::{Backtrace, ResultExt, Snafu};

/// The kind of a [`DecodeError`], for matching purposes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum DecodeErrorKind {
    /// A required attribute is not in the data set
    MissingRequiredAttribute,
    /// The number of values is not admitted by the attribute
    MultiplicityViolation,
    /// The value cannot be read as the declared kind
    TypeMismatch,
    /// An item of a sequence could not be decoded
    MalformedSequence,
}

/// An error raised when decoding a record.
///
/// Every variant carries the tag and name of the offending attribute
/// and its path from the root record,
/// such as `BeamSequence[0].ControlPointSequence`.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum DecodeError {
    /// A required attribute is not in the data set
    #[snafu(display("{}: required attribute {} is missing", path, tag))]
    MissingRequiredAttribute {
        tag: Tag,
        name: String,
        path: String,
        backtrace: Backtrace,
    },
    /// The number of values or items is not admitted
    #[snafu(display(
        "{}: attribute {} has {} value(s), but multiplicity is {}",
        path,
        tag,
        count,
        expected
    ))]
    MultiplicityViolation {
        tag: Tag,
        name: String,
        path: String,
        count: u32,
        expected: Multiplicity,
        backtrace: Backtrace,
    },
    /// The value cannot be read as the declared kind
    #[snafu(display("{}: attribute {} is not a valid {}", path, tag, expected))]
    TypeMismatch {
        tag: Tag,
        name: String,
        path: String,
        expected: ValueKind,
        #[snafu(backtrace)]
        source: CoerceError,
    },
    /// An item of a sequence could not be decoded
    #[snafu(display("{}: could not decode item #{} of sequence {}", path, index, tag))]
    MalformedSequence {
        tag: Tag,
        name: String,
        path: String,
        index: usize,
        #[snafu(source(from(DecodeError, Box::new)))]
        source: Box<DecodeError>,
        backtrace: Backtrace,
    },
}

impl DecodeError {
    /// The kind of error.
    pub fn kind(&self) -> DecodeErrorKind {
        match self {
            DecodeError::MissingRequiredAttribute { .. } => {
                DecodeErrorKind::MissingRequiredAttribute
            }
            DecodeError::MultiplicityViolation { .. } => DecodeErrorKind::MultiplicityViolation,
            DecodeError::TypeMismatch { .. } => DecodeErrorKind::TypeMismatch,
            DecodeError::MalformedSequence { .. } => DecodeErrorKind::MalformedSequence,
        }
    }

    /// The tag of the offending attribute.
    pub fn tag(&self) -> Tag {
        match self {
            DecodeError::MissingRequiredAttribute { tag, .. }
            | DecodeError::MultiplicityViolation { tag, .. }
            | DecodeError::TypeMismatch { tag, .. }
            | DecodeError::MalformedSequence { tag, .. } => *tag,
        }
    }

    /// The path of the offending attribute from the root record.
    pub fn path(&self) -> &str {
        match self {
            DecodeError::MissingRequiredAttribute { path, .. }
            | DecodeError::MultiplicityViolation { path, .. }
            | DecodeError::TypeMismatch { path, .. }
            | DecodeError::MalformedSequence { path, .. } => path,
        }
    }

    /// The error at the bottom of a chain of malformed sequences.
    pub fn innermost(&self) -> &DecodeError {
        let mut error = self;
        while let DecodeError::MalformedSequence { source, .. } = error {
            error = source.as_ref();
        }
        error
    }
}

/// How strictly data sets are checked against the descriptor.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Conformance {
    /// Fail on the first problem.
    #[default]
    Strict,
    /// Log problems as warnings and keep going.
    ///
    /// Missing attributes stay absent,
    /// values with an unexpected number of values are kept,
    /// and values of the wrong type are skipped.
    Lenient,
}

/// Options for decoding records.
///
/// # Example
///
/// ```no_run
/// # use dicom_record::{DecodeError, DecodeOptions, RecordDescriptor};
/// # use dicom_object::InMemDicomObject;
/// # fn run(descriptor: &RecordDescriptor, obj: &InMemDicomObject) -> Result<(), DecodeError> {
/// let record = DecodeOptions::new().lenient().decode(descriptor, obj)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default, Clone)]
#[non_exhaustive]
pub struct DecodeOptions {
    /// how to react to non-conformant data
    pub conformance: Conformance,
}

impl DecodeOptions {
    /// Create decoding options with the defaults (strict decoding).
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail on the first problem.
    pub fn strict(mut self) -> Self {
        self.conformance = Conformance::Strict;
        self
    }

    /// Log problems as warnings instead of failing.
    pub fn lenient(mut self) -> Self {
        self.conformance = Conformance::Lenient;
        self
    }

    /// Set the conformance mode.
    pub fn conformance(mut self, conformance: Conformance) -> Self {
        self.conformance = conformance;
        self
    }

    /// Decode a record from a raw data set.
    pub fn decode<H>(
        &self,
        descriptor: &RecordDescriptor,
        dataset: &H,
    ) -> Result<Record, DecodeError>
    where
        H: DataSetHandle,
    {
        tracing::debug!("Decoding {} record", descriptor.name());
        self.decode_item(descriptor, dataset, "")
    }

    fn decode_item<H>(
        &self,
        descriptor: &RecordDescriptor,
        dataset: &H,
        path: &str,
    ) -> Result<Record, DecodeError>
    where
        H: DataSetHandle,
    {
        let probe = RawProbe(dataset);
        let mut record = Record::new();

        for schema in descriptor.attributes() {
            let tag = schema.tag();
            let attribute_path = child_path(path, schema.name());
            let presence = schema.requirement().resolve(&probe);

            let Some(element) = dataset.find_element(tag) else {
                if presence.is_required() {
                    self.report(
                        MissingRequiredAttributeSnafu {
                            tag,
                            name: schema.name(),
                            path: &attribute_path,
                        }
                        .build(),
                    )?;
                }
                continue;
            };

            let value = match (schema.kind(), descriptor.nested(tag)) {
                (ValueKind::Sequence, Some(nested)) => {
                    let Some(items) = element.sequence_items() else {
                        let source = UnexpectedVrSnafu {
                            expected: ValueKind::Sequence.vr(),
                            got: element.vr(),
                        }
                        .build();
                        self.report(type_mismatch(schema, &attribute_path, source))?;
                        continue;
                    };
                    self.check_multiplicity(schema, presence, items.len() as u32, &attribute_path)?;

                    let mut sequence = RecordSequence::new();
                    for (index, item) in items.iter().enumerate() {
                        let item_path = format!("{}[{}]", attribute_path, index);
                        let item_record = self
                            .decode_item(nested, item, &item_path)
                            .context(MalformedSequenceSnafu {
                                tag,
                                name: schema.name(),
                                path: &attribute_path,
                                index,
                            })?;
                        sequence.append(item_record);
                    }
                    AttributeValue::Sequence(sequence)
                }
                (kind, _) => match element.vector(kind) {
                    Ok(value) => {
                        self.check_multiplicity(
                            schema,
                            presence,
                            value.multiplicity(),
                            &attribute_path,
                        )?;
                        value
                    }
                    Err(source) => {
                        self.report(type_mismatch(schema, &attribute_path, source))?;
                        continue;
                    }
                },
            };
            record.set(tag, value);
        }

        Ok(record)
    }

    /// Check the number of values or items of a present attribute.
    ///
    /// An empty value is admitted whenever the attribute may be empty,
    /// regardless of its multiplicity.
    fn check_multiplicity(
        &self,
        schema: &AttributeSchema,
        presence: Presence,
        count: u32,
        path: &str,
    ) -> Result<(), DecodeError> {
        let admitted = if count == 0 {
            presence.admits_empty()
        } else {
            schema.multiplicity().admits(count)
        };
        if admitted {
            return Ok(());
        }
        self.report(
            MultiplicityViolationSnafu {
                tag: schema.tag(),
                name: schema.name(),
                path,
                count,
                expected: schema.multiplicity(),
            }
            .build(),
        )
    }

    /// Fail with the given error in strict mode,
    /// or log it in lenient mode.
    fn report(&self, error: DecodeError) -> Result<(), DecodeError> {
        match self.conformance {
            Conformance::Strict => Err(error),
            Conformance::Lenient => {
                tracing::warn!("{}", error);
                Ok(())
            }
        }
    }
}

fn type_mismatch(schema: &AttributeSchema, path: &str, source: CoerceError) -> DecodeError {
    DecodeError::TypeMismatch {
        tag: schema.tag(),
        name: schema.name().to_string(),
        path: path.to_string(),
        expected: schema.kind(),
        source,
    }
}

/// Append an attribute name to the path of its parent.
pub(crate) fn child_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

/// Decode a record from a raw data set, with default options.
///
/// See [`DecodeOptions`] for decoding leniently.
pub fn decode<H>(descriptor: &RecordDescriptor, dataset: &H) -> Result<Record, DecodeError>
where
    H: DataSetHandle,
{
    DecodeOptions::new().decode(descriptor, dataset)
}
