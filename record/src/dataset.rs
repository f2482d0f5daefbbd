//! The boundary between records and raw DICOM data sets.
//!
//! The codec only needs a handful of operations from a data set,
//! expressed by the traits [`DataSetHandle`] and [`ElementHandle`].
//! Both are implemented for [`InMemDicomObject`] and its elements,
//! so anything which DICOM-rs can read or write can be decoded and encoded.
//!
//! This module also holds the coercion of primitive values
//! into the [value kind](ValueKind) declared for an attribute.

use crate::schema::{AttributeProbe, ValueKind};
use crate::value::AttributeValue;
use dicom_core::dictionary::DataDictionary;
use dicom_core::value::{ConvertValueError, DataSetSequence, DicomValueType, PrimitiveValue, C};
use dicom_core::{DataElement, Tag, VR};
use dicom_object::mem::InMemElement;
use dicom_object::InMemDicomObject;
use snafu::{ensure, Backtrace, OptionExt, ResultExt, Snafu};
use std::convert::Infallible;

/// An error which may occur when coercing a raw element value
/// into a declared value kind.
#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub(crate)))]
pub enum CoerceError {
    /// The element's value representation does not match the declared kind
    #[snafu(display("Expected VR {:?}, but element has VR {:?}", expected, got))]
    UnexpectedVr {
        expected: VR,
        got: VR,
        backtrace: Backtrace,
    },
    /// The element does not hold a primitive value
    #[snafu(display("Element with VR {:?} does not hold a primitive value", vr))]
    NotPrimitive { vr: VR, backtrace: Backtrace },
    /// Sequence items were requested as plain values
    #[snafu(display("Sequence items cannot be retrieved as values"))]
    SequenceKind { backtrace: Backtrace },
    /// A text value is not a valid integer
    #[snafu(display("Invalid integer string `{}`", text))]
    ParseInteger {
        text: String,
        source: std::num::ParseIntError,
        backtrace: Backtrace,
    },
    /// A text value is not a valid decimal
    #[snafu(display("Invalid decimal string `{}`", text))]
    ParseDecimal {
        text: String,
        source: std::num::ParseFloatError,
        backtrace: Backtrace,
    },
    /// A number does not fit in the declared kind
    #[snafu(display("Value {} out of range for {}", value, kind))]
    OutOfRange {
        value: i128,
        kind: ValueKind,
        backtrace: Backtrace,
    },
    /// The value could not be converted by the core library
    #[snafu(display("Could not convert value to {}", kind))]
    Convert {
        kind: ValueKind,
        source: ConvertValueError,
        backtrace: Backtrace,
    },
    /// The value variant cannot represent the declared kind
    #[snafu(display("Cannot read {:?} value as {}", value_type, kind))]
    UnsupportedVariant {
        value_type: dicom_core::value::ValueType,
        kind: ValueKind,
        backtrace: Backtrace,
    },
    /// A single value was requested, but the element is empty
    #[snafu(display("Element has no values"))]
    NoValue { backtrace: Backtrace },
}

/// A raw data element, as seen by the codec.
pub trait ElementHandle {
    /// The type of the items of a sequence element.
    type Item;

    /// The element's value representation.
    fn vr(&self) -> VR;

    /// The element's primitive value,
    /// or `None` if it holds sequence items or pixel data fragments.
    fn primitive_value(&self) -> Option<&PrimitiveValue>;

    /// The items of a sequence element,
    /// or `None` if it is not a sequence.
    fn sequence_items(&self) -> Option<&[Self::Item]>;

    /// Retrieve all values of the element as the given kind.
    ///
    /// The element's VR must be the one of the declared kind.
    fn vector(&self, kind: ValueKind) -> Result<AttributeValue, CoerceError> {
        ensure!(!kind.is_sequence(), SequenceKindSnafu);
        ensure!(
            self.vr() == kind.vr(),
            UnexpectedVrSnafu {
                expected: kind.vr(),
                got: self.vr(),
            }
        );
        let value = self
            .primitive_value()
            .context(NotPrimitiveSnafu { vr: self.vr() })?;
        coerce(value, kind)
    }

    /// Retrieve the first value of the element as the given kind.
    fn scalar(&self, kind: ValueKind) -> Result<AttributeValue, CoerceError> {
        let mut value = self.vector(kind)?;
        ensure!(!value.is_empty(), NoValueSnafu);
        value.truncate(1);
        Ok(value)
    }
}

/// A raw data set, as seen by the codec.
pub trait DataSetHandle: Sized {
    /// The type of the data set's elements.
    type Element: ElementHandle<Item = Self>;
    /// The error type for failed insertions.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create a new empty data set,
    /// suitable as a sequence item of this one.
    fn new_item() -> Self;

    /// Find the element with the given tag.
    fn find_element(&self, tag: Tag) -> Option<&Self::Element>;

    /// Insert a primitive element, replacing any element with the same tag.
    fn insert_primitive(
        &mut self,
        tag: Tag,
        vr: VR,
        value: PrimitiveValue,
    ) -> Result<(), Self::Error>;

    /// Insert a sequence element, replacing any element with the same tag.
    fn insert_sequence(&mut self, tag: Tag, items: Vec<Self>) -> Result<(), Self::Error>;
}

impl<D> ElementHandle for InMemElement<D>
where
    D: DataDictionary + Clone,
{
    type Item = InMemDicomObject<D>;

    fn vr(&self) -> VR {
        DataElement::vr(self)
    }

    fn primitive_value(&self) -> Option<&PrimitiveValue> {
        self.value().primitive()
    }

    fn sequence_items(&self) -> Option<&[Self::Item]> {
        self.value().items()
    }
}

impl<D> DataSetHandle for InMemDicomObject<D>
where
    D: DataDictionary + Clone + Default,
{
    type Element = InMemElement<D>;
    type Error = Infallible;

    fn new_item() -> Self {
        InMemDicomObject::new_empty_with_dict(D::default())
    }

    fn find_element(&self, tag: Tag) -> Option<&Self::Element> {
        self.element(tag).ok()
    }

    fn insert_primitive(
        &mut self,
        tag: Tag,
        vr: VR,
        value: PrimitiveValue,
    ) -> Result<(), Self::Error> {
        self.put(DataElement::new(tag, vr, value));
        Ok(())
    }

    fn insert_sequence(&mut self, tag: Tag, items: Vec<Self>) -> Result<(), Self::Error> {
        self.put(DataElement::new(tag, VR::SQ, DataSetSequence::from(items)));
        Ok(())
    }
}

/// Presents a raw data set as an attribute source for conditions.
#[derive(Debug)]
pub struct RawProbe<'a, H>(pub &'a H);

impl<H> AttributeProbe for RawProbe<'_, H>
where
    H: DataSetHandle,
{
    fn is_present(&self, tag: Tag) -> bool {
        self.0.find_element(tag).is_some()
    }

    fn first_text(&self, tag: Tag) -> Option<String> {
        let element = self.0.find_element(tag)?;
        let value = element.primitive_value()?;
        // numbers are compared in the form a record would hold them
        if let Some(kind @ (ValueKind::IntegerString | ValueKind::DecimalString)) =
            ValueKind::from_vr(element.vr())
        {
            if let Ok(number) = coerce(value, kind) {
                return number.first_text();
            }
        }
        let text = value.to_str();
        let first = text.split('\\').next()?.trim_matches([' ', '\0']);
        if first.is_empty() {
            None
        } else {
            Some(first.to_string())
        }
    }
}

/// Whether leading spaces are significant for this kind of text.
pub(crate) fn keeps_leading_spaces(kind: ValueKind) -> bool {
    matches!(kind, ValueKind::ShortText | ValueKind::LongText)
}

/// Collect the text values of a primitive value,
/// removing padding.
fn text_values(value: &PrimitiveValue, kind: ValueKind) -> Vec<String> {
    let trim = |s: &str| -> String {
        let s = s.trim_end_matches([' ', '\0']);
        if keeps_leading_spaces(kind) {
            s.to_string()
        } else {
            s.trim_start_matches(' ').to_string()
        }
    };
    let values: Vec<String> = match value {
        PrimitiveValue::Str(s) => vec![trim(s.as_str())],
        PrimitiveValue::Strs(c) => c.iter().map(|s| trim(s.as_str())).collect(),
        other => other.to_multi_str().iter().map(|s| trim(s.as_str())).collect(),
    };
    // a single blank value holds nothing
    if values.len() == 1 && values[0].is_empty() {
        Vec::new()
    } else {
        values
    }
}

/// Collect the integer values of a primitive value,
/// parsing text if necessary.
fn integer_values<T>(value: &PrimitiveValue, kind: ValueKind) -> Result<C<T>, CoerceError>
where
    T: TryFrom<i128>,
{
    let wide: Vec<i128> = match value {
        PrimitiveValue::U8(c) => c.iter().map(|v| i128::from(*v)).collect(),
        PrimitiveValue::I16(c) => c.iter().map(|v| i128::from(*v)).collect(),
        PrimitiveValue::U16(c) => c.iter().map(|v| i128::from(*v)).collect(),
        PrimitiveValue::I32(c) => c.iter().map(|v| i128::from(*v)).collect(),
        PrimitiveValue::U32(c) => c.iter().map(|v| i128::from(*v)).collect(),
        PrimitiveValue::I64(c) => c.iter().map(|v| i128::from(*v)).collect(),
        PrimitiveValue::U64(c) => c.iter().map(|v| i128::from(*v)).collect(),
        PrimitiveValue::Str(_) | PrimitiveValue::Strs(_) => text_values(value, kind)
            .into_iter()
            .map(|text| {
                text.trim()
                    .parse::<i128>()
                    .context(ParseIntegerSnafu { text: text.as_str() })
            })
            .collect::<Result<_, _>>()?,
        other => {
            return UnsupportedVariantSnafu {
                value_type: other.value_type(),
                kind,
            }
            .fail()
        }
    };
    wide.into_iter()
        .map(|v| T::try_from(v).ok().context(OutOfRangeSnafu { value: v, kind }))
        .collect()
}

/// Collect the floating point values of a primitive value,
/// parsing text if necessary.
fn decimal_values(value: &PrimitiveValue, kind: ValueKind) -> Result<C<f64>, CoerceError> {
    match value {
        PrimitiveValue::F64(c) => Ok(c.clone()),
        PrimitiveValue::F32(c) => Ok(c.iter().map(|v| f64::from(*v)).collect()),
        PrimitiveValue::Str(_) | PrimitiveValue::Strs(_) => text_values(value, kind)
            .into_iter()
            .map(|text| {
                text.trim()
                    .parse::<f64>()
                    .context(ParseDecimalSnafu { text: text.as_str() })
            })
            .collect(),
        other => Ok(integer_values::<i64>(other, kind)?
            .into_iter()
            .map(|v| v as f64)
            .collect()),
    }
}

/// Coerce a primitive value into the given value kind.
///
/// Empty values coerce to an empty attribute value of that kind.
pub fn coerce(value: &PrimitiveValue, kind: ValueKind) -> Result<AttributeValue, CoerceError> {
    if let PrimitiveValue::Empty = value {
        return Ok(AttributeValue::empty(kind));
    }

    let out = match kind {
        ValueKind::ShortText
        | ValueKind::LongText
        | ValueKind::ShortString
        | ValueKind::LongString
        | ValueKind::CodeString
        | ValueKind::PersonName
        | ValueKind::UniqueIdentifier => {
            AttributeValue::Strs(text_values(value, kind).into_iter().collect())
        }
        ValueKind::IntegerString | ValueKind::Sint32 => {
            AttributeValue::I32(integer_values(value, kind)?)
        }
        ValueKind::Uint16 => AttributeValue::U16(integer_values(value, kind)?),
        ValueKind::Sint16 => AttributeValue::I16(integer_values(value, kind)?),
        ValueKind::Uint32 => AttributeValue::U32(integer_values(value, kind)?),
        ValueKind::DecimalString | ValueKind::Float64 => {
            AttributeValue::F64(decimal_values(value, kind)?)
        }
        ValueKind::Float32 => match value {
            PrimitiveValue::F32(c) => AttributeValue::F32(c.clone()),
            // precision is lost as with any narrowing conversion
            other => AttributeValue::F32(
                decimal_values(other, kind)?
                    .into_iter()
                    .map(|v| v as f32)
                    .collect(),
            ),
        },
        ValueKind::Date => match value {
            PrimitiveValue::Date(c) => AttributeValue::Date(c.clone()),
            other => AttributeValue::Date(
                other
                    .to_multi_date()
                    .context(ConvertSnafu { kind })?
                    .into_iter()
                    .collect(),
            ),
        },
        ValueKind::Time => match value {
            PrimitiveValue::Time(c) => AttributeValue::Time(c.clone()),
            other => AttributeValue::Time(
                other
                    .to_multi_time()
                    .context(ConvertSnafu { kind })?
                    .into_iter()
                    .collect(),
            ),
        },
        ValueKind::AttributeTag => match value {
            PrimitiveValue::Tags(c) => AttributeValue::Tags(c.clone()),
            other => {
                return UnsupportedVariantSnafu {
                    value_type: other.value_type(),
                    kind,
                }
                .fail()
            }
        },
        ValueKind::Sequence => return SequenceKindSnafu.fail(),
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_core::dicom_value;
    use dicom_core::value::{DicomDate, ValueType};

    #[test]
    fn coerce_text_numbers() {
        let value = PrimitiveValue::from("5 ");
        assert_eq!(
            coerce(&value, ValueKind::IntegerString).unwrap(),
            AttributeValue::from(5_i32)
        );

        let value = dicom_value!(Strs, [" 1.5", "-20 ", "3.25e1"]);
        assert_eq!(
            coerce(&value, ValueKind::DecimalString).unwrap(),
            AttributeValue::from(vec![1.5_f64, -20.0, 32.5])
        );

        let value = PrimitiveValue::from("five");
        assert!(matches!(
            coerce(&value, ValueKind::IntegerString),
            Err(CoerceError::ParseInteger { .. })
        ));

        let value = PrimitiveValue::from(70_000_i32);
        assert!(matches!(
            coerce(&value, ValueKind::Uint16),
            Err(CoerceError::OutOfRange { value: 70_000, .. })
        ));
    }

    #[test]
    fn coerce_padded_text() {
        let value = dicom_value!(Strs, ["MLCX ", " ASYMY"]);
        assert_eq!(
            coerce(&value, ValueKind::CodeString).unwrap(),
            AttributeValue::from(vec!["MLCX", "ASYMY"])
        );

        let value = PrimitiveValue::from("1.2.840.10008.1.2\0");
        assert_eq!(
            coerce(&value, ValueKind::UniqueIdentifier).unwrap(),
            AttributeValue::from("1.2.840.10008.1.2")
        );

        // leading spaces are significant in free text
        let value = PrimitiveValue::from("  indented ");
        assert_eq!(
            coerce(&value, ValueKind::ShortText).unwrap(),
            AttributeValue::from("  indented")
        );

        let value = PrimitiveValue::from(" ");
        assert!(coerce(&value, ValueKind::LongString).unwrap().is_empty());
        assert!(coerce(&PrimitiveValue::Empty, ValueKind::DecimalString)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn coerce_binary_values() {
        let value = PrimitiveValue::from(1.5_f32);
        assert_eq!(
            coerce(&value, ValueKind::Float32).unwrap(),
            AttributeValue::from(1.5_f32)
        );
        let value = dicom_value!(U16, [1, 2, 3]);
        assert_eq!(
            coerce(&value, ValueKind::Uint16).unwrap(),
            AttributeValue::from(vec![1_u16, 2, 3])
        );

        let date = DicomDate::from_ymd(2024, 2, 29).unwrap();
        let value = PrimitiveValue::from(date);
        assert_eq!(
            coerce(&value, ValueKind::Date).unwrap(),
            AttributeValue::from(date)
        );

        let value = PrimitiveValue::from(1.5_f32);
        assert!(matches!(
            coerce(&value, ValueKind::AttributeTag),
            Err(CoerceError::UnsupportedVariant {
                value_type: ValueType::F32,
                kind: ValueKind::AttributeTag,
                ..
            })
        ));
        assert!(matches!(
            coerce(&value, ValueKind::Uint16),
            Err(CoerceError::UnsupportedVariant {
                value_type: ValueType::F32,
                kind: ValueKind::Uint16,
                ..
            })
        ));
    }

    #[test]
    fn element_handle_checks_vr() {
        let elem: InMemElement = DataElement::new(
            Tag(0x300A, 0x011E),
            VR::DS,
            PrimitiveValue::from("90"),
        );
        assert_eq!(
            elem.scalar(ValueKind::DecimalString).unwrap(),
            AttributeValue::from(90.0_f64)
        );
        assert!(matches!(
            elem.vector(ValueKind::LongString),
            Err(CoerceError::UnexpectedVr {
                expected: VR::LO,
                got: VR::DS,
                ..
            })
        ));
        assert!(matches!(
            elem.vector(ValueKind::Sequence),
            Err(CoerceError::SequenceKind { .. })
        ));

        let empty: InMemElement =
            DataElement::new(Tag(0x300A, 0x011E), VR::DS, PrimitiveValue::Empty);
        assert!(matches!(
            empty.scalar(ValueKind::DecimalString),
            Err(CoerceError::NoValue { .. })
        ));
    }

    #[test]
    fn probe_raw_data_set() {
        let mut obj: InMemDicomObject = InMemDicomObject::new_empty();
        obj.insert_primitive(Tag(0x300A, 0x00D0), VR::IS, PrimitiveValue::from("2 "))
            .unwrap();
        obj.insert_primitive(Tag(0x300A, 0x00C2), VR::LO, PrimitiveValue::Empty)
            .unwrap();

        let probe = RawProbe(&obj);
        assert!(probe.is_present(Tag(0x300A, 0x00D0)));
        assert_eq!(probe.first_text(Tag(0x300A, 0x00D0)).as_deref(), Some("2"));
        assert!(probe.is_present(Tag(0x300A, 0x00C2)));
        assert_eq!(probe.first_text(Tag(0x300A, 0x00C2)), None);
        assert!(!probe.is_present(Tag(0x300A, 0x00C0)));
    }

    #[test]
    fn probe_compares_numbers_by_value() {
        let mut obj: InMemDicomObject = InMemDicomObject::new_empty();
        obj.insert_primitive(Tag(0x300A, 0x00D0), VR::IS, PrimitiveValue::from("00"))
            .unwrap();
        obj.insert_primitive(Tag(0x300A, 0x011E), VR::DS, PrimitiveValue::from(" 0.0"))
            .unwrap();
        obj.insert_primitive(Tag(0x300A, 0x00C6), VR::CS, PrimitiveValue::from("00"))
            .unwrap();

        let probe = RawProbe(&obj);
        assert_eq!(probe.first_text(Tag(0x300A, 0x00D0)).as_deref(), Some("0"));
        assert_eq!(probe.first_text(Tag(0x300A, 0x011E)).as_deref(), Some("0"));
        // code strings stay as written
        assert_eq!(probe.first_text(Tag(0x300A, 0x00C6)).as_deref(), Some("00"));
    }
}
