//! Typed attribute values held by a record.
//!
//! [`AttributeValue`] mirrors [`PrimitiveValue`](dicom_core::PrimitiveValue),
//! but with exactly one variant per family of [value kinds](ValueKind),
//! so that text encoded numbers (IS, DS) are held as numbers.
//! Nested items are held in a [`RecordSequence`].
//!
//! Values are extracted in the requested Rust type
//! through the [`FromAttributeValue`] trait,
//! which is what [`Record::get_as`](crate::Record::get_as) uses.

use crate::schema::ValueKind;
use crate::sequence::RecordSequence;
use dicom_core::value::{DicomDate, DicomTime, C};
use dicom_core::Tag;
use snafu::{Backtrace, Snafu};
use std::fmt;

/// A typed attribute value,
/// which may hold any number of values (including zero).
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Textual values (ST, LT, SH, LO, CS, PN, UI)
    Strs(C<String>),
    /// Signed 32-bit integers (IS, SL)
    I32(C<i32>),
    /// Single precision floating point numbers (FL)
    F32(C<f32>),
    /// Double precision floating point numbers (DS, FD)
    F64(C<f64>),
    /// Unsigned 16-bit integers (US)
    U16(C<u16>),
    /// Signed 16-bit integers (SS)
    I16(C<i16>),
    /// Unsigned 32-bit integers (UL)
    U32(C<u32>),
    /// Dates (DA)
    Date(C<DicomDate>),
    /// Times (TM)
    Time(C<DicomTime>),
    /// Attribute tags (AT)
    Tags(C<Tag>),
    /// Sequence items (SQ)
    Sequence(RecordSequence),
}

impl AttributeValue {
    /// Create a value with no values for the given kind.
    pub fn empty(kind: ValueKind) -> Self {
        match kind {
            ValueKind::IntegerString | ValueKind::Sint32 => AttributeValue::I32(C::new()),
            ValueKind::DecimalString | ValueKind::Float64 => AttributeValue::F64(C::new()),
            ValueKind::Float32 => AttributeValue::F32(C::new()),
            ValueKind::Uint16 => AttributeValue::U16(C::new()),
            ValueKind::Sint16 => AttributeValue::I16(C::new()),
            ValueKind::Uint32 => AttributeValue::U32(C::new()),
            ValueKind::Date => AttributeValue::Date(C::new()),
            ValueKind::Time => AttributeValue::Time(C::new()),
            ValueKind::AttributeTag => AttributeValue::Tags(C::new()),
            ValueKind::Sequence => AttributeValue::Sequence(RecordSequence::new()),
            _ => AttributeValue::Strs(C::new()),
        }
    }

    /// The number of values, or the number of items if it is a sequence.
    pub fn multiplicity(&self) -> u32 {
        let len = match self {
            AttributeValue::Strs(c) => c.len(),
            AttributeValue::I32(c) => c.len(),
            AttributeValue::F32(c) => c.len(),
            AttributeValue::F64(c) => c.len(),
            AttributeValue::U16(c) => c.len(),
            AttributeValue::I16(c) => c.len(),
            AttributeValue::U32(c) => c.len(),
            AttributeValue::Date(c) => c.len(),
            AttributeValue::Time(c) => c.len(),
            AttributeValue::Tags(c) => c.len(),
            AttributeValue::Sequence(seq) => seq.len(),
        };
        len as u32
    }

    /// Whether it holds no values (or no items).
    pub fn is_empty(&self) -> bool {
        self.multiplicity() == 0
    }

    /// Keep only the first `len` values or items.
    pub fn truncate(&mut self, len: usize) {
        match self {
            AttributeValue::Strs(c) => c.truncate(len),
            AttributeValue::I32(c) => c.truncate(len),
            AttributeValue::F32(c) => c.truncate(len),
            AttributeValue::F64(c) => c.truncate(len),
            AttributeValue::U16(c) => c.truncate(len),
            AttributeValue::I16(c) => c.truncate(len),
            AttributeValue::U32(c) => c.truncate(len),
            AttributeValue::Date(c) => c.truncate(len),
            AttributeValue::Time(c) => c.truncate(len),
            AttributeValue::Tags(c) => c.truncate(len),
            AttributeValue::Sequence(seq) => seq.truncate(len),
        }
    }

    /// Check whether this value can be held by an attribute of the given kind.
    pub fn fits(&self, kind: ValueKind) -> bool {
        match self {
            AttributeValue::Strs(_) => kind.is_textual(),
            AttributeValue::I32(_) => {
                matches!(kind, ValueKind::IntegerString | ValueKind::Sint32)
            }
            AttributeValue::F64(_) => {
                matches!(kind, ValueKind::DecimalString | ValueKind::Float64)
            }
            AttributeValue::F32(_) => kind == ValueKind::Float32,
            AttributeValue::U16(_) => kind == ValueKind::Uint16,
            AttributeValue::I16(_) => kind == ValueKind::Sint16,
            AttributeValue::U32(_) => kind == ValueKind::Uint32,
            AttributeValue::Date(_) => kind == ValueKind::Date,
            AttributeValue::Time(_) => kind == ValueKind::Time,
            AttributeValue::Tags(_) => kind == ValueKind::AttributeTag,
            AttributeValue::Sequence(_) => kind == ValueKind::Sequence,
        }
    }

    /// A short name of the variant, for error reporting.
    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::Strs(_) => "Strs",
            AttributeValue::I32(_) => "I32",
            AttributeValue::F32(_) => "F32",
            AttributeValue::F64(_) => "F64",
            AttributeValue::U16(_) => "U16",
            AttributeValue::I16(_) => "I16",
            AttributeValue::U32(_) => "U32",
            AttributeValue::Date(_) => "Date",
            AttributeValue::Time(_) => "Time",
            AttributeValue::Tags(_) => "Tags",
            AttributeValue::Sequence(_) => "Sequence",
        }
    }

    /// Obtain the first value as text.
    ///
    /// Dates, times and sequences have no text form here.
    pub fn first_text(&self) -> Option<String> {
        match self {
            AttributeValue::Strs(c) => c
                .first()
                .map(|s| s.trim_matches([' ', '\0']).to_string())
                .filter(|s| !s.is_empty()),
            AttributeValue::I32(c) => c.first().map(|v| v.to_string()),
            AttributeValue::F32(c) => c.first().map(|v| v.to_string()),
            AttributeValue::F64(c) => c.first().map(|v| v.to_string()),
            AttributeValue::U16(c) => c.first().map(|v| v.to_string()),
            AttributeValue::I16(c) => c.first().map(|v| v.to_string()),
            AttributeValue::U32(c) => c.first().map(|v| v.to_string()),
            AttributeValue::Tags(c) => c.first().map(|v| v.to_string()),
            AttributeValue::Date(_) | AttributeValue::Time(_) | AttributeValue::Sequence(_) => {
                None
            }
        }
    }

    /// Get the sequence of items, if it is a sequence.
    pub fn items(&self) -> Option<&RecordSequence> {
        match self {
            AttributeValue::Sequence(seq) => Some(seq),
            _ => None,
        }
    }

    /// Get a mutable reference to the sequence of items, if it is a sequence.
    pub fn items_mut(&mut self) -> Option<&mut RecordSequence> {
        match self {
            AttributeValue::Sequence(seq) => Some(seq),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join<T: fmt::Display>(f: &mut fmt::Formatter<'_>, values: &[T]) -> fmt::Result {
            for (i, v) in values.iter().enumerate() {
                if i > 0 {
                    f.write_str("\\")?;
                }
                write!(f, "{}", v)?;
            }
            Ok(())
        }

        match self {
            AttributeValue::Strs(c) => join(f, c),
            AttributeValue::I32(c) => join(f, c),
            AttributeValue::F32(c) => join(f, c),
            AttributeValue::F64(c) => join(f, c),
            AttributeValue::U16(c) => join(f, c),
            AttributeValue::I16(c) => join(f, c),
            AttributeValue::U32(c) => join(f, c),
            AttributeValue::Date(c) => join(f, c),
            AttributeValue::Time(c) => join(f, c),
            AttributeValue::Tags(c) => join(f, c),
            AttributeValue::Sequence(seq) => write!(f, "({} items)", seq.len()),
        }
    }
}

macro_rules! impl_from_for_value {
    ($typ: ty, $variant: ident) => {
        impl From<$typ> for AttributeValue {
            fn from(value: $typ) -> Self {
                AttributeValue::$variant(C::from_elem(value, 1))
            }
        }

        impl From<Vec<$typ>> for AttributeValue {
            fn from(values: Vec<$typ>) -> Self {
                AttributeValue::$variant(C::from_vec(values))
            }
        }

        impl From<&[$typ]> for AttributeValue {
            fn from(values: &[$typ]) -> Self {
                AttributeValue::$variant(values.iter().cloned().collect())
            }
        }

        impl<const N: usize> From<[$typ; N]> for AttributeValue {
            fn from(values: [$typ; N]) -> Self {
                AttributeValue::$variant(values.into_iter().collect())
            }
        }
    };
}

impl_from_for_value!(String, Strs);
impl_from_for_value!(i32, I32);
impl_from_for_value!(f32, F32);
impl_from_for_value!(f64, F64);
impl_from_for_value!(u16, U16);
impl_from_for_value!(i16, I16);
impl_from_for_value!(u32, U32);
impl_from_for_value!(DicomDate, Date);
impl_from_for_value!(DicomTime, Time);
impl_from_for_value!(Tag, Tags);

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Strs(C::from_elem(value.to_string(), 1))
    }
}

impl From<Vec<&str>> for AttributeValue {
    fn from(values: Vec<&str>) -> Self {
        AttributeValue::Strs(values.into_iter().map(String::from).collect())
    }
}

impl From<RecordSequence> for AttributeValue {
    fn from(seq: RecordSequence) -> Self {
        AttributeValue::Sequence(seq)
    }
}

/// An error which may occur when obtaining a typed value
/// out of an attribute value.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum ValueAccessError {
    /// The attribute holds no values
    #[snafu(display("Attribute value is empty"))]
    EmptyValue { backtrace: Backtrace },
    /// The attribute cannot be converted to the requested type
    #[snafu(display("Cannot convert {} value to {}", got, requested))]
    IncompatibleValue {
        requested: &'static str,
        got: &'static str,
        backtrace: Backtrace,
    },
    /// Text could not be parsed into the requested type
    #[snafu(display("Cannot parse `{}` as {}", text, requested))]
    ParseValue {
        text: String,
        requested: &'static str,
        backtrace: Backtrace,
    },
}

/// A Rust type which can be obtained from an attribute value.
///
/// Single value implementations take the first value
/// and fail if there are none.
/// `Vec` implementations take all values.
pub trait FromAttributeValue: Sized {
    /// Extract a value of this type.
    fn from_attribute_value(value: &AttributeValue) -> Result<Self, ValueAccessError>;
}

fn single<T>(mut values: Vec<T>) -> Result<T, ValueAccessError> {
    if values.is_empty() {
        return EmptyValueSnafu.fail();
    }
    Ok(values.swap_remove(0))
}

impl FromAttributeValue for Vec<String> {
    fn from_attribute_value(value: &AttributeValue) -> Result<Self, ValueAccessError> {
        match value {
            AttributeValue::Strs(c) => Ok(c.to_vec()),
            AttributeValue::I32(c) => Ok(c.iter().map(|v| v.to_string()).collect()),
            AttributeValue::F32(c) => Ok(c.iter().map(|v| v.to_string()).collect()),
            AttributeValue::F64(c) => Ok(c.iter().map(|v| v.to_string()).collect()),
            AttributeValue::U16(c) => Ok(c.iter().map(|v| v.to_string()).collect()),
            AttributeValue::I16(c) => Ok(c.iter().map(|v| v.to_string()).collect()),
            AttributeValue::U32(c) => Ok(c.iter().map(|v| v.to_string()).collect()),
            AttributeValue::Date(c) => Ok(c.iter().map(|v| v.to_string()).collect()),
            AttributeValue::Time(c) => Ok(c.iter().map(|v| v.to_string()).collect()),
            AttributeValue::Tags(c) => Ok(c.iter().map(|v| v.to_string()).collect()),
            AttributeValue::Sequence(_) => IncompatibleValueSnafu {
                requested: "String",
                got: value.type_name(),
            }
            .fail(),
        }
    }
}

impl FromAttributeValue for String {
    fn from_attribute_value(value: &AttributeValue) -> Result<Self, ValueAccessError> {
        single(Vec::<String>::from_attribute_value(value)?)
    }
}

/// Implement numeric extraction,
/// converting between numeric variants when the value fits
/// and parsing text values.
macro_rules! impl_numeric_from_value {
    ($typ: ty, $name: literal) => {
        impl FromAttributeValue for Vec<$typ> {
            fn from_attribute_value(value: &AttributeValue) -> Result<Self, ValueAccessError> {
                fn cast<N>(values: &[N]) -> Result<Vec<$typ>, ValueAccessError>
                where
                    N: Copy + fmt::Display + TryInto<$typ>,
                {
                    values
                        .iter()
                        .map(|v| {
                            (*v).try_into().ok().ok_or_else(|| {
                                ParseValueSnafu {
                                    text: v.to_string(),
                                    requested: $name,
                                }
                                .build()
                            })
                        })
                        .collect()
                }

                match value {
                    AttributeValue::I32(c) => cast(c),
                    AttributeValue::U16(c) => cast(c),
                    AttributeValue::I16(c) => cast(c),
                    AttributeValue::U32(c) => cast(c),
                    AttributeValue::Strs(c) => c
                        .iter()
                        .map(|s| {
                            s.trim().parse::<$typ>().ok().ok_or_else(|| {
                                ParseValueSnafu {
                                    text: s.clone(),
                                    requested: $name,
                                }
                                .build()
                            })
                        })
                        .collect(),
                    _ => IncompatibleValueSnafu {
                        requested: $name,
                        got: value.type_name(),
                    }
                    .fail(),
                }
            }
        }

        impl FromAttributeValue for $typ {
            fn from_attribute_value(value: &AttributeValue) -> Result<Self, ValueAccessError> {
                single(Vec::<$typ>::from_attribute_value(value)?)
            }
        }
    };
}

impl_numeric_from_value!(i32, "i32");
impl_numeric_from_value!(i16, "i16");
impl_numeric_from_value!(u16, "u16");
impl_numeric_from_value!(u32, "u32");
impl_numeric_from_value!(i64, "i64");

impl FromAttributeValue for Vec<f64> {
    fn from_attribute_value(value: &AttributeValue) -> Result<Self, ValueAccessError> {
        match value {
            AttributeValue::F64(c) => Ok(c.to_vec()),
            AttributeValue::F32(c) => Ok(c.iter().map(|v| f64::from(*v)).collect()),
            AttributeValue::I32(c) => Ok(c.iter().map(|v| f64::from(*v)).collect()),
            AttributeValue::U16(c) => Ok(c.iter().map(|v| f64::from(*v)).collect()),
            AttributeValue::I16(c) => Ok(c.iter().map(|v| f64::from(*v)).collect()),
            AttributeValue::U32(c) => Ok(c.iter().map(|v| f64::from(*v)).collect()),
            AttributeValue::Strs(c) => c
                .iter()
                .map(|s| {
                    s.trim().parse::<f64>().ok().ok_or_else(|| {
                        ParseValueSnafu {
                            text: s.clone(),
                            requested: "f64",
                        }
                        .build()
                    })
                })
                .collect(),
            _ => IncompatibleValueSnafu {
                requested: "f64",
                got: value.type_name(),
            }
            .fail(),
        }
    }
}

impl FromAttributeValue for f64 {
    fn from_attribute_value(value: &AttributeValue) -> Result<Self, ValueAccessError> {
        single(Vec::<f64>::from_attribute_value(value)?)
    }
}

impl FromAttributeValue for Vec<f32> {
    fn from_attribute_value(value: &AttributeValue) -> Result<Self, ValueAccessError> {
        match value {
            AttributeValue::F32(c) => Ok(c.to_vec()),
            // narrowing, precision may be lost
            AttributeValue::F64(c) => Ok(c.iter().map(|v| *v as f32).collect()),
            _ => Ok(Vec::<f64>::from_attribute_value(value)?
                .into_iter()
                .map(|v| v as f32)
                .collect()),
        }
    }
}

impl FromAttributeValue for f32 {
    fn from_attribute_value(value: &AttributeValue) -> Result<Self, ValueAccessError> {
        single(Vec::<f32>::from_attribute_value(value)?)
    }
}

macro_rules! impl_exact_from_value {
    ($typ: ty, $variant: ident, $name: literal) => {
        impl FromAttributeValue for Vec<$typ> {
            fn from_attribute_value(value: &AttributeValue) -> Result<Self, ValueAccessError> {
                match value {
                    AttributeValue::$variant(c) => Ok(c.to_vec()),
                    _ => IncompatibleValueSnafu {
                        requested: $name,
                        got: value.type_name(),
                    }
                    .fail(),
                }
            }
        }

        impl FromAttributeValue for $typ {
            fn from_attribute_value(value: &AttributeValue) -> Result<Self, ValueAccessError> {
                single(Vec::<$typ>::from_attribute_value(value)?)
            }
        }
    };
}

impl_exact_from_value!(DicomDate, Date, "DicomDate");
impl_exact_from_value!(DicomTime, Time, "DicomTime");
impl_exact_from_value!(Tag, Tags, "Tag");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_access_collapses_overloads() {
        // a DS value can be read as text or as a number
        let value = AttributeValue::from([1.5_f64, -20.0, 3.25]);
        assert_eq!(value.multiplicity(), 3);
        assert_eq!(f64::from_attribute_value(&value).unwrap(), 1.5);
        assert_eq!(
            Vec::<f64>::from_attribute_value(&value).unwrap(),
            vec![1.5, -20.0, 3.25]
        );
        assert_eq!(String::from_attribute_value(&value).unwrap(), "1.5");
        assert_eq!(f32::from_attribute_value(&value).unwrap(), 1.5_f32);

        // an IS value can be read as any integer type which fits
        let value = AttributeValue::from(7_i32);
        assert_eq!(u16::from_attribute_value(&value).unwrap(), 7);
        assert_eq!(f64::from_attribute_value(&value).unwrap(), 7.0);
        let value = AttributeValue::from(-7_i32);
        assert!(matches!(
            u16::from_attribute_value(&value),
            Err(ValueAccessError::ParseValue { .. })
        ));

        // text may be parsed
        let value = AttributeValue::from(" 42 ");
        assert_eq!(i32::from_attribute_value(&value).unwrap(), 42);
        assert!(matches!(
            DicomDate::from_attribute_value(&value),
            Err(ValueAccessError::IncompatibleValue { .. })
        ));
    }

    #[test]
    fn empty_values() {
        let value = AttributeValue::empty(ValueKind::DecimalString);
        assert!(value.is_empty());
        assert!(value.fits(ValueKind::DecimalString));
        assert!(value.fits(ValueKind::Float64));
        assert!(!value.fits(ValueKind::Float32));
        assert!(matches!(
            f64::from_attribute_value(&value),
            Err(ValueAccessError::EmptyValue { .. })
        ));
        assert_eq!(Vec::<f64>::from_attribute_value(&value).unwrap(), vec![]);
    }

    #[test]
    fn display_joins_with_backslash() {
        let value = AttributeValue::from(vec!["MLCX", "ASYMY"]);
        assert_eq!(value.to_string(), "MLCX\\ASYMY");
        assert_eq!(value.first_text().as_deref(), Some("MLCX"));
    }
}
