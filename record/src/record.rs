//! Records: typed attribute values keyed by tag.

use crate::schema::AttributeProbe;
use crate::sequence::RecordSequence;
use crate::value::{AttributeValue, FromAttributeValue, ValueAccessError};
use dicom_core::Tag;
use snafu::{OptionExt, ResultExt, Snafu};
use std::collections::BTreeMap;

/// An error which may occur when reading an attribute of a record.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum AccessError {
    /// The attribute is not in the record
    #[snafu(display("Attribute {} is absent", tag))]
    Absent {
        tag: Tag,
        backtrace: snafu::Backtrace,
    },
    /// The attribute value could not be converted
    #[snafu(display("Could not retrieve attribute {}", tag))]
    Value {
        tag: Tag,
        #[snafu(backtrace)]
        source: ValueAccessError,
    },
}

/// A decoded data set item:
/// a set of typed attribute values keyed by tag.
///
/// An attribute which is not in the record is absent.
/// An attribute holding zero values is present but empty.
/// Records are plain data:
/// cloning one produces an independent deep copy.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Record {
    entries: BTreeMap<Tag, AttributeValue>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of attributes in the record.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the record has no attributes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the attribute is in the record.
    pub fn contains(&self, tag: Tag) -> bool {
        self.entries.contains_key(&tag)
    }

    /// Get the value of an attribute.
    pub fn get(&self, tag: Tag) -> Option<&AttributeValue> {
        self.entries.get(&tag)
    }

    /// Get the value of an attribute for modification.
    pub fn get_mut(&mut self, tag: Tag) -> Option<&mut AttributeValue> {
        self.entries.get_mut(&tag)
    }

    /// Get the value of an attribute in the requested type.
    ///
    /// # Example
    ///
    /// ```
    /// # use dicom_record::Record;
    /// # use dicom_core::Tag;
    /// let mut record = Record::new();
    /// record.set(Tag(0x300A, 0x011E), 90.0_f64);
    ///
    /// let angle: f64 = record.get_as(Tag(0x300A, 0x011E))?;
    /// assert_eq!(angle, 90.0);
    /// let angle: String = record.get_as(Tag(0x300A, 0x011E))?;
    /// assert_eq!(angle, "90");
    /// # Ok::<_, dicom_record::AccessError>(())
    /// ```
    pub fn get_as<T>(&self, tag: Tag) -> Result<T, AccessError>
    where
        T: FromAttributeValue,
    {
        let value = self.entries.get(&tag).context(AbsentSnafu { tag })?;
        T::from_attribute_value(value).context(ValueSnafu { tag })
    }

    /// Get the value of an attribute in the requested type,
    /// or `None` if the attribute is absent.
    pub fn get_opt_as<T>(&self, tag: Tag) -> Result<Option<T>, AccessError>
    where
        T: FromAttributeValue,
    {
        self.entries
            .get(&tag)
            .map(|value| T::from_attribute_value(value).context(ValueSnafu { tag }))
            .transpose()
    }

    /// Get the items of a sequence attribute.
    pub fn sequence(&self, tag: Tag) -> Option<&RecordSequence> {
        self.entries.get(&tag).and_then(AttributeValue::items)
    }

    /// Get the items of a sequence attribute for modification,
    /// creating an empty sequence if the attribute is absent.
    ///
    /// Returns `None` if the attribute holds something other than a sequence.
    pub fn sequence_mut(&mut self, tag: Tag) -> Option<&mut RecordSequence> {
        self.entries
            .entry(tag)
            .or_insert_with(|| AttributeValue::Sequence(RecordSequence::new()))
            .items_mut()
    }

    /// Set the value of an attribute,
    /// returning the previous value if any.
    pub fn set(&mut self, tag: Tag, value: impl Into<AttributeValue>) -> Option<AttributeValue> {
        self.entries.insert(tag, value.into())
    }

    /// Builder-style variant of [`set`](Record::set).
    pub fn with(mut self, tag: Tag, value: impl Into<AttributeValue>) -> Self {
        self.set(tag, value);
        self
    }

    /// Remove an attribute, making it absent.
    pub fn remove(&mut self, tag: Tag) -> Option<AttributeValue> {
        self.entries.remove(&tag)
    }

    /// Remove all attributes.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterate over the attributes in ascending tag order.
    pub fn iter(&self) -> impl Iterator<Item = (Tag, &AttributeValue)> + '_ {
        self.entries.iter().map(|(tag, value)| (*tag, value))
    }

    /// Iterate over the tags of the attributes in ascending order.
    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.entries.keys().copied()
    }
}

impl FromIterator<(Tag, AttributeValue)> for Record {
    fn from_iter<T: IntoIterator<Item = (Tag, AttributeValue)>>(iter: T) -> Self {
        Record {
            entries: iter.into_iter().collect(),
        }
    }
}

impl AttributeProbe for Record {
    fn is_present(&self, tag: Tag) -> bool {
        self.contains(tag)
    }

    fn first_text(&self, tag: Tag) -> Option<String> {
        self.get(tag).and_then(AttributeValue::first_text)
    }
}
