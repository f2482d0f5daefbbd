//! Conformance checking of records.
//!
//! [`validate`] runs the same checks as encoding and decoding,
//! plus checks on the content of each value,
//! but collects every finding instead of stopping at the first one.
//! Each finding is also logged as a warning.

use crate::dataset::keeps_leading_spaces;
use crate::decode::child_path;
use crate::descriptor::RecordDescriptor;
use crate::encode::format_decimal;
use crate::record::Record;
use crate::schema::{AttributeSchema, Presence, ValueKind};
use crate::value::AttributeValue;
use dicom_core::Tag;
use std::fmt;

/// The kind of problem found by [`validate`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum IssueKind {
    /// A required attribute is absent
    MissingAttribute,
    /// An attribute which must have a value is empty
    EmptyValue,
    /// The number of values or items is not admitted
    MultiplicityViolated,
    /// The value does not fit the declared kind
    ValueKindMismatch,
    /// A sequence has no items and would not be written as such
    EmptySequence,
    /// A text value contains characters not allowed by its kind
    InvalidCharacter,
    /// A text value is longer than its kind allows
    MaximumLengthViolated,
    /// A number cannot be represented in its kind
    InvalidNumber,
    /// A text value has padding which would not be read back
    PaddedText,
    /// The record holds an attribute which is not described
    UnknownAttribute,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IssueKind::MissingAttribute => "missing attribute",
            IssueKind::EmptyValue => "empty value",
            IssueKind::MultiplicityViolated => "value multiplicity violated",
            IssueKind::ValueKindMismatch => "value kind mismatch",
            IssueKind::EmptySequence => "empty sequence",
            IssueKind::InvalidCharacter => "invalid character",
            IssueKind::MaximumLengthViolated => "maximum length violated",
            IssueKind::InvalidNumber => "invalid number",
            IssueKind::PaddedText => "padded text",
            IssueKind::UnknownAttribute => "unknown attribute",
        };
        f.write_str(s)
    }
}

/// A conformance problem found in a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// the kind of problem
    pub kind: IssueKind,
    /// the attribute concerned
    pub tag: Tag,
    /// the path of the attribute from the root record
    pub path: String,
    /// a description of the problem
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {}: {}",
            self.path, self.kind, self.tag, self.message
        )
    }
}

/// Check a record against its descriptor,
/// returning every problem found.
///
/// An empty list means that the record
/// can be encoded and decoded back without loss.
pub fn validate(descriptor: &RecordDescriptor, record: &Record) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    validate_item(descriptor, record, "", &mut issues);
    for issue in &issues {
        tracing::warn!("{}", issue);
    }
    issues
}

fn validate_item(
    descriptor: &RecordDescriptor,
    record: &Record,
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    let mut push = |kind, tag, path: String, message: String| {
        issues.push(ValidationIssue {
            kind,
            tag,
            path,
            message,
        })
    };

    for tag in record.tags() {
        if descriptor.attribute(tag).is_none() {
            push(
                IssueKind::UnknownAttribute,
                tag,
                path.to_string(),
                format!("not part of {}", descriptor.name()),
            );
        }
    }

    let mut nested_work = Vec::new();
    for schema in descriptor.attributes() {
        let tag = schema.tag();
        let attribute_path = child_path(path, schema.name());
        let presence = schema.requirement().resolve(record);

        let Some(value) = record.get(tag) else {
            if presence.is_required() {
                push(
                    IssueKind::MissingAttribute,
                    tag,
                    attribute_path,
                    format!("{} ({}) is absent", schema.name(), schema.requirement()),
                );
            }
            continue;
        };

        if !value.fits(schema.kind()) {
            push(
                IssueKind::ValueKindMismatch,
                tag,
                attribute_path,
                format!("expected {}, found {}", schema.kind(), value.type_name()),
            );
            continue;
        }

        let count = if is_blank(value) {
            0
        } else {
            value.multiplicity()
        };
        if let AttributeValue::Sequence(items) = value {
            if items.is_empty() {
                if presence != Presence::RequiredNullable {
                    push(
                        IssueKind::EmptySequence,
                        tag,
                        attribute_path,
                        format!("{} has no items", schema.name()),
                    );
                }
                continue;
            }
            if !schema.multiplicity().admits(count) {
                push(
                    IssueKind::MultiplicityViolated,
                    tag,
                    attribute_path.clone(),
                    format!("{} items, expected {}", count, schema.multiplicity()),
                );
            }
            if let Some(nested) = descriptor.nested(tag) {
                nested_work.push((nested, items, attribute_path));
            }
            continue;
        }

        if count == 0 {
            if !presence.admits_empty() {
                push(
                    IssueKind::EmptyValue,
                    tag,
                    attribute_path,
                    format!("{} must have a value", schema.name()),
                );
            } else if !value.is_empty() {
                push(
                    IssueKind::PaddedText,
                    tag,
                    attribute_path,
                    "a blank value is read back as an empty value".to_string(),
                );
            }
            continue;
        }
        if !schema.multiplicity().admits(count) {
            push(
                IssueKind::MultiplicityViolated,
                tag,
                attribute_path.clone(),
                format!("{} values, expected {}", count, schema.multiplicity()),
            );
        }
        for (kind, message) in check_content(schema, value) {
            push(kind, tag, attribute_path.clone(), message);
        }
    }

    for (nested, items, attribute_path) in nested_work {
        for (index, item) in items.iter().enumerate() {
            let item_path = format!("{}[{}]", attribute_path, index);
            validate_item(nested, item, &item_path, issues);
        }
    }
}

/// Check the values themselves,
/// reporting each kind of problem at most once per attribute.
fn check_content(schema: &AttributeSchema, value: &AttributeValue) -> Vec<(IssueKind, String)> {
    let kind = schema.kind();
    let mut found: Vec<(IssueKind, String)> = Vec::new();
    let mut report = |issue: IssueKind, message: String| {
        if !found.iter().any(|(k, _)| *k == issue) {
            found.push((issue, message));
        }
    };

    match value {
        AttributeValue::Strs(values) => {
            for text in values {
                if has_padding(kind, text) {
                    report(
                        IssueKind::PaddedText,
                        format!("`{}` has padding which is not kept", text),
                    );
                }
                if let Some(c) = text.chars().find(|c| !is_allowed_char(kind, *c)) {
                    report(
                        IssueKind::InvalidCharacter,
                        format!("{:?} is not allowed in {}", c, kind),
                    );
                }
                check_length(kind, text, &mut report);
            }
        }
        AttributeValue::I32(values) if kind == ValueKind::IntegerString => {
            for v in values {
                if *v == i32::MIN {
                    report(
                        IssueKind::InvalidNumber,
                        format!("{} is out of range for {}", v, kind),
                    );
                }
                check_length(kind, &v.to_string(), &mut report);
            }
        }
        AttributeValue::F64(values) if kind == ValueKind::DecimalString => {
            for v in values {
                if !v.is_finite() {
                    report(
                        IssueKind::InvalidNumber,
                        format!("{} cannot be written as {}", v, kind),
                    );
                    continue;
                }
                check_length(kind, &format_decimal(*v), &mut report);
            }
        }
        _ => {}
    }
    found
}

/// Whether the value is a single string holding nothing but padding,
/// which is read back as no value at all.
fn is_blank(value: &AttributeValue) -> bool {
    match value {
        AttributeValue::Strs(values) => {
            values.len() == 1 && values[0].trim_matches([' ', '\0']).is_empty()
        }
        _ => false,
    }
}

/// Whether the text starts or ends with padding
/// which is removed when the value is read.
fn has_padding(kind: ValueKind, text: &str) -> bool {
    text.ends_with([' ', '\0']) || (!keeps_leading_spaces(kind) && text.starts_with(' '))
}

fn check_length(kind: ValueKind, text: &str, report: &mut impl FnMut(IssueKind, String)) {
    if let Some(max) = kind.max_length() {
        if text.len() > max {
            report(
                IssueKind::MaximumLengthViolated,
                format!("`{}` is longer than {} characters", text, max),
            );
        }
    }
}

/// Whether the character may appear in a value of this kind.
fn is_allowed_char(kind: ValueKind, c: char) -> bool {
    match kind {
        ValueKind::CodeString => {
            c.is_ascii_uppercase() || c.is_ascii_digit() || c == ' ' || c == '_'
        }
        ValueKind::UniqueIdentifier => c.is_ascii_digit() || c == '.',
        // free text may hold line breaks and backslashes
        ValueKind::ShortText | ValueKind::LongText => {
            !c.is_control() || matches!(c, '\n' | '\r' | '\t' | '\x0c' | '\x1b')
        }
        // backslash separates values
        _ => c != '\\' && (!c.is_control() || c == '\x1b'),
    }
}
