//! Attribute schema definitions.
//!
//! An [`AttributeSchema`] says everything the codec needs to know
//! about one attribute:
//! its tag, a human readable name,
//! the kind of value it holds ([`ValueKind`], after the DICOM VR),
//! how many values it may hold ([`Multiplicity`], after the DICOM VM),
//! and whether it must be present ([`Requirement`], after the DICOM type).
//!
//! Both multiplicity and requirement can be parsed
//! from the notation used throughout the standard
//! (e.g. `"1-n"`, `"2-2n"`, `"1C"`).

use dicom_core::{Tag, VR};
use snafu::{ensure, Backtrace, OptionExt, ResultExt, Snafu};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// The kind of value held by an attribute.
///
/// Each kind corresponds to exactly one DICOM value representation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKind {
    /// Short Text (ST)
    ShortText,
    /// Long Text (LT)
    LongText,
    /// Short String (SH)
    ShortString,
    /// Long String (LO)
    LongString,
    /// Code String (CS)
    CodeString,
    /// Integer String (IS)
    IntegerString,
    /// Decimal String (DS)
    DecimalString,
    /// Floating Point Single (FL)
    Float32,
    /// Floating Point Double (FD)
    Float64,
    /// Unsigned Short (US)
    Uint16,
    /// Signed Short (SS)
    Sint16,
    /// Signed Long (SL)
    Sint32,
    /// Unsigned Long (UL)
    Uint32,
    /// Date (DA)
    Date,
    /// Time (TM)
    Time,
    /// Person Name (PN)
    PersonName,
    /// Unique Identifier (UI)
    UniqueIdentifier,
    /// Attribute Tag (AT)
    AttributeTag,
    /// Sequence of Items (SQ)
    Sequence,
}

impl ValueKind {
    /// The value representation used to encode this kind of value.
    pub fn vr(self) -> VR {
        match self {
            ValueKind::ShortText => VR::ST,
            ValueKind::LongText => VR::LT,
            ValueKind::ShortString => VR::SH,
            ValueKind::LongString => VR::LO,
            ValueKind::CodeString => VR::CS,
            ValueKind::IntegerString => VR::IS,
            ValueKind::DecimalString => VR::DS,
            ValueKind::Float32 => VR::FL,
            ValueKind::Float64 => VR::FD,
            ValueKind::Uint16 => VR::US,
            ValueKind::Sint16 => VR::SS,
            ValueKind::Sint32 => VR::SL,
            ValueKind::Uint32 => VR::UL,
            ValueKind::Date => VR::DA,
            ValueKind::Time => VR::TM,
            ValueKind::PersonName => VR::PN,
            ValueKind::UniqueIdentifier => VR::UI,
            ValueKind::AttributeTag => VR::AT,
            ValueKind::Sequence => VR::SQ,
        }
    }

    /// Obtain the value kind for the given value representation,
    /// if it is supported.
    pub fn from_vr(vr: VR) -> Option<Self> {
        Some(match vr {
            VR::ST => ValueKind::ShortText,
            VR::LT => ValueKind::LongText,
            VR::SH => ValueKind::ShortString,
            VR::LO => ValueKind::LongString,
            VR::CS => ValueKind::CodeString,
            VR::IS => ValueKind::IntegerString,
            VR::DS => ValueKind::DecimalString,
            VR::FL => ValueKind::Float32,
            VR::FD => ValueKind::Float64,
            VR::US => ValueKind::Uint16,
            VR::SS => ValueKind::Sint16,
            VR::SL => ValueKind::Sint32,
            VR::UL => ValueKind::Uint32,
            VR::DA => ValueKind::Date,
            VR::TM => ValueKind::Time,
            VR::PN => ValueKind::PersonName,
            VR::UI => ValueKind::UniqueIdentifier,
            VR::AT => ValueKind::AttributeTag,
            VR::SQ => ValueKind::Sequence,
            _ => return None,
        })
    }

    /// Whether values of this kind are kept as text in a record.
    pub fn is_textual(self) -> bool {
        matches!(
            self,
            ValueKind::ShortText
                | ValueKind::LongText
                | ValueKind::ShortString
                | ValueKind::LongString
                | ValueKind::CodeString
                | ValueKind::PersonName
                | ValueKind::UniqueIdentifier
        )
    }

    /// Whether this kind describes a sequence of items.
    pub fn is_sequence(self) -> bool {
        self == ValueKind::Sequence
    }

    /// The maximum number of characters of a single value,
    /// for the kinds which are encoded as text.
    ///
    /// Person names are limited per component group.
    pub fn max_length(self) -> Option<usize> {
        match self {
            ValueKind::ShortText => Some(1024),
            ValueKind::LongText => Some(10240),
            ValueKind::ShortString => Some(16),
            ValueKind::LongString => Some(64),
            ValueKind::CodeString => Some(16),
            ValueKind::IntegerString => Some(12),
            ValueKind::DecimalString => Some(16),
            ValueKind::PersonName => Some(64),
            ValueKind::UniqueIdentifier => Some(64),
            _ => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::ShortText => "Short Text",
            ValueKind::LongText => "Long Text",
            ValueKind::ShortString => "Short String",
            ValueKind::LongString => "Long String",
            ValueKind::CodeString => "Code String",
            ValueKind::IntegerString => "Integer String",
            ValueKind::DecimalString => "Decimal String",
            ValueKind::Float32 => "Floating Point Single",
            ValueKind::Float64 => "Floating Point Double",
            ValueKind::Uint16 => "Unsigned Short",
            ValueKind::Sint16 => "Signed Short",
            ValueKind::Sint32 => "Signed Long",
            ValueKind::Uint32 => "Unsigned Long",
            ValueKind::Date => "Date",
            ValueKind::Time => "Time",
            ValueKind::PersonName => "Person Name",
            ValueKind::UniqueIdentifier => "Unique Identifier",
            ValueKind::AttributeTag => "Attribute Tag",
            ValueKind::Sequence => "Sequence of Items",
        };
        write!(f, "{} ({:?})", name, self.vr())
    }
}

/// An error which may occur when parsing a value multiplicity.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum ParseMultiplicityError {
    /// The multiplicity text is empty
    #[snafu(display("Empty value multiplicity"))]
    EmptyMultiplicity { backtrace: Backtrace },
    /// A bound is not a number
    #[snafu(display("Invalid multiplicity bound `{}`", text))]
    InvalidBound {
        text: String,
        backtrace: Backtrace,
        source: std::num::ParseIntError,
    },
    /// The open upper bound must be a multiple of the lower bound
    #[snafu(display("Invalid open multiplicity `{}`", text))]
    InvalidOpenBound { text: String, backtrace: Backtrace },
    #[snafu(display("Lower bound {} exceeds upper bound {}", min, max))]
    ContradictoryBounds {
        min: u32,
        max: u32,
        backtrace: Backtrace,
    },
}

/// The number of values (or sequence items) admitted by an attribute.
///
/// This follows the value multiplicity notation of the standard:
/// `"1"`, `"1-3"`, `"1-n"`, `"2-2n"`.
/// In the last form,
/// the number of values must also be a multiple of the step.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Multiplicity {
    min: u32,
    max: Option<u32>,
    step: u32,
}

impl Multiplicity {
    /// Exactly `n` values.
    pub const fn exactly(n: u32) -> Self {
        Multiplicity {
            min: n,
            max: Some(n),
            step: 1,
        }
    }

    /// Between `min` and `max` values, inclusive.
    ///
    /// Contradictory bounds are not rejected here,
    /// but when building a record descriptor.
    pub const fn range(min: u32, max: u32) -> Self {
        Multiplicity {
            min,
            max: Some(max),
            step: 1,
        }
    }

    /// At least `min` values, with no upper bound (`"min-n"`).
    pub const fn at_least(min: u32) -> Self {
        Multiplicity {
            min,
            max: None,
            step: 1,
        }
    }

    /// At least `min` values, in multiples of `step` (`"2-2n"`).
    pub const fn at_least_in_steps(min: u32, step: u32) -> Self {
        Multiplicity {
            min,
            max: None,
            step,
        }
    }

    /// The minimum number of values.
    pub fn min(&self) -> u32 {
        self.min
    }

    /// The maximum number of values, `None` if unbounded.
    pub fn max(&self) -> Option<u32> {
        self.max
    }

    /// The step between admitted numbers of values.
    pub fn step(&self) -> u32 {
        self.step
    }

    /// Whether the bounds make sense:
    /// the lower bound does not exceed the upper bound
    /// and the step is positive.
    pub fn is_consistent(&self) -> bool {
        self.step > 0 && self.max.map_or(true, |max| self.min <= max)
    }

    /// Check whether the given number of values is admitted.
    pub fn admits(&self, count: u32) -> bool {
        if count < self.min {
            return false;
        }
        if let Some(max) = self.max {
            if count > max {
                return false;
            }
        }
        self.step <= 1 || count % self.step == 0
    }
}

impl Default for Multiplicity {
    fn default() -> Self {
        Multiplicity::exactly(1)
    }
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.max, self.step) {
            (Some(max), _) if max == self.min => write!(f, "{}", self.min),
            (Some(max), _) => write!(f, "{}-{}", self.min, max),
            (None, step) if step > 1 => write!(f, "{}-{}n", self.min, step),
            (None, _) => write!(f, "{}-n", self.min),
        }
    }
}

impl FromStr for Multiplicity {
    type Err = ParseMultiplicityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ensure!(!s.is_empty(), EmptyMultiplicitySnafu);

        let parse_bound = |text: &str| {
            text.parse::<u32>()
                .context(InvalidBoundSnafu { text: text.to_string() })
        };

        let (min, upper) = match s.split_once('-') {
            Some((min, upper)) => (parse_bound(min)?, upper),
            None => {
                let n = parse_bound(s)?;
                return Ok(Multiplicity::exactly(n));
            }
        };

        if let Some(factor) = upper.strip_suffix('n') {
            let step = if factor.is_empty() {
                1
            } else {
                parse_bound(factor)?
            };
            ensure!(
                step > 0 && (step == 1 || min % step == 0),
                InvalidOpenBoundSnafu { text: s.to_string() }
            );
            return Ok(Multiplicity::at_least_in_steps(min, step));
        }

        let max = parse_bound(upper)?;
        ensure!(min <= max, ContradictoryBoundsSnafu { min, max });
        Ok(Multiplicity::range(min, max))
    }
}

/// Access to the attributes of a data set or record
/// for the purpose of evaluating a [`Condition`].
pub trait AttributeProbe {
    /// Whether the attribute is present (even if empty).
    fn is_present(&self, tag: Tag) -> bool;

    /// The first value of the attribute as text,
    /// without padding.
    fn first_text(&self, tag: Tag) -> Option<String>;
}

/// A condition on other attributes of the same data set,
/// which determines whether a conditional attribute is required.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// The attribute is present
    Present(Tag),
    /// The attribute is absent
    Absent(Tag),
    /// The first value of the attribute equals the given text
    Equals(Tag, Cow<'static, str>),
    /// The attribute is present and its first value differs from the given text
    NotEquals(Tag, Cow<'static, str>),
    /// All of the inner conditions hold
    All(Vec<Condition>),
    /// Any of the inner conditions holds
    Any(Vec<Condition>),
}

impl Condition {
    /// Evaluate this condition against the given attribute source.
    pub fn evaluate<P>(&self, probe: &P) -> bool
    where
        P: AttributeProbe + ?Sized,
    {
        match self {
            Condition::Present(tag) => probe.is_present(*tag),
            Condition::Absent(tag) => !probe.is_present(*tag),
            Condition::Equals(tag, text) => probe
                .first_text(*tag)
                .map_or(false, |value| value == text.trim()),
            Condition::NotEquals(tag, text) => probe
                .first_text(*tag)
                .map_or(false, |value| value != text.trim()),
            Condition::All(conditions) => conditions.iter().all(|c| c.evaluate(probe)),
            Condition::Any(conditions) => conditions.iter().any(|c| c.evaluate(probe)),
        }
    }
}

/// Whether an attribute must be present in a data set,
/// following the attribute types of the standard.
#[derive(Debug, Clone, PartialEq)]
pub enum Requirement {
    /// Type 1: must be present with a value.
    Required,
    /// Type 2: must be present, but may be empty.
    RequiredNullable,
    /// Type 1C or 2C: required only when the condition holds.
    ///
    /// A conditional requirement without a condition
    /// cannot be checked and is treated as optional.
    Conditional {
        /// whether the attribute may be empty (type 2C)
        nullable: bool,
        /// the condition under which the attribute is required
        condition: Option<Condition>,
    },
    /// Type 3: may be absent.
    Optional,
}

/// The outcome of resolving a [`Requirement`] against a data set.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Presence {
    /// Must be present with at least one value.
    Required,
    /// Must be present, possibly empty.
    RequiredNullable,
    /// May be absent or empty.
    Optional,
}

impl Presence {
    /// Whether the attribute must be present.
    pub fn is_required(self) -> bool {
        self != Presence::Optional
    }

    /// Whether an empty value is admitted.
    pub fn admits_empty(self) -> bool {
        self != Presence::Required
    }
}

impl Requirement {
    /// Type 1C with the given condition.
    pub fn required_if(condition: Condition) -> Self {
        Requirement::Conditional {
            nullable: false,
            condition: Some(condition),
        }
    }

    /// Type 2C with the given condition.
    pub fn required_nullable_if(condition: Condition) -> Self {
        Requirement::Conditional {
            nullable: true,
            condition: Some(condition),
        }
    }

    /// The attribute type code in the standard's notation.
    pub fn type_code(&self) -> &'static str {
        match self {
            Requirement::Required => "1",
            Requirement::RequiredNullable => "2",
            Requirement::Conditional {
                nullable: false, ..
            } => "1C",
            Requirement::Conditional { nullable: true, .. } => "2C",
            Requirement::Optional => "3",
        }
    }

    /// Determine the effective presence requirement
    /// in the context of the given attribute source.
    pub fn resolve<P>(&self, probe: &P) -> Presence
    where
        P: AttributeProbe + ?Sized,
    {
        match self {
            Requirement::Required => Presence::Required,
            Requirement::RequiredNullable => Presence::RequiredNullable,
            Requirement::Conditional {
                nullable,
                condition: Some(condition),
            } if condition.evaluate(probe) => {
                if *nullable {
                    Presence::RequiredNullable
                } else {
                    Presence::Required
                }
            }
            Requirement::Conditional { .. } => Presence::Optional,
            Requirement::Optional => Presence::Optional,
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type {}", self.type_code())
    }
}

/// An error which may occur when parsing an attribute type code.
#[derive(Debug, Snafu)]
#[snafu(display("Invalid attribute type `{}`", text))]
pub struct ParseRequirementError {
    text: String,
    backtrace: Backtrace,
}

impl FromStr for Requirement {
    type Err = ParseRequirementError;

    /// Parse a type code (`"1"`, `"1C"`, `"2"`, `"2C"` or `"3"`).
    ///
    /// Conditional types are parsed without a condition.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(Requirement::Required),
            "2" => Ok(Requirement::RequiredNullable),
            "1C" => Ok(Requirement::Conditional {
                nullable: false,
                condition: None,
            }),
            "2C" => Ok(Requirement::Conditional {
                nullable: true,
                condition: None,
            }),
            "3" => Ok(Requirement::Optional),
            _ => ParseRequirementSnafu { text: s }.fail(),
        }
    }
}

/// An error which may occur when building an attribute schema
/// from textual codes.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum SchemaCodeError {
    #[snafu(display("Invalid multiplicity for attribute {}", tag))]
    Multiplicity {
        tag: Tag,
        #[snafu(backtrace)]
        source: ParseMultiplicityError,
    },
    #[snafu(display("Invalid type for attribute {}", tag))]
    Type {
        tag: Tag,
        #[snafu(backtrace)]
        source: ParseRequirementError,
    },
    #[snafu(display("Attribute {} has no data dictionary entry", tag))]
    NotInDictionary { tag: Tag, backtrace: Backtrace },
    #[snafu(display("Value representation {:?} of attribute {} is not supported", vr, tag))]
    UnsupportedVr {
        tag: Tag,
        vr: VR,
        backtrace: Backtrace,
    },
}

/// The definition of a single attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSchema {
    tag: Tag,
    name: Cow<'static, str>,
    kind: ValueKind,
    multiplicity: Multiplicity,
    requirement: Requirement,
}

impl AttributeSchema {
    /// Create an optional attribute schema.
    ///
    /// Sequences admit one or more items by default,
    /// other kinds exactly one value.
    pub fn new(tag: Tag, name: impl Into<Cow<'static, str>>, kind: ValueKind) -> Self {
        let multiplicity = if kind.is_sequence() {
            Multiplicity::at_least(1)
        } else {
            Multiplicity::exactly(1)
        };
        AttributeSchema {
            tag,
            name: name.into(),
            kind,
            multiplicity,
            requirement: Requirement::Optional,
        }
    }

    /// Create an attribute schema from the multiplicity and type codes
    /// written in the standard (e.g. `"1-n"` and `"1C"`).
    pub fn from_codes(
        tag: Tag,
        name: impl Into<Cow<'static, str>>,
        kind: ValueKind,
        vm: &str,
        type_code: &str,
    ) -> Result<Self, SchemaCodeError> {
        let multiplicity = vm.parse().context(MultiplicitySnafu { tag })?;
        let requirement = type_code.parse().context(TypeSnafu { tag })?;
        Ok(AttributeSchema::new(tag, name, kind)
            .with_multiplicity(multiplicity)
            .with_requirement(requirement))
    }

    /// Create an attribute schema
    /// with the name and value kind from the standard data dictionary.
    pub fn from_dictionary(
        tag: Tag,
        vm: &str,
        type_code: &str,
    ) -> Result<Self, SchemaCodeError> {
        use dicom_core::dictionary::{DataDictionary, DataDictionaryEntry};
        use dicom_dictionary_std::StandardDataDictionary;

        let dictionary = StandardDataDictionary;
        let entry = dictionary
            .by_tag(tag)
            .context(NotInDictionarySnafu { tag })?;
        let vr = entry.vr().relaxed();
        let kind = ValueKind::from_vr(vr).context(UnsupportedVrSnafu { tag, vr })?;
        AttributeSchema::from_codes(tag, entry.alias().to_string(), kind, vm, type_code)
    }

    /// Derive a schema with a different value multiplicity.
    pub fn with_multiplicity(mut self, multiplicity: Multiplicity) -> Self {
        self.multiplicity = multiplicity;
        self
    }

    /// Derive a schema with a different requirement.
    pub fn with_requirement(mut self, requirement: Requirement) -> Self {
        self.requirement = requirement;
        self
    }

    /// The attribute tag.
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// The attribute name, usually its keyword in UpperCamelCase.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The kind of value held.
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// The admitted number of values or items.
    pub fn multiplicity(&self) -> Multiplicity {
        self.multiplicity
    }

    /// The presence requirement.
    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }
}

impl fmt::Display for AttributeSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {:?} VM {} {}",
            self.tag,
            self.name,
            self.kind.vr(),
            self.multiplicity,
            self.requirement
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    #[test]
    fn parse_multiplicity() {
        let vm: Multiplicity = "1".parse().unwrap();
        assert_eq!(vm, Multiplicity::exactly(1));

        let vm: Multiplicity = "1-3".parse().unwrap();
        assert_eq!(vm, Multiplicity::range(1, 3));

        let vm: Multiplicity = "1-n".parse().unwrap();
        assert_eq!(vm, Multiplicity::at_least(1));
        assert_eq!(vm.max(), None);

        let vm: Multiplicity = "2-2n".parse().unwrap();
        assert_eq!(vm, Multiplicity::at_least_in_steps(2, 2));

        assert!("".parse::<Multiplicity>().is_err());
        assert!("x".parse::<Multiplicity>().is_err());
        assert!("3-1".parse::<Multiplicity>().is_err());
        assert!("3-2n".parse::<Multiplicity>().is_err());
    }

    #[rstest]
    #[case("1")]
    #[case("3")]
    #[case("1-3")]
    #[case("1-n")]
    #[case("2-2n")]
    #[case("3-3n")]
    fn multiplicity_display_round_trips(#[case] text: &str) {
        let vm: Multiplicity = text.parse().unwrap();
        assert_eq!(vm.to_string(), text);
    }

    #[test]
    fn multiplicity_admits() {
        let triple = Multiplicity::exactly(3);
        assert!(!triple.admits(2));
        assert!(triple.admits(3));
        assert!(!triple.admits(4));

        let pairs = Multiplicity::at_least_in_steps(2, 2);
        assert!(!pairs.admits(0));
        assert!(pairs.admits(2));
        assert!(!pairs.admits(3));
        assert!(pairs.admits(120));

        let open = Multiplicity::at_least(1);
        assert!(!open.admits(0));
        assert!(open.admits(1));
        assert!(open.admits(1000));

        assert!(!Multiplicity::range(3, 1).is_consistent());
        assert!(!Multiplicity::at_least_in_steps(1, 0).is_consistent());
    }

    #[test]
    fn parse_requirement() {
        assert_eq!("1".parse::<Requirement>().unwrap(), Requirement::Required);
        assert_eq!(
            "2".parse::<Requirement>().unwrap(),
            Requirement::RequiredNullable
        );
        assert_eq!("3".parse::<Requirement>().unwrap(), Requirement::Optional);
        assert_eq!(
            "2C".parse::<Requirement>().unwrap(),
            Requirement::Conditional {
                nullable: true,
                condition: None
            }
        );
        assert!("4".parse::<Requirement>().is_err());

        for code in ["1", "1C", "2", "2C", "3"] {
            assert_eq!(code.parse::<Requirement>().unwrap().type_code(), code);
        }
    }

    struct MapProbe(HashMap<Tag, &'static str>);

    impl AttributeProbe for MapProbe {
        fn is_present(&self, tag: Tag) -> bool {
            self.0.contains_key(&tag)
        }

        fn first_text(&self, tag: Tag) -> Option<String> {
            self.0.get(&tag).map(|s| s.to_string())
        }
    }

    #[test]
    fn conditions_and_requirements() {
        let wedges = Tag(0x300A, 0x00D0);
        let device = Tag(0x300A, 0x00B8);
        let probe = MapProbe(HashMap::from([(wedges, "2"), (device, "MLCX")]));

        assert!(Condition::Present(wedges).evaluate(&probe));
        assert!(!Condition::Absent(wedges).evaluate(&probe));
        assert!(Condition::NotEquals(wedges, "0".into()).evaluate(&probe));
        assert!(!Condition::NotEquals(Tag(0x0008, 0x0060), "0".into()).evaluate(&probe));
        assert!(Condition::Any(vec![
            Condition::Equals(device, "MLCY".into()),
            Condition::Equals(device, "MLCX".into()),
        ])
        .evaluate(&probe));
        assert!(!Condition::All(vec![
            Condition::Present(wedges),
            Condition::Equals(device, "ASYMX".into()),
        ])
        .evaluate(&probe));

        let req = Requirement::required_if(Condition::Equals(wedges, "2".into()));
        assert_eq!(req.resolve(&probe), Presence::Required);
        let req = Requirement::required_nullable_if(Condition::Equals(wedges, "1".into()));
        assert_eq!(req.resolve(&probe), Presence::Optional);
        let req: Requirement = "1C".parse().unwrap();
        assert_eq!(req.resolve(&probe), Presence::Optional);
    }

    #[test]
    fn schema_from_codes() {
        let schema = AttributeSchema::from_codes(
            Tag(0x300A, 0x012C),
            "IsocenterPosition",
            ValueKind::DecimalString,
            "3",
            "2C",
        )
        .unwrap();
        assert_eq!(schema.multiplicity(), Multiplicity::exactly(3));
        assert_eq!(schema.requirement().type_code(), "2C");
        assert_eq!(schema.kind().vr(), VR::DS);

        assert!(matches!(
            AttributeSchema::from_codes(
                Tag(0x300A, 0x012C),
                "X",
                ValueKind::DecimalString,
                "3",
                "0"
            ),
            Err(SchemaCodeError::Type { .. })
        ));
    }

    #[test]
    fn schema_from_dictionary() {
        let schema = AttributeSchema::from_dictionary(Tag(0x0010, 0x0010), "1", "2").unwrap();
        assert_eq!(schema.name(), "PatientName");
        assert_eq!(schema.kind(), ValueKind::PersonName);
        assert_eq!(schema.requirement(), &Requirement::RequiredNullable);

        // pixel data is binary
        assert!(matches!(
            AttributeSchema::from_dictionary(Tag(0x7FE0, 0x0010), "1", "1"),
            Err(SchemaCodeError::UnsupportedVr { .. })
        ));
    }

    #[test]
    fn value_kind_vr_mapping() {
        for kind in [
            ValueKind::ShortText,
            ValueKind::LongString,
            ValueKind::IntegerString,
            ValueKind::DecimalString,
            ValueKind::Float32,
            ValueKind::Sint32,
            ValueKind::Date,
            ValueKind::AttributeTag,
            ValueKind::Sequence,
        ] {
            assert_eq!(ValueKind::from_vr(kind.vr()), Some(kind));
        }
        assert_eq!(ValueKind::from_vr(VR::OB), None);
    }
}
