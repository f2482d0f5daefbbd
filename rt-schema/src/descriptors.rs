//! Record descriptors of the RT Beams module and its sequences.
//!
//! Each function describes the items of one sequence attribute,
//! composed from the [catalog registry](crate::registry).
//! Conditions which depend on data outside of the item
//! (for instance, whether a value changed since the previous control point)
//! cannot be checked and leave the attribute optional.
use crate::{registry, BuildDescriptorSnafu, Error};
use dicom_dictionary_std::tags;
use dicom_record::{Condition, RecordDescriptor, RecordDescriptorBuilder, Requirement};
use once_cell::sync::OnceCell;
use snafu::ResultExt;
use std::sync::Arc;

static RT_BEAMS_MODULE: OnceCell<Arc<RecordDescriptor>> = OnceCell::new();

/// Type 1C without a checkable condition.
const UNCHECKED_1C: Requirement = Requirement::Conditional {
    nullable: false,
    condition: None,
};

/// Required in the first control point of a beam.
fn in_first_control_point() -> Condition {
    Condition::Equals(tags::CONTROL_POINT_INDEX, "0".into())
}

fn build(
    name: &'static str,
    builder: RecordDescriptorBuilder,
) -> Result<Arc<RecordDescriptor>, Error> {
    builder
        .build()
        .map(Arc::new)
        .context(BuildDescriptorSnafu { name })
}

/// Items of the Referenced Dose Sequence.
pub fn referenced_dose_sequence() -> Result<Arc<RecordDescriptor>, Error> {
    let r = registry()?;
    build(
        "ReferencedDoseSequence",
        RecordDescriptor::builder("ReferencedDoseSequence")
            .registered(r, tags::REFERENCED_SOP_CLASS_UID, Requirement::Required)
            .registered(r, tags::REFERENCED_SOP_INSTANCE_UID, Requirement::Required),
    )
}

/// Items of the Referenced Dose Reference Sequence of a control point.
pub fn referenced_dose_reference_sequence() -> Result<Arc<RecordDescriptor>, Error> {
    let r = registry()?;
    build(
        "ReferencedDoseReferenceSequence",
        RecordDescriptor::builder("ReferencedDoseReferenceSequence")
            .registered(r, tags::REFERENCED_DOSE_REFERENCE_NUMBER, Requirement::Required)
            .registered(
                r,
                tags::CUMULATIVE_DOSE_REFERENCE_COEFFICIENT,
                Requirement::RequiredNullable,
            ),
    )
}

/// Items of the Wedge Position Sequence of a control point.
pub fn wedge_position_sequence() -> Result<Arc<RecordDescriptor>, Error> {
    let r = registry()?;
    build(
        "WedgePositionSequence",
        RecordDescriptor::builder("WedgePositionSequence")
            .registered(r, tags::REFERENCED_WEDGE_NUMBER, Requirement::Required)
            .registered(r, tags::WEDGE_POSITION, Requirement::Required),
    )
}

/// Items of the Beam Limiting Device Position Sequence of a control point.
pub fn beam_limiting_device_position_sequence() -> Result<Arc<RecordDescriptor>, Error> {
    let r = registry()?;
    build(
        "BeamLimitingDevicePositionSequence",
        RecordDescriptor::builder("BeamLimitingDevicePositionSequence")
            .registered(r, tags::RT_BEAM_LIMITING_DEVICE_TYPE, Requirement::Required)
            .registered(r, tags::LEAF_JAW_POSITIONS, Requirement::Required),
    )
}

/// Items of the Beam Limiting Device Sequence of a beam.
///
/// Leaf position boundaries are required for multileaf collimators.
pub fn beam_limiting_device_sequence() -> Result<Arc<RecordDescriptor>, Error> {
    let r = registry()?;
    let multileaf = Condition::Any(vec![
        Condition::Equals(tags::RT_BEAM_LIMITING_DEVICE_TYPE, "MLCX".into()),
        Condition::Equals(tags::RT_BEAM_LIMITING_DEVICE_TYPE, "MLCY".into()),
    ]);
    build(
        "BeamLimitingDeviceSequence",
        RecordDescriptor::builder("BeamLimitingDeviceSequence")
            .registered(r, tags::RT_BEAM_LIMITING_DEVICE_TYPE, Requirement::Required)
            .registered(
                r,
                tags::SOURCE_TO_BEAM_LIMITING_DEVICE_DISTANCE,
                Requirement::Optional,
            )
            .registered(r, tags::NUMBER_OF_LEAF_JAW_PAIRS, Requirement::Required)
            .registered(
                r,
                tags::LEAF_POSITION_BOUNDARIES,
                Requirement::required_nullable_if(multileaf),
            ),
    )
}

/// Items of the Wedge Sequence of a beam.
pub fn wedge_sequence() -> Result<Arc<RecordDescriptor>, Error> {
    let r = registry()?;
    build(
        "WedgeSequence",
        RecordDescriptor::builder("WedgeSequence")
            .registered(r, tags::WEDGE_NUMBER, Requirement::Required)
            .registered(r, tags::WEDGE_TYPE, Requirement::RequiredNullable)
            .registered(r, tags::WEDGE_ID, Requirement::Optional)
            .registered(r, tags::ACCESSORY_CODE, Requirement::Optional)
            .registered(r, tags::WEDGE_ANGLE, Requirement::RequiredNullable)
            .registered(r, tags::WEDGE_FACTOR, Requirement::RequiredNullable)
            .registered(r, tags::WEDGE_ORIENTATION, Requirement::RequiredNullable)
            .registered(r, tags::SOURCE_TO_WEDGE_TRAY_DISTANCE, Requirement::Optional)
            .registered(r, tags::EFFECTIVE_WEDGE_ANGLE, Requirement::Optional),
    )
}

/// Items of the Control Point Sequence of a beam.
///
/// Machine angles and directions are required in the first control point,
/// which is the one with index 0.
pub fn control_point_sequence() -> Result<Arc<RecordDescriptor>, Error> {
    let r = registry()?;
    let first = || Requirement::required_if(in_first_control_point());
    let first_nullable = || Requirement::required_nullable_if(in_first_control_point());

    let builder = RecordDescriptor::builder("ControlPointSequence")
        .registered(r, tags::CONTROL_POINT_INDEX, Requirement::Required)
        .registered(r, tags::CUMULATIVE_METERSET_WEIGHT, Requirement::RequiredNullable)
        .registered_sequence(
            r,
            tags::REFERENCED_DOSE_REFERENCE_SEQUENCE,
            Requirement::Optional,
            referenced_dose_reference_sequence()?,
        )
        .registered_sequence(
            r,
            tags::REFERENCED_DOSE_SEQUENCE,
            UNCHECKED_1C,
            referenced_dose_sequence()?,
        )
        .registered(r, tags::NOMINAL_BEAM_ENERGY, Requirement::Optional)
        .registered(r, tags::DOSE_RATE_SET, Requirement::Optional)
        .registered_sequence(
            r,
            tags::WEDGE_POSITION_SEQUENCE,
            UNCHECKED_1C,
            wedge_position_sequence()?,
        )
        .registered_sequence(
            r,
            tags::BEAM_LIMITING_DEVICE_POSITION_SEQUENCE,
            first(),
            beam_limiting_device_position_sequence()?,
        );

    let builder = builder
        .registered(r, tags::GANTRY_ANGLE, first())
        .registered(r, tags::GANTRY_ROTATION_DIRECTION, first())
        .registered(r, tags::GANTRY_PITCH_ANGLE, Requirement::Optional)
        .registered(r, tags::GANTRY_PITCH_ROTATION_DIRECTION, Requirement::Optional)
        .registered(r, tags::BEAM_LIMITING_DEVICE_ANGLE, first())
        .registered(r, tags::BEAM_LIMITING_DEVICE_ROTATION_DIRECTION, first())
        .registered(r, tags::PATIENT_SUPPORT_ANGLE, first())
        .registered(r, tags::PATIENT_SUPPORT_ROTATION_DIRECTION, first())
        .registered(r, tags::TABLE_TOP_ECCENTRIC_AXIS_DISTANCE, Requirement::Optional)
        .registered(r, tags::TABLE_TOP_ECCENTRIC_ANGLE, first())
        .registered(r, tags::TABLE_TOP_ECCENTRIC_ROTATION_DIRECTION, first())
        .registered(r, tags::TABLE_TOP_PITCH_ANGLE, first())
        .registered(r, tags::TABLE_TOP_PITCH_ROTATION_DIRECTION, first())
        .registered(r, tags::TABLE_TOP_ROLL_ANGLE, first())
        .registered(r, tags::TABLE_TOP_ROLL_ROTATION_DIRECTION, first())
        .registered(r, tags::TABLE_TOP_VERTICAL_POSITION, first_nullable())
        .registered(r, tags::TABLE_TOP_LONGITUDINAL_POSITION, first_nullable())
        .registered(r, tags::TABLE_TOP_LATERAL_POSITION, first_nullable())
        .registered(r, tags::ISOCENTER_POSITION, first_nullable())
        .registered(r, tags::SURFACE_ENTRY_POINT, Requirement::Optional)
        .registered(r, tags::SOURCE_TO_SURFACE_DISTANCE, Requirement::Optional);

    build("ControlPointSequence", builder)
}

/// Items of the Beam Sequence.
///
/// The Wedge Sequence is required
/// when the Number of Wedges is not zero.
pub fn beam_sequence() -> Result<Arc<RecordDescriptor>, Error> {
    let r = registry()?;
    let has_wedges = Condition::NotEquals(tags::NUMBER_OF_WEDGES, "0".into());
    let builder = RecordDescriptor::builder("BeamSequence")
        .registered(r, tags::BEAM_NUMBER, Requirement::Required)
        .registered(r, tags::BEAM_NAME, Requirement::Optional)
        .registered(r, tags::BEAM_DESCRIPTION, Requirement::Optional)
        .registered(r, tags::BEAM_TYPE, Requirement::Required)
        .registered(r, tags::RADIATION_TYPE, Requirement::RequiredNullable)
        .registered(r, tags::TREATMENT_MACHINE_NAME, Requirement::RequiredNullable)
        .registered(r, tags::MANUFACTURER, Requirement::Optional)
        .registered(r, tags::INSTITUTION_NAME, Requirement::Optional)
        .registered(r, tags::PRIMARY_DOSIMETER_UNIT, Requirement::Optional)
        .registered(r, tags::SOURCE_AXIS_DISTANCE, Requirement::Optional)
        .registered_sequence(
            r,
            tags::BEAM_LIMITING_DEVICE_SEQUENCE,
            Requirement::Required,
            beam_limiting_device_sequence()?,
        )
        .registered(r, tags::REFERENCED_PATIENT_SETUP_NUMBER, Requirement::Optional)
        .registered(r, tags::TREATMENT_DELIVERY_TYPE, Requirement::Optional)
        .registered_sequence(
            r,
            tags::REFERENCED_DOSE_SEQUENCE,
            Requirement::Optional,
            referenced_dose_sequence()?,
        )
        .registered(r, tags::NUMBER_OF_WEDGES, Requirement::Required)
        .registered_sequence(
            r,
            tags::WEDGE_SEQUENCE,
            Requirement::required_if(has_wedges),
            wedge_sequence()?,
        )
        .registered(r, tags::NUMBER_OF_COMPENSATORS, Requirement::Required)
        .registered(r, tags::NUMBER_OF_BOLI, Requirement::Required)
        .registered(r, tags::NUMBER_OF_BLOCKS, Requirement::Required)
        .registered(r, tags::FINAL_CUMULATIVE_METERSET_WEIGHT, UNCHECKED_1C)
        .registered(r, tags::NUMBER_OF_CONTROL_POINTS, Requirement::Required)
        .registered_sequence(
            r,
            tags::CONTROL_POINT_SEQUENCE,
            Requirement::Required,
            control_point_sequence()?,
        );
    build("BeamSequence", builder)
}

/// The RT Beams module of an RT Plan.
///
/// The descriptor is built on first use and shared afterwards.
pub fn rt_beams_module() -> Result<Arc<RecordDescriptor>, Error> {
    RT_BEAMS_MODULE
        .get_or_try_init(|| {
            let r = registry()?;
            build(
                "RTBeamsModule",
                RecordDescriptor::builder("RTBeamsModule").registered_sequence(
                    r,
                    tags::BEAM_SEQUENCE,
                    Requirement::Required,
                    beam_sequence()?,
                ),
            )
        })
        .map(Arc::clone)
}
