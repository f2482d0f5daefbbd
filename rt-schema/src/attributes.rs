//! The radiotherapy attributes known to the catalog.
//!
//! Names and value kinds are taken from the standard data dictionary.
//! Requirements are context specific,
//! so every attribute is registered as type 3
//! and given its actual type by each record descriptor.
use dicom_core::Tag;
use dicom_dictionary_std::tags;

/// Attribute tag and value multiplicity, grouped by the item they appear in.
///
/// The multiplicity of a sequence is the number of items it admits.
pub(crate) static ATTRIBUTES: &[(Tag, &str)] = &[
    // RT Beams module
    (tags::BEAM_SEQUENCE, "1-n"),
    // beam
    (tags::BEAM_NUMBER, "1"),
    (tags::BEAM_NAME, "1"),
    (tags::BEAM_DESCRIPTION, "1"),
    (tags::BEAM_TYPE, "1"),
    (tags::RADIATION_TYPE, "1"),
    (tags::TREATMENT_MACHINE_NAME, "1"),
    (tags::MANUFACTURER, "1"),
    (tags::INSTITUTION_NAME, "1"),
    (tags::PRIMARY_DOSIMETER_UNIT, "1"),
    (tags::SOURCE_AXIS_DISTANCE, "1"),
    (tags::BEAM_LIMITING_DEVICE_SEQUENCE, "1-n"),
    (tags::REFERENCED_PATIENT_SETUP_NUMBER, "1"),
    (tags::TREATMENT_DELIVERY_TYPE, "1"),
    (tags::REFERENCED_DOSE_SEQUENCE, "1-n"),
    (tags::NUMBER_OF_WEDGES, "1"),
    (tags::WEDGE_SEQUENCE, "1-n"),
    (tags::NUMBER_OF_COMPENSATORS, "1"),
    (tags::NUMBER_OF_BOLI, "1"),
    (tags::NUMBER_OF_BLOCKS, "1"),
    (tags::FINAL_CUMULATIVE_METERSET_WEIGHT, "1"),
    (tags::NUMBER_OF_CONTROL_POINTS, "1"),
    (tags::CONTROL_POINT_SEQUENCE, "1-n"),
    // beam limiting device
    (tags::RT_BEAM_LIMITING_DEVICE_TYPE, "1"),
    (tags::SOURCE_TO_BEAM_LIMITING_DEVICE_DISTANCE, "1"),
    (tags::NUMBER_OF_LEAF_JAW_PAIRS, "1"),
    (tags::LEAF_POSITION_BOUNDARIES, "3-n"),
    // referenced dose
    (tags::REFERENCED_SOP_CLASS_UID, "1"),
    (tags::REFERENCED_SOP_INSTANCE_UID, "1"),
    // wedge
    (tags::WEDGE_NUMBER, "1"),
    (tags::WEDGE_TYPE, "1"),
    (tags::WEDGE_ID, "1"),
    (tags::ACCESSORY_CODE, "1"),
    (tags::WEDGE_ANGLE, "1"),
    (tags::WEDGE_FACTOR, "1"),
    (tags::WEDGE_ORIENTATION, "1"),
    (tags::SOURCE_TO_WEDGE_TRAY_DISTANCE, "1"),
    (tags::EFFECTIVE_WEDGE_ANGLE, "1"),
    // control point
    (tags::CONTROL_POINT_INDEX, "1"),
    (tags::CUMULATIVE_METERSET_WEIGHT, "1"),
    (tags::REFERENCED_DOSE_REFERENCE_SEQUENCE, "1-n"),
    (tags::NOMINAL_BEAM_ENERGY, "1"),
    (tags::DOSE_RATE_SET, "1"),
    (tags::WEDGE_POSITION_SEQUENCE, "1-n"),
    (tags::BEAM_LIMITING_DEVICE_POSITION_SEQUENCE, "1-n"),
    (tags::GANTRY_ANGLE, "1"),
    (tags::GANTRY_ROTATION_DIRECTION, "1"),
    (tags::GANTRY_PITCH_ANGLE, "1"),
    (tags::GANTRY_PITCH_ROTATION_DIRECTION, "1"),
    (tags::BEAM_LIMITING_DEVICE_ANGLE, "1"),
    (tags::BEAM_LIMITING_DEVICE_ROTATION_DIRECTION, "1"),
    (tags::PATIENT_SUPPORT_ANGLE, "1"),
    (tags::PATIENT_SUPPORT_ROTATION_DIRECTION, "1"),
    (tags::TABLE_TOP_ECCENTRIC_AXIS_DISTANCE, "1"),
    (tags::TABLE_TOP_ECCENTRIC_ANGLE, "1"),
    (tags::TABLE_TOP_ECCENTRIC_ROTATION_DIRECTION, "1"),
    (tags::TABLE_TOP_PITCH_ANGLE, "1"),
    (tags::TABLE_TOP_PITCH_ROTATION_DIRECTION, "1"),
    (tags::TABLE_TOP_ROLL_ANGLE, "1"),
    (tags::TABLE_TOP_ROLL_ROTATION_DIRECTION, "1"),
    (tags::TABLE_TOP_VERTICAL_POSITION, "1"),
    (tags::TABLE_TOP_LONGITUDINAL_POSITION, "1"),
    (tags::TABLE_TOP_LATERAL_POSITION, "1"),
    (tags::ISOCENTER_POSITION, "3"),
    (tags::SURFACE_ENTRY_POINT, "3"),
    (tags::SOURCE_TO_SURFACE_DISTANCE, "1"),
    // wedge position
    (tags::REFERENCED_WEDGE_NUMBER, "1"),
    (tags::WEDGE_POSITION, "1"),
    // beam limiting device position
    (tags::LEAF_JAW_POSITIONS, "2-2n"),
    // referenced dose reference
    (tags::REFERENCED_DOSE_REFERENCE_NUMBER, "1"),
    (tags::CUMULATIVE_DOSE_REFERENCE_COEFFICIENT, "1"),
];
