use dicom_core::value::PrimitiveValue;
use dicom_core::VR;
use dicom_dictionary_std::tags;
use dicom_object::InMemDicomObject;
use dicom_record::{
    decode, encode, validate, DataSetHandle, DecodeErrorKind, DecodeOptions, EncodeErrorKind,
    IssueKind, Record, RecordSequence,
};
use dicom_rt_schema::{beam_sequence, control_point_sequence, rt_beams_module};
use dicom_transfer_syntax_registry::entries::EXPLICIT_VR_LITTLE_ENDIAN;
use pretty_assertions::assert_eq;

const RT_DOSE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.481.2";

fn round_trip_bytes(obj: &InMemDicomObject) -> InMemDicomObject {
    let ts = EXPLICIT_VR_LITTLE_ENDIAN.erased();
    let mut bytes = Vec::new();
    obj.write_dataset_with_ts(&mut bytes, &ts)
        .expect("should write data set");
    InMemDicomObject::read_dataset_with_ts(&bytes[..], &ts).expect("should read data set")
}

fn jaw(kind: &str, positions: [f64; 2]) -> Record {
    Record::new()
        .with(tags::RT_BEAM_LIMITING_DEVICE_TYPE, kind)
        .with(tags::LEAF_JAW_POSITIONS, positions)
}

fn control_point(index: i32, weight: f64) -> Record {
    let mut record = Record::new()
        .with(tags::CONTROL_POINT_INDEX, index)
        .with(tags::CUMULATIVE_METERSET_WEIGHT, weight);
    if index == 0 {
        record = record
            .with(tags::NOMINAL_BEAM_ENERGY, 6_f64)
            .with(tags::GANTRY_ANGLE, 0_f64)
            .with(tags::GANTRY_ROTATION_DIRECTION, "NONE")
            .with(tags::BEAM_LIMITING_DEVICE_ANGLE, 0_f64)
            .with(tags::BEAM_LIMITING_DEVICE_ROTATION_DIRECTION, "NONE")
            .with(tags::PATIENT_SUPPORT_ANGLE, 0_f64)
            .with(tags::PATIENT_SUPPORT_ROTATION_DIRECTION, "NONE")
            .with(tags::TABLE_TOP_ECCENTRIC_ANGLE, 0_f64)
            .with(tags::TABLE_TOP_ECCENTRIC_ROTATION_DIRECTION, "NONE")
            .with(tags::TABLE_TOP_PITCH_ANGLE, 0_f32)
            .with(tags::TABLE_TOP_PITCH_ROTATION_DIRECTION, "NONE")
            .with(tags::TABLE_TOP_ROLL_ANGLE, 0.5_f32)
            .with(tags::TABLE_TOP_ROLL_ROTATION_DIRECTION, "CW")
            .with(tags::TABLE_TOP_VERTICAL_POSITION, Vec::<f64>::new())
            .with(tags::TABLE_TOP_LONGITUDINAL_POSITION, Vec::<f64>::new())
            .with(tags::TABLE_TOP_LATERAL_POSITION, Vec::<f64>::new())
            .with(tags::ISOCENTER_POSITION, [12.5_f64, -40.0, 3.25]);
        let positions = record
            .sequence_mut(tags::BEAM_LIMITING_DEVICE_POSITION_SEQUENCE)
            .unwrap();
        positions.append(jaw("ASYMX", [-50.0, 50.0]));
        positions.append(jaw("ASYMY", [-75.5, 75.5]));
    }
    record
}

fn beam(number: i32, wedges: i32) -> Record {
    let mut record = Record::new()
        .with(tags::BEAM_NUMBER, number)
        .with(tags::BEAM_NAME, format!("Beam {}", number))
        .with(tags::BEAM_TYPE, "STATIC")
        .with(tags::RADIATION_TYPE, "PHOTON")
        .with(tags::TREATMENT_MACHINE_NAME, "LINAC1")
        .with(tags::PRIMARY_DOSIMETER_UNIT, "MU")
        .with(tags::SOURCE_AXIS_DISTANCE, 1000_f64)
        .with(tags::NUMBER_OF_WEDGES, wedges)
        .with(tags::NUMBER_OF_COMPENSATORS, 0_i32)
        .with(tags::NUMBER_OF_BOLI, 0_i32)
        .with(tags::NUMBER_OF_BLOCKS, 0_i32)
        .with(tags::FINAL_CUMULATIVE_METERSET_WEIGHT, 1_f64)
        .with(tags::NUMBER_OF_CONTROL_POINTS, 2_i32);

    let devices = record
        .sequence_mut(tags::BEAM_LIMITING_DEVICE_SEQUENCE)
        .unwrap();
    devices.append(
        Record::new()
            .with(tags::RT_BEAM_LIMITING_DEVICE_TYPE, "ASYMX")
            .with(tags::NUMBER_OF_LEAF_JAW_PAIRS, 1_i32),
    );
    devices.append(
        Record::new()
            .with(tags::RT_BEAM_LIMITING_DEVICE_TYPE, "ASYMY")
            .with(tags::NUMBER_OF_LEAF_JAW_PAIRS, 1_i32),
    );

    let control_points = record.sequence_mut(tags::CONTROL_POINT_SEQUENCE).unwrap();
    control_points.append(control_point(0, 0.));
    control_points.append(control_point(1, 1.));
    record
}

fn plan() -> Record {
    Record::new().with(
        tags::BEAM_SEQUENCE,
        [beam(1, 0), beam(2, 0)]
            .into_iter()
            .collect::<RecordSequence>(),
    )
}

#[test]
fn full_beam_survives_encoded_bytes() {
    let module = rt_beams_module().unwrap();
    let plan = plan();
    assert_eq!(validate(&module, &plan), vec![]);

    let obj: InMemDicomObject = encode(&module, &plan).unwrap();
    let decoded = decode(&module, &round_trip_bytes(&obj)).unwrap();
    assert_eq!(decoded, plan);

    let beams = decoded.sequence(tags::BEAM_SEQUENCE).unwrap();
    let jaws = beams
        .get(1)
        .and_then(|beam| beam.sequence(tags::CONTROL_POINT_SEQUENCE))
        .and_then(|cps| cps.get(0))
        .and_then(|cp| cp.sequence(tags::BEAM_LIMITING_DEVICE_POSITION_SEQUENCE))
        .and_then(|jaws| jaws.get(1))
        .unwrap();
    assert_eq!(
        jaws.get_as::<Vec<f64>>(tags::LEAF_JAW_POSITIONS).unwrap(),
        vec![-75.5, 75.5]
    );
}

#[test]
fn type_2_attributes_are_written_empty() {
    let beams = beam_sequence().unwrap();
    let mut record = beam(1, 0);
    record.remove(tags::RADIATION_TYPE);

    let obj: InMemDicomObject = encode(&beams, &record).unwrap();
    let element = obj.element(tags::RADIATION_TYPE).unwrap();
    assert_eq!(element.vr(), VR::CS);
    assert_eq!(element.value().primitive().map(|v| v.multiplicity()), Some(0));

    let decoded = decode(&beams, &obj).unwrap();
    assert!(decoded.get(tags::RADIATION_TYPE).unwrap().is_empty());
}

#[test]
fn wedge_sequence_is_required_with_wedges() {
    let beams = beam_sequence().unwrap();

    // no wedges, no wedge sequence
    let record = beam(1, 0);
    assert!(encode::<InMemDicomObject>(&beams, &record).is_ok());

    // one wedge, but no wedge sequence
    let record = beam(1, 1);
    let issues = validate(&beams, &record);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, IssueKind::MissingAttribute);
    assert_eq!(issues[0].tag, tags::WEDGE_SEQUENCE);

    let err = encode::<InMemDicomObject>(&beams, &record).unwrap_err();
    assert_eq!(err.kind(), EncodeErrorKind::RequiredAttributeAbsent);
    assert_eq!(err.tag(), tags::WEDGE_SEQUENCE);

    // with the wedge described
    let mut record = beam(1, 1);
    record.sequence_mut(tags::WEDGE_SEQUENCE).unwrap().append(
        Record::new()
            .with(tags::WEDGE_NUMBER, 1_i32)
            .with(tags::WEDGE_TYPE, "MOTORIZED")
            .with(tags::WEDGE_ANGLE, 60_i32)
            .with(tags::WEDGE_FACTOR, 0.52_f64)
            .with(tags::WEDGE_ORIENTATION, 0_f64),
    );
    assert_eq!(validate(&beams, &record), vec![]);
    let obj: InMemDicomObject = encode(&beams, &record).unwrap();
    assert_eq!(decode(&beams, &round_trip_bytes(&obj)).unwrap(), record);
}

#[test]
fn first_control_point_requires_machine_angles() {
    let control_points = control_point_sequence().unwrap();

    let mut first = control_point(0, 0.);
    first.remove(tags::GANTRY_ANGLE);
    let mut obj: InMemDicomObject = encode(&control_points, &control_point(0, 0.)).unwrap();
    obj.remove_element(tags::GANTRY_ANGLE);
    let err = decode(&control_points, &obj).unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::MissingRequiredAttribute);
    assert_eq!(err.tag(), tags::GANTRY_ANGLE);
    assert!(validate(&control_points, &first)
        .iter()
        .any(|issue| issue.tag == tags::GANTRY_ANGLE));

    // later control points may leave them out
    let obj: InMemDicomObject = encode(&control_points, &control_point(1, 0.5)).unwrap();
    assert!(obj.element(tags::GANTRY_ANGLE).is_err());
    assert_eq!(
        decode(&control_points, &obj).unwrap(),
        control_point(1, 0.5)
    );
}

#[test]
fn lenient_decoding_of_nonconformant_beam() {
    let module = rt_beams_module().unwrap();
    let obj: InMemDicomObject = encode(&module, &plan()).unwrap();

    // break the second beam: no beam type, odd number of jaw positions
    let mut broken = obj.clone();
    let beams = broken
        .element(tags::BEAM_SEQUENCE)
        .unwrap()
        .value()
        .items()
        .unwrap()
        .to_vec();
    let mut second = beams[1].clone();
    second.remove_element(tags::BEAM_TYPE);
    let mut cps = second
        .element(tags::CONTROL_POINT_SEQUENCE)
        .unwrap()
        .value()
        .items()
        .unwrap()
        .to_vec();
    let mut jaws = cps[0]
        .element(tags::BEAM_LIMITING_DEVICE_POSITION_SEQUENCE)
        .unwrap()
        .value()
        .items()
        .unwrap()
        .to_vec();
    jaws[0]
        .insert_primitive(
            tags::LEAF_JAW_POSITIONS,
            VR::DS,
            PrimitiveValue::from("-50"),
        )
        .unwrap();
    cps[0]
        .insert_sequence(tags::BEAM_LIMITING_DEVICE_POSITION_SEQUENCE, jaws)
        .unwrap();
    second
        .insert_sequence(tags::CONTROL_POINT_SEQUENCE, cps)
        .unwrap();
    broken
        .insert_sequence(tags::BEAM_SEQUENCE, vec![beams[0].clone(), second])
        .unwrap();
    let broken = round_trip_bytes(&broken);

    let err = decode(&module, &broken).unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::MalformedSequence);
    let innermost = err.innermost();
    assert_eq!(innermost.kind(), DecodeErrorKind::MissingRequiredAttribute);
    assert_eq!(innermost.tag(), tags::BEAM_TYPE);
    assert_eq!(innermost.path(), "BeamSequence[1].BeamType");

    let record = DecodeOptions::new().lenient().decode(&module, &broken).unwrap();
    let second = record
        .sequence(tags::BEAM_SEQUENCE)
        .and_then(|beams| beams.get(1))
        .unwrap();
    assert!(!second.contains(tags::BEAM_TYPE));
    let jaw = second
        .sequence(tags::CONTROL_POINT_SEQUENCE)
        .and_then(|cps| cps.get(0))
        .and_then(|cp| cp.sequence(tags::BEAM_LIMITING_DEVICE_POSITION_SEQUENCE))
        .and_then(|jaws| jaws.get(0))
        .unwrap();
    assert_eq!(
        jaw.get_as::<Vec<f64>>(tags::LEAF_JAW_POSITIONS).unwrap(),
        vec![-50.]
    );

    let issues = validate(&module, &record);
    assert!(issues
        .iter()
        .any(|issue| issue.kind == IssueKind::MissingAttribute && issue.tag == tags::BEAM_TYPE));
    assert!(issues
        .iter()
        .any(|issue| issue.kind == IssueKind::MultiplicityViolated
            && issue.path.ends_with("LeafJawPositions")));
}

#[test]
fn referenced_dose_uses_unique_identifiers() {
    let beams = beam_sequence().unwrap();
    let mut record = beam(3, 0);
    record
        .sequence_mut(tags::REFERENCED_DOSE_SEQUENCE)
        .unwrap()
        .append(
            Record::new()
                .with(tags::REFERENCED_SOP_CLASS_UID, RT_DOSE_STORAGE)
                .with(tags::REFERENCED_SOP_INSTANCE_UID, "1.2.3.4.5.6"),
        );

    let obj: InMemDicomObject = encode(&beams, &record).unwrap();
    let decoded = decode(&beams, &round_trip_bytes(&obj)).unwrap();
    let reference = decoded
        .sequence(tags::REFERENCED_DOSE_SEQUENCE)
        .and_then(|refs| refs.get(0))
        .unwrap();
    assert_eq!(
        reference
            .get_as::<String>(tags::REFERENCED_SOP_CLASS_UID)
            .unwrap(),
        RT_DOSE_STORAGE
    );
}
