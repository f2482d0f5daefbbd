//! This crate provides a catalog of radiotherapy attribute schemas
//! and record descriptors for [`dicom_record`],
//! covering the RT Beams module of an RT Plan
//! down to its control points.
//!
//! - [`registry`] retrieves the shared attribute registry,
//!   built from the standard data dictionary on first use.
//! - The functions in [`descriptors`]
//!   describe the items of each sequence,
//!   with the requirements the attributes have in that context.
//!
//! # Example
//!
//! ```
//! use dicom_dictionary_std::tags;
//! use dicom_object::InMemDicomObject;
//! use dicom_record::{encode, validate, Record};
//! use dicom_rt_schema::descriptors::wedge_sequence;
//!
//! # fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let descriptor = wedge_sequence()?;
//! let wedge = Record::new()
//!     .with(tags::WEDGE_NUMBER, 1_i32)
//!     .with(tags::WEDGE_TYPE, "STANDARD")
//!     .with(tags::WEDGE_ANGLE, 45_i32)
//!     .with(tags::WEDGE_FACTOR, 0.77_f64)
//!     .with(tags::WEDGE_ORIENTATION, 90_f64);
//! assert!(validate(&descriptor, &wedge).is_empty());
//!
//! let obj: InMemDicomObject = encode(&descriptor, &wedge)?;
//! assert_eq!(obj.element(tags::WEDGE_ANGLE)?.to_str()?, "45");
//! # Ok(())
//! # }
//! # run().unwrap();
//! ```
use dicom_record::{DescriptorError, FrozenSchemaRegistry, RegistryError, SchemaRegistry};
use once_cell::sync::OnceCell;
use snafu::{ResultExt, Snafu};
use tracing::debug;

mod attributes;
pub mod descriptors;

pub use descriptors::{
    beam_limiting_device_position_sequence, beam_limiting_device_sequence, beam_sequence,
    control_point_sequence, referenced_dose_reference_sequence, referenced_dose_sequence,
    rt_beams_module, wedge_position_sequence, wedge_sequence,
};

static REGISTRY: OnceCell<FrozenSchemaRegistry> = OnceCell::new();

/// An error which may occur when building the catalog.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// The attribute registry could not be built
    #[snafu(display("Could not build the attribute registry"))]
    BuildRegistry {
        #[snafu(backtrace)]
        source: RegistryError,
    },
    /// A record descriptor could not be built
    #[snafu(display("Could not build descriptor `{}`", name))]
    BuildDescriptor {
        name: &'static str,
        #[snafu(backtrace)]
        source: DescriptorError,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Retrieve the registry of radiotherapy attributes.
///
/// The registry is built on the first successful call
/// and shared by all later calls.
pub fn registry() -> Result<&'static FrozenSchemaRegistry> {
    REGISTRY.get_or_try_init(|| {
        let mut registry = SchemaRegistry::new();
        for &(tag, vm) in attributes::ATTRIBUTES {
            registry
                .register_standard(tag, vm, "3")
                .context(BuildRegistrySnafu)?;
        }
        debug!("Built radiotherapy registry with {} attributes", registry.len());
        Ok(registry.freeze())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_dictionary_std::tags;
    use dicom_record::{SchemaLookup, ValueKind};

    #[test]
    fn registry_is_built_from_the_dictionary() {
        let registry = registry().unwrap();
        assert_eq!(registry.len(), attributes::ATTRIBUTES.len());

        let schema = registry.lookup(tags::LEAF_JAW_POSITIONS).unwrap();
        assert_eq!(schema.name(), "LeafJawPositions");
        assert_eq!(schema.kind(), ValueKind::DecimalString);
        assert!(schema.multiplicity().admits(4));
        assert!(!schema.multiplicity().admits(3));

        let schema = registry.lookup_by_name("GantryPitchAngle").unwrap();
        assert_eq!(schema.tag(), tags::GANTRY_PITCH_ANGLE);
        assert_eq!(schema.kind(), ValueKind::Float32);

        assert_eq!(
            registry.lookup(tags::CONTROL_POINT_SEQUENCE).map(|s| s.kind()),
            Some(ValueKind::Sequence)
        );
    }

    #[test]
    fn registry_is_shared() {
        let a = registry().unwrap() as *const FrozenSchemaRegistry;
        let b = registry().unwrap() as *const FrozenSchemaRegistry;
        assert_eq!(a, b);
    }

    #[test]
    fn descriptors_keep_processing_order() {
        let beam = beam_sequence().unwrap();
        let names: Vec<_> = beam.attributes().iter().take(4).map(|s| s.name()).collect();
        assert_eq!(names, ["BeamNumber", "BeamName", "BeamDescription", "BeamType"]);

        let control_points = beam.nested(tags::CONTROL_POINT_SEQUENCE).unwrap();
        assert_eq!(control_points.name(), "ControlPointSequence");
        assert!(control_points
            .nested(tags::BEAM_LIMITING_DEVICE_POSITION_SEQUENCE)
            .is_some());
    }

    #[test]
    fn module_descriptor_is_shared() {
        let a = rt_beams_module().unwrap();
        let b = rt_beams_module().unwrap();
        assert!(std::sync::Arc::ptr_eq(&a, &b));
        assert_eq!(a.len(), 1);
    }
}
