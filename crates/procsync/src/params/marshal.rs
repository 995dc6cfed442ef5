//! Placement parameter marshalling
//!
//! Sub-placements arrive from the engine carrying their spawn placement
//! as a parameter collection. A const field table maps the well-known
//! slot ids onto [`PlacementParams`] fields; extraction walks the table,
//! so adding a field is one new row rather than another hand-written
//! lookup chain. Missing or mistyped slots leave the field at its
//! default.

use crate::foundation::math::{Frame, Vec3};
use crate::params::collection::ParameterCollection;
use crate::params::value::{ParamId, ParamKind, ParamValue};
use log::debug;

/// Well-known placement slot ids shared with the generation engine
pub mod well_known {
    use crate::params::value::ParamId;

    /// Placement frame of the spawned object, in the owner's space
    pub const PLACEMENT_FRAME: ParamId = ParamId(1);
    /// Seed forwarded to nested generation
    pub const PLACEMENT_SEED: ParamId = ParamId(2);
    /// Offset from the frame origin, in frame space
    pub const LOCAL_OFFSET: ParamId = ParamId(3);
    /// Uniform scale applied on top of the frame size
    pub const UNIFORM_SCALE: ParamId = ParamId(4);
}

/// Marshalled placement metadata for one sub-placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementParams {
    /// Placement frame in the owner's space
    pub frame: Frame,
    /// Seed forwarded to nested generation
    pub seed: i32,
    /// Offset from the frame origin, in frame space
    pub local_offset: Vec3,
    /// Uniform scale factor
    pub uniform_scale: f32,
}

impl Default for PlacementParams {
    fn default() -> Self {
        Self {
            frame: Frame::unit(),
            seed: 0,
            local_offset: Vec3::zeros(),
            uniform_scale: 1.0,
        }
    }
}

struct FieldSpec {
    id: ParamId,
    kind: ParamKind,
    apply: fn(&mut PlacementParams, &ParamValue),
}

const PLACEMENT_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        id: well_known::PLACEMENT_FRAME,
        kind: ParamKind::Frame,
        apply: |out, value| {
            if let ParamValue::Frame(v) = value {
                out.frame = *v;
            }
        },
    },
    FieldSpec {
        id: well_known::PLACEMENT_SEED,
        kind: ParamKind::Integer,
        apply: |out, value| {
            if let ParamValue::Integer(v) = value {
                out.seed = *v;
            }
        },
    },
    FieldSpec {
        id: well_known::LOCAL_OFFSET,
        kind: ParamKind::Vector3,
        apply: |out, value| {
            if let ParamValue::Vector3(v) = value {
                out.local_offset = *v;
            }
        },
    },
    FieldSpec {
        id: well_known::UNIFORM_SCALE,
        kind: ParamKind::Float,
        apply: |out, value| {
            if let ParamValue::Float(v) = value {
                out.uniform_scale = *v;
            }
        },
    },
];

/// Extract placement metadata from a sub-placement's parameters
pub fn extract_placement(params: &ParameterCollection) -> PlacementParams {
    let mut out = PlacementParams::default();
    for field in PLACEMENT_FIELDS {
        if let Some(value) = params.value(field.id) {
            if value.kind() == field.kind {
                (field.apply)(&mut out, value);
            } else {
                debug!(
                    "placement marshal: {} is {}, expected {}; using default",
                    field.id,
                    value.kind(),
                    field.kind
                );
            }
        }
    }
    // Engine-produced frames bypass cascade repair, so repair here.
    out.frame.repair_axes();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_known_fields() {
        let mut params = ParameterCollection::new();
        params.begin_edit();
        params.add_slot(
            well_known::PLACEMENT_FRAME,
            ParamValue::Frame(Frame::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(1.0, 1.0, 1.0))),
        );
        params.add_slot(well_known::PLACEMENT_SEED, ParamValue::Integer(99));
        params.add_slot(well_known::UNIFORM_SCALE, ParamValue::Float(2.5));
        params.end_edit();

        let placement = extract_placement(&params);
        assert_eq!(placement.frame.origin, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(placement.seed, 99);
        assert_eq!(placement.uniform_scale, 2.5);
        assert_eq!(placement.local_offset, Vec3::zeros());
    }

    #[test]
    fn missing_and_mistyped_slots_keep_defaults() {
        let mut params = ParameterCollection::new();
        params.begin_edit();
        params.add_slot(well_known::PLACEMENT_SEED, ParamValue::Float(1.0)); // wrong kind
        params.end_edit();

        let placement = extract_placement(&params);
        assert_eq!(placement, PlacementParams::default());
    }

    #[test]
    fn degenerate_frames_are_repaired() {
        let mut broken = Frame::unit();
        broken.axes[0] = Vec3::zeros();
        let mut params = ParameterCollection::new();
        params.begin_edit();
        params.add_slot(well_known::PLACEMENT_FRAME, ParamValue::Frame(broken));
        params.end_edit();

        let placement = extract_placement(&params);
        assert!(!placement.frame.is_degenerate());
    }
}
