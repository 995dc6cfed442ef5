//! Generation results
//!
//! A completed request delivers one [`GeneratedOutput`]: geometry parts
//! keyed by material, plus sub-placements (nested objects the host should
//! place). Parts and placements also arrive with the counts the engine
//! declared while streaming; the sync layer warns when realization
//! disagrees with the declaration but carries on with what is actually
//! present.

use crate::params::collection::ParameterCollection;
use bytemuck::{Pod, Zeroable};
use std::fmt;

/// Material asset id in the engine's vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(pub u32);

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "material#{}", self.0)
    }
}

/// Texture asset id in the engine's vocabulary
///
/// Textures cross the boundary as opaque ids; the host resolves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Object type id for sub-placements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectTypeId(pub u32);

impl fmt::Display for ObjectTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object-type#{}", self.0)
    }
}

/// Geometry vertex as generated
///
/// `Pod` so hosts can hand the vertex array to a GPU upload byte-wise.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position in the part's local space
    pub position: [f32; 3],
    /// Surface normal
    pub normal: [f32; 3],
    /// Texture coordinates
    pub uv: [f32; 2],
}

/// One geometry piece of a generation result
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedPart {
    /// Material this part should be shaded with
    pub material: MaterialId,
    /// Per-part material parameter snapshot, if the part customizes one
    pub snapshot: Option<ParameterCollection>,
    /// Textures bound by this part, in binding order
    pub textures: Vec<TextureId>,
    /// Vertex data
    pub vertices: Vec<Vertex>,
    /// Triangle indices into `vertices`
    pub indices: Vec<u32>,
}

impl GeneratedPart {
    /// True if the part carries any geometry at all
    pub fn has_geometry(&self) -> bool {
        !self.vertices.is_empty()
    }
}

/// A nested object the result asks the host to place
#[derive(Debug, Clone, PartialEq)]
pub struct SubPlacement {
    /// What to place, resolved host-side to a concrete resource
    pub object_type: ObjectTypeId,
    /// Placement metadata and nested generation parameters
    pub params: ParameterCollection,
}

/// Complete result of one generation request
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeneratedOutput {
    /// Geometry parts
    pub parts: Vec<GeneratedPart>,
    /// Sub-placements
    pub placements: Vec<SubPlacement>,
    /// Part count the engine declared while streaming
    pub declared_parts: usize,
    /// Placement count the engine declared while streaming
    pub declared_placements: usize,
}

impl GeneratedOutput {
    /// Create an output whose declared counts match its contents
    pub fn new(parts: Vec<GeneratedPart>, placements: Vec<SubPlacement>) -> Self {
        let declared_parts = parts.len();
        let declared_placements = placements.len();
        Self {
            parts,
            placements,
            declared_parts,
            declared_placements,
        }
    }

    /// True if the result carries neither parts nor placements
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty() && self.placements.is_empty()
    }
}
