//! Parameter identifiers, type tags, and values

use crate::foundation::math::{Colour, Frame, Vec3};
use crate::params::collection::ParameterCollection;
use std::fmt;

/// Identifier for a parameter slot
///
/// Ids are assigned by the generation engine's procedure specifications
/// and are only meaningful within one collection; collections are keyed
/// lists, not global registries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamId(pub u32);

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Type tag for a parameter slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Boolean flag
    Bool,
    /// Signed integer
    Integer,
    /// Single-precision float
    Float,
    /// UTF-8 string
    String,
    /// RGBA colour
    Colour,
    /// 3D vector
    Vector3,
    /// Oriented placement frame
    Frame,
    /// Nested parameter collection
    List,
    /// Type tag only, no payload
    None,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Colour => "colour",
            Self::Vector3 => "vector3",
            Self::Frame => "frame",
            Self::List => "list",
            Self::None => "none",
        };
        f.write_str(name)
    }
}

/// A typed parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Boolean flag
    Bool(bool),
    /// Signed integer
    Integer(i32),
    /// Single-precision float
    Float(f32),
    /// UTF-8 string
    String(String),
    /// RGBA colour
    Colour(Colour),
    /// 3D vector
    Vector3(Vec3),
    /// Oriented placement frame
    Frame(Frame),
    /// Nested parameter collection
    List(ParameterCollection),
    /// Slot that carries a type tag but no payload
    None,
}

impl ParamValue {
    /// The type tag this value carries
    pub fn kind(&self) -> ParamKind {
        match self {
            Self::Bool(_) => ParamKind::Bool,
            Self::Integer(_) => ParamKind::Integer,
            Self::Float(_) => ParamKind::Float,
            Self::String(_) => ParamKind::String,
            Self::Colour(_) => ParamKind::Colour,
            Self::Vector3(_) => ParamKind::Vector3,
            Self::Frame(_) => ParamKind::Frame,
            Self::List(_) => ParamKind::List,
            Self::None => ParamKind::None,
        }
    }
}
