//! Scene-graph boundary
//!
//! The synchronization layer never talks to a concrete renderer or
//! physics world. [`SceneBackend`] is the narrow vocabulary it needs:
//! geometry objects, collision-only objects, instancing primitives with
//! resize and bulk-transform, attachable components, spawned sub-objects,
//! and live material instances. [`AssetResolver`] maps engine-side ids
//! onto host resources. Both traits are implemented by the host and
//! called only from the update thread.

use crate::engine::output::{GeneratedPart, MaterialId, ObjectTypeId, TextureId};
use crate::engine::ProcedureId;
use crate::foundation::math::{Mat4, Vec3};
use crate::params::collection::ParameterCollection;
use serde::{Deserialize, Serialize};

/// Handle to a geometry object created by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryHandle(pub u64);

/// Handle to a collision-only object created by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionHandle(pub u64);

/// Handle to an instancing primitive created by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrimitiveHandle(pub u64);

/// Handle to an attached component (mesh or template)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentHandle(pub u64);

/// Handle to a spawned sub-object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpawnedHandle(pub u64);

/// Handle to a live material instance
///
/// Instances are pooled host-side; the sync layer holds handles and asks
/// the host whether they are still alive, but never reclaims them
/// individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialInstanceHandle(pub u64);

/// Host-side base material id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BaseMaterialId(pub u32);

/// Host-side mesh asset id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshAssetId(pub u32);

/// Host-side template (prefab) id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemplateId(pub u32);

/// How a sub-placement's object type realizes in the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementKind {
    /// A mesh attached as a plain component
    Mesh(MeshAssetId),
    /// A mesh routed through the per-tier instancing batcher
    InstancedMesh(MeshAssetId),
    /// A template attached as a generic component
    Attachable(TemplateId),
    /// A nested procedural object spawned with its own parameters
    NestedProcedure(ProcedureId),
}

/// Host-side placement info for an object type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementInfo {
    /// How the object realizes
    pub kind: PlacementKind,
    /// Pivot correction applied in placement-local space
    pub local_offset: Vec3,
}

impl PlacementInfo {
    /// Placement info with no pivot correction
    pub fn new(kind: PlacementKind) -> Self {
        Self {
            kind,
            local_offset: Vec3::zeros(),
        }
    }
}

/// Host-side material info for an engine material id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialInfo {
    /// Base material to instance, absent for collision-intent materials
    pub base: Option<BaseMaterialId>,
    /// Whether parts using this material should produce collision geometry
    pub wants_collision: bool,
}

/// Maps engine-side asset ids onto host resources
pub trait AssetResolver {
    /// Resolve an engine material id
    ///
    /// `None` means the id is entirely unknown to the host; the caller
    /// falls back to a configured default material.
    fn resolve_material(&self, id: MaterialId) -> Option<MaterialInfo>;

    /// Resolve an object type id to placement info
    fn resolve_object_type(&self, id: ObjectTypeId) -> Option<PlacementInfo>;
}

/// Scene mutation vocabulary implemented by the host
pub trait SceneBackend {
    /// Create a renderable geometry object from a generated part
    fn create_geometry(
        &mut self,
        part: &GeneratedPart,
        transform: &Mat4,
        material: MaterialInstanceHandle,
    ) -> GeometryHandle;

    /// Destroy a geometry object
    fn destroy_geometry(&mut self, handle: GeometryHandle);

    /// Create a collision-only object from a generated part
    fn create_collision(&mut self, part: &GeneratedPart, transform: &Mat4) -> CollisionHandle;

    /// Destroy a collision-only object
    fn destroy_collision(&mut self, handle: CollisionHandle);

    /// Create an (initially empty) instancing primitive for a mesh asset
    fn create_instance_primitive(&mut self, mesh: MeshAssetId) -> PrimitiveHandle;

    /// Destroy an instancing primitive and all its instances
    fn destroy_instance_primitive(&mut self, handle: PrimitiveHandle);

    /// Grow or shrink a primitive's instance count
    fn resize_instances(&mut self, handle: PrimitiveHandle, count: usize);

    /// Apply all instance transforms in one call
    fn set_instance_transforms(&mut self, handle: PrimitiveHandle, transforms: &[Mat4]);

    /// Attach a mesh component
    fn attach_mesh(&mut self, mesh: MeshAssetId, transform: &Mat4) -> ComponentHandle;

    /// Attach a template as a generic component
    fn attach_template(&mut self, template: TemplateId, transform: &Mat4) -> ComponentHandle;

    /// Detach a component attached by [`Self::attach_mesh`] or [`Self::attach_template`]
    fn detach_component(&mut self, handle: ComponentHandle);

    /// Spawn a nested procedural object with its own parameters
    fn spawn_object(
        &mut self,
        procedure: ProcedureId,
        params: &ParameterCollection,
        transform: &Mat4,
    ) -> SpawnedHandle;

    /// Destroy a spawned sub-object
    fn destroy_spawned(&mut self, handle: SpawnedHandle);

    /// Create a live material instance and apply snapshot bindings
    fn create_material_instance(
        &mut self,
        base: BaseMaterialId,
        snapshot: Option<&ParameterCollection>,
        textures: &[TextureId],
    ) -> MaterialInstanceHandle;

    /// Whether a material instance handle still refers to a live instance
    fn material_instance_alive(&self, handle: MaterialInstanceHandle) -> bool;
}
