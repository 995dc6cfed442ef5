//! Shared test doubles
//!
//! Every sync module exercises the host boundaries, so the doubles live
//! here once instead of per test module. [`MockScene`] records each
//! mutation for inspection, [`TableAssets`] resolves ids from fixed
//! tables, and [`ScriptedEngine`] plays a cooperative generation engine
//! that hands out request ids in submission order.

use crate::engine::output::{
    GeneratedPart, MaterialId, ObjectTypeId, SubPlacement, TextureId, Vertex,
};
use crate::engine::{
    BuildClosure, EngineError, GenerationEngine, ProcedureId, ProcedureSpec, RequestId,
};
use crate::foundation::math::Mat4;
use crate::params::collection::ParameterCollection;
use crate::params::marshal::well_known;
use crate::params::value::ParamValue;
use crate::scene::{
    AssetResolver, BaseMaterialId, CollisionHandle, ComponentHandle, GeometryHandle, MaterialInfo,
    MaterialInstanceHandle, MeshAssetId, PlacementInfo, PlacementKind, PrimitiveHandle,
    SceneBackend, SpawnedHandle, TemplateId,
};
use std::collections::{HashMap, HashSet};

/// Recorded state of one instancing primitive created through [`MockScene`]
pub struct PrimitiveState {
    pub mesh: MeshAssetId,
    pub count: usize,
    pub transforms: Vec<Mat4>,
    pub resizes: usize,
    pub alive: bool,
}

/// Scene backend that records every mutation
///
/// Handles are never reused, destroyed objects leave their live set, and
/// double destruction panics the test.
#[derive(Default)]
pub struct MockScene {
    next_handle: u64,
    geometry: HashSet<u64>,
    collision: HashSet<u64>,
    components: HashSet<u64>,
    spawned: HashSet<u64>,
    primitives: Vec<PrimitiveState>,
    material_instances: HashMap<u64, bool>,
    pub created_material_instances: usize,
    pub created_primitives: usize,
    pub component_transforms: Vec<Mat4>,
}

impl MockScene {
    fn next(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    pub fn live_geometry(&self) -> usize {
        self.geometry.len()
    }

    pub fn live_collision(&self) -> usize {
        self.collision.len()
    }

    pub fn live_components(&self) -> usize {
        self.components.len()
    }

    pub fn live_spawned(&self) -> usize {
        self.spawned.len()
    }

    pub fn live_primitive_count(&self) -> usize {
        self.primitives.iter().filter(|state| state.alive).count()
    }

    pub fn primitive_for(&self, mesh: MeshAssetId) -> Option<&PrimitiveState> {
        self.primitives.iter().find(|state| state.mesh == mesh)
    }

    /// Simulate the host reclaiming a pooled material instance
    pub fn kill_material_instance(&mut self, handle: MaterialInstanceHandle) {
        self.material_instances.insert(handle.0, false);
    }
}

impl SceneBackend for MockScene {
    fn create_geometry(
        &mut self,
        _part: &GeneratedPart,
        _transform: &Mat4,
        _material: MaterialInstanceHandle,
    ) -> GeometryHandle {
        let handle = self.next();
        self.geometry.insert(handle);
        GeometryHandle(handle)
    }

    fn destroy_geometry(&mut self, handle: GeometryHandle) {
        assert!(self.geometry.remove(&handle.0), "unknown geometry destroyed");
    }

    fn create_collision(&mut self, _part: &GeneratedPart, _transform: &Mat4) -> CollisionHandle {
        let handle = self.next();
        self.collision.insert(handle);
        CollisionHandle(handle)
    }

    fn destroy_collision(&mut self, handle: CollisionHandle) {
        assert!(self.collision.remove(&handle.0), "unknown collision destroyed");
    }

    fn create_instance_primitive(&mut self, mesh: MeshAssetId) -> PrimitiveHandle {
        self.created_primitives += 1;
        self.primitives.push(PrimitiveState {
            mesh,
            count: 0,
            transforms: Vec::new(),
            resizes: 0,
            alive: true,
        });
        PrimitiveHandle(self.primitives.len() as u64 - 1)
    }

    fn destroy_instance_primitive(&mut self, handle: PrimitiveHandle) {
        let state = &mut self.primitives[handle.0 as usize];
        assert!(state.alive, "primitive destroyed twice");
        state.alive = false;
    }

    fn resize_instances(&mut self, handle: PrimitiveHandle, count: usize) {
        let state = &mut self.primitives[handle.0 as usize];
        state.count = count;
        state.resizes += 1;
        state.transforms.truncate(count);
    }

    fn set_instance_transforms(&mut self, handle: PrimitiveHandle, transforms: &[Mat4]) {
        self.primitives[handle.0 as usize].transforms = transforms.to_vec();
    }

    fn attach_mesh(&mut self, _mesh: MeshAssetId, transform: &Mat4) -> ComponentHandle {
        let handle = self.next();
        self.components.insert(handle);
        self.component_transforms.push(*transform);
        ComponentHandle(handle)
    }

    fn attach_template(&mut self, _template: TemplateId, transform: &Mat4) -> ComponentHandle {
        let handle = self.next();
        self.components.insert(handle);
        self.component_transforms.push(*transform);
        ComponentHandle(handle)
    }

    fn detach_component(&mut self, handle: ComponentHandle) {
        assert!(self.components.remove(&handle.0), "unknown component detached");
    }

    fn spawn_object(
        &mut self,
        _procedure: ProcedureId,
        _params: &ParameterCollection,
        _transform: &Mat4,
    ) -> SpawnedHandle {
        let handle = self.next();
        self.spawned.insert(handle);
        SpawnedHandle(handle)
    }

    fn destroy_spawned(&mut self, handle: SpawnedHandle) {
        assert!(self.spawned.remove(&handle.0), "unknown spawned object destroyed");
    }

    fn create_material_instance(
        &mut self,
        _base: BaseMaterialId,
        _snapshot: Option<&ParameterCollection>,
        _textures: &[TextureId],
    ) -> MaterialInstanceHandle {
        let handle = self.next();
        self.material_instances.insert(handle, true);
        self.created_material_instances += 1;
        MaterialInstanceHandle(handle)
    }

    fn material_instance_alive(&self, handle: MaterialInstanceHandle) -> bool {
        self.material_instances.get(&handle.0).copied().unwrap_or(false)
    }
}

/// Asset resolver backed by fixed lookup tables
#[derive(Default)]
pub struct TableAssets {
    materials: HashMap<MaterialId, MaterialInfo>,
    object_types: HashMap<ObjectTypeId, PlacementInfo>,
}

impl TableAssets {
    /// Resolver knowing exactly one material
    pub fn with_material(id: MaterialId, info: MaterialInfo) -> Self {
        let mut assets = Self::default();
        assets.add_material(id, info);
        assets
    }

    pub fn add_material(&mut self, id: MaterialId, info: MaterialInfo) {
        self.materials.insert(id, info);
    }

    pub fn add_object_type(&mut self, id: ObjectTypeId, info: PlacementInfo) {
        self.object_types.insert(id, info);
    }
}

impl AssetResolver for TableAssets {
    fn resolve_material(&self, id: MaterialId) -> Option<MaterialInfo> {
        self.materials.get(&id).copied()
    }

    fn resolve_object_type(&self, id: ObjectTypeId) -> Option<PlacementInfo> {
        self.object_types.get(&id).copied()
    }
}

/// Resolver for a small forest scene
///
/// Material 1 renders, material 2 is collision-intent. Object types 10
/// through 13 cover every placement kind; anything else is unknown.
pub fn forest_assets() -> TableAssets {
    let mut assets = TableAssets::default();
    assets.add_material(
        MaterialId(1),
        MaterialInfo {
            base: Some(BaseMaterialId(10)),
            wants_collision: false,
        },
    );
    assets.add_material(
        MaterialId(2),
        MaterialInfo {
            base: None,
            wants_collision: true,
        },
    );
    assets.add_object_type(
        ObjectTypeId(10),
        PlacementInfo::new(PlacementKind::Mesh(MeshAssetId(20))),
    );
    assets.add_object_type(
        ObjectTypeId(11),
        PlacementInfo::new(PlacementKind::InstancedMesh(MeshAssetId(21))),
    );
    assets.add_object_type(
        ObjectTypeId(12),
        PlacementInfo::new(PlacementKind::Attachable(TemplateId(30))),
    );
    assets.add_object_type(
        ObjectTypeId(13),
        PlacementInfo::new(PlacementKind::NestedProcedure(ProcedureId(7))),
    );
    assets
}

/// A part carrying one triangle of geometry under the given material
pub fn solid_part(material: u32) -> GeneratedPart {
    let normal = [0.0, 1.0, 0.0];
    GeneratedPart {
        material: MaterialId(material),
        snapshot: None,
        textures: Vec::new(),
        vertices: vec![
            Vertex {
                position: [0.0, 0.0, 0.0],
                normal,
                uv: [0.0, 0.0],
            },
            Vertex {
                position: [1.0, 0.0, 0.0],
                normal,
                uv: [1.0, 0.0],
            },
            Vertex {
                position: [0.0, 0.0, 1.0],
                normal,
                uv: [0.0, 1.0],
            },
        ],
        indices: vec![0, 1, 2],
    }
}

fn placement(object_type: u32) -> SubPlacement {
    SubPlacement {
        object_type: ObjectTypeId(object_type),
        params: ParameterCollection::new(),
    }
}

/// Placement of an object type that realizes as a mesh component
pub fn mesh_placement(object_type: u32) -> SubPlacement {
    placement(object_type)
}

/// Placement of an object type that realizes through the batcher
pub fn instanced_placement(object_type: u32) -> SubPlacement {
    placement(object_type)
}

/// Placement of an object type that realizes as an attached template
pub fn template_placement(object_type: u32) -> SubPlacement {
    placement(object_type)
}

/// Placement of an object type that realizes as a spawned sub-object
pub fn nested_placement(object_type: u32) -> SubPlacement {
    let mut sub = placement(object_type);
    sub.params.begin_edit();
    sub.params
        .add_slot(well_known::PLACEMENT_SEED, ParamValue::Integer(7));
    sub.params.end_edit();
    sub
}

/// One build recorded by [`ScriptedEngine`]
pub struct SubmittedBuild {
    pub request: RequestId,
    pub procedure: ProcedureId,
    pub params: ParameterCollection,
    pub background: bool,
}

/// Cooperative generation engine
///
/// Accepts every build (unless told to reject) and records the submitted
/// closure; the test decides when and with what output a request
/// completes.
pub struct ScriptedEngine {
    channels: usize,
    specs: Vec<ProcedureSpec>,
    next_request: u64,
    pub submitted: Vec<SubmittedBuild>,
    pub reject_builds: bool,
}

impl ScriptedEngine {
    pub fn new(channels: usize) -> Self {
        Self {
            channels,
            specs: Vec::new(),
            next_request: 1,
            submitted: Vec::new(),
            reject_builds: false,
        }
    }

    /// Register a procedure and return its id
    pub fn register(&mut self, name: &str, inputs: ParameterCollection) -> ProcedureId {
        let id = ProcedureId(self.specs.len() as u32 + 1);
        self.specs.push(ProcedureSpec {
            id,
            name: name.to_string(),
            inputs,
        });
        id
    }
}

impl GenerationEngine for ScriptedEngine {
    fn channel_count(&self) -> usize {
        self.channels
    }

    fn procedure_spec(&self, id: ProcedureId) -> Option<&ProcedureSpec> {
        self.specs.iter().find(|spec| spec.id == id)
    }

    fn create_closure(&mut self, id: ProcedureId) -> Result<BuildClosure, EngineError> {
        let spec = self
            .specs
            .iter()
            .find(|spec| spec.id == id)
            .ok_or(EngineError::UnknownProcedure(id))?;
        Ok(BuildClosure {
            procedure: id,
            params: spec.inputs.clone(),
        })
    }

    fn build(&mut self, closure: BuildClosure, background: bool) -> Result<RequestId, EngineError> {
        if self.reject_builds {
            return Err(EngineError::BuildRejected("engine busy".to_string()));
        }
        let request = RequestId(self.next_request);
        self.next_request += 1;
        self.submitted.push(SubmittedBuild {
            request,
            procedure: closure.procedure,
            params: closure.params,
            background,
        });
        Ok(request)
    }
}
