//! Foliage scatter demo
//!
//! Headless end-to-end run of the synchronization layer: a stub scatter
//! engine turns resolved parameters into deterministic groves, a counting
//! scene backend records what lands, and a synchronizer paces rebuilds
//! over a simulated frame loop. Run with `RUST_LOG=debug` to watch the
//! cache and limiter traffic.

use procsync::engine::output::{MaterialId, ObjectTypeId, TextureId};
use procsync::engine::BuildClosure;
use procsync::params::marshal::well_known;
use procsync::prelude::*;
use procsync::scene::{
    BaseMaterialId, CollisionHandle, ComponentHandle, GeometryHandle, MaterialInstanceHandle,
    MeshAssetId, PrimitiveHandle, SpawnedHandle, TemplateId,
};
use rand::prelude::*;
use std::collections::HashMap;

// Configuration constants
const SIMULATED_FRAMES: usize = 32; // Length of the demo frame loop
const ENGINE_CHANNELS: usize = 2; // Stub engine worker concurrency
const GENERATION_LATENCY_FRAMES: usize = 2; // Frames between build and completion
const GROVE_TIER: TierId = TierId(0);

// Scatter procedure parameter slots
const TREE_COUNT: ParamId = ParamId(10);
const SCATTER_AREA: ParamId = ParamId(11);
const SCATTER_SEED: ParamId = ParamId(12);
const CANOPY_TINT: ParamId = ParamId(13);

// Engine-side asset vocabulary
const SCATTER_GROVE: ProcedureId = ProcedureId(1);
const MAT_BARK: MaterialId = MaterialId(1);
const MAT_CANOPY: MaterialId = MaterialId(2);
const TEX_BARK_ALBEDO: TextureId = TextureId(40);
const OT_TREE: ObjectTypeId = ObjectTypeId(20);
const OT_FERN: ObjectTypeId = ObjectTypeId(21);
const OT_BENCH: ObjectTypeId = ObjectTypeId(22);

struct QueuedBuild {
    request: RequestId,
    params: ParameterCollection,
    ready_at: usize,
}

/// Deterministic stand-in for the external generation engine
///
/// Builds queue with a fixed frame latency; `advance` plays the role of
/// the host marshalling finished results back onto the update thread.
struct StubEngine {
    spec: ProcedureSpec,
    queue: Vec<QueuedBuild>,
    next_request: u64,
    frame: usize,
}

impl StubEngine {
    fn new() -> Self {
        let mut inputs = ParameterCollection::new();
        inputs.begin_edit();
        inputs.add_slot(TREE_COUNT, ParamValue::Integer(8));
        inputs.add_slot(
            SCATTER_AREA,
            ParamValue::Frame(Frame::new(Vec3::zeros(), Vec3::new(40.0, 1.0, 40.0))),
        );
        inputs.add_slot(SCATTER_SEED, ParamValue::Integer(1));
        inputs.add_slot(
            CANOPY_TINT,
            ParamValue::Colour(Colour::opaque(0.20, 0.55, 0.25)),
        );
        inputs.end_edit();
        Self {
            spec: ProcedureSpec {
                id: SCATTER_GROVE,
                name: "scatter_grove".to_string(),
                inputs,
            },
            queue: Vec::new(),
            next_request: 1,
            frame: 0,
        }
    }

    /// Advance one simulated frame and return builds whose latency elapsed
    fn advance(&mut self) -> Vec<(RequestId, GeneratedOutput)> {
        self.frame += 1;
        let frame = self.frame;
        let mut finished = Vec::new();
        let mut index = 0;
        while index < self.queue.len() {
            if self.queue[index].ready_at <= frame {
                let job = self.queue.swap_remove(index);
                log::debug!("stub engine: {} finished", job.request);
                finished.push((job.request, scatter_grove(&job.params)));
            } else {
                index += 1;
            }
        }
        finished
    }
}

impl GenerationEngine for StubEngine {
    fn channel_count(&self) -> usize {
        ENGINE_CHANNELS
    }

    fn procedure_spec(&self, id: ProcedureId) -> Option<&ProcedureSpec> {
        (self.spec.id == id).then_some(&self.spec)
    }

    fn create_closure(&mut self, id: ProcedureId) -> Result<BuildClosure, EngineError> {
        if self.spec.id != id {
            return Err(EngineError::UnknownProcedure(id));
        }
        Ok(BuildClosure {
            procedure: id,
            params: self.spec.inputs.clone(),
        })
    }

    fn build(&mut self, closure: BuildClosure, background: bool) -> Result<RequestId, EngineError> {
        let request = RequestId(self.next_request);
        self.next_request += 1;
        // Foreground builds finish before the next frame.
        let latency = if background { GENERATION_LATENCY_FRAMES } else { 1 };
        log::debug!("stub engine: accepted {request} ({latency} frame latency)");
        self.queue.push(QueuedBuild {
            request,
            params: closure.params,
            ready_at: self.frame + latency,
        });
        Ok(request)
    }
}

/// Synthesize a grove from resolved scatter parameters
fn scatter_grove(params: &ParameterCollection) -> GeneratedOutput {
    let count = params.find_integer(TREE_COUNT).unwrap_or(0).max(0) as usize;
    let seed = params.find_integer(SCATTER_SEED).unwrap_or(0);
    let area = params.find_frame(SCATTER_AREA).unwrap_or_else(Frame::unit);
    let tint = params.find_colour(CANOPY_TINT).unwrap_or(Colour::WHITE);
    let mut rng = StdRng::seed_from_u64(u64::from(seed.unsigned_abs()));

    let mut tint_snapshot = ParameterCollection::new();
    tint_snapshot.begin_edit();
    tint_snapshot.add_slot(CANOPY_TINT, ParamValue::Colour(tint));
    tint_snapshot.end_edit();

    let extent = (area.size.x.max(area.size.z) * 0.5).max(1.0);
    let parts = vec![
        slab_part(MAT_BARK, None, vec![TEX_BARK_ALBEDO], extent),
        slab_part(MAT_CANOPY, Some(tint_snapshot), Vec::new(), extent * 0.25),
    ];

    let half_x = (area.size.x * 0.5).max(0.5);
    let half_z = (area.size.z * 0.5).max(0.5);
    let mut placements = Vec::with_capacity(count + count / 5 + 1);
    for index in 0..count {
        let position = area.origin
            + Vec3::new(
                rng.gen_range(-half_x..half_x),
                0.0,
                rng.gen_range(-half_z..half_z),
            );
        let scale = rng.gen_range(0.8..1.6);
        placements.push(scatter_placement(OT_TREE, position, scale, rng.gen()));
        // A fern huddles next to every fifth tree.
        if index % 5 == 4 {
            placements.push(scatter_placement(
                OT_FERN,
                position + Vec3::new(1.2, 0.0, 0.0),
                1.0,
                rng.gen(),
            ));
        }
    }
    placements.push(scatter_placement(OT_BENCH, area.origin, 1.0, 0));

    GeneratedOutput::new(parts, placements)
}

fn slab_part(
    material: MaterialId,
    snapshot: Option<ParameterCollection>,
    textures: Vec<TextureId>,
    extent: f32,
) -> GeneratedPart {
    let corner = |x: f32, z: f32| Vertex {
        position: [x * extent, 0.0, z * extent],
        normal: [0.0, 1.0, 0.0],
        uv: [(x + 1.0) * 0.5, (z + 1.0) * 0.5],
    };
    GeneratedPart {
        material,
        snapshot,
        textures,
        vertices: vec![
            corner(-1.0, -1.0),
            corner(1.0, -1.0),
            corner(1.0, 1.0),
            corner(-1.0, 1.0),
        ],
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

fn scatter_placement(
    object_type: ObjectTypeId,
    position: Vec3,
    scale: f32,
    seed: i32,
) -> SubPlacement {
    let mut params = ParameterCollection::new();
    params.begin_edit();
    params.add_slot(
        well_known::PLACEMENT_FRAME,
        ParamValue::Frame(Frame::new(position, Vec3::new(scale, scale, scale))),
    );
    params.add_slot(well_known::PLACEMENT_SEED, ParamValue::Integer(seed));
    params.end_edit();
    SubPlacement {
        object_type,
        params,
    }
}

/// Fixed host-side asset table
struct DemoAssets;

impl AssetResolver for DemoAssets {
    fn resolve_material(&self, id: MaterialId) -> Option<MaterialInfo> {
        match id {
            MAT_BARK => Some(MaterialInfo {
                base: Some(BaseMaterialId(100)),
                wants_collision: true,
            }),
            MAT_CANOPY => Some(MaterialInfo {
                base: Some(BaseMaterialId(101)),
                wants_collision: false,
            }),
            _ => None,
        }
    }

    fn resolve_object_type(&self, id: ObjectTypeId) -> Option<PlacementInfo> {
        match id {
            OT_TREE => Some(PlacementInfo::new(PlacementKind::InstancedMesh(
                MeshAssetId(200),
            ))),
            OT_FERN => Some(PlacementInfo::new(PlacementKind::Mesh(MeshAssetId(201)))),
            OT_BENCH => Some(PlacementInfo::new(PlacementKind::Attachable(TemplateId(
                300,
            )))),
            _ => None,
        }
    }
}

/// Scene backend that counts what the sync layer does to it
#[derive(Default)]
struct CountingScene {
    next_handle: u64,
    geometry: usize,
    collision: usize,
    components: usize,
    spawned: usize,
    material_instances: usize,
    primitive_counts: HashMap<u64, usize>,
    transform_uploads: usize,
}

impl CountingScene {
    fn next(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn live_objects(&self) -> usize {
        self.geometry + self.collision + self.components + self.spawned
    }

    fn total_instances(&self) -> usize {
        self.primitive_counts.values().sum()
    }
}

impl SceneBackend for CountingScene {
    fn create_geometry(
        &mut self,
        part: &GeneratedPart,
        _transform: &Mat4,
        _material: MaterialInstanceHandle,
    ) -> GeometryHandle {
        self.geometry += 1;
        log::debug!("scene: geometry object with {} vertices", part.vertices.len());
        GeometryHandle(self.next())
    }

    fn destroy_geometry(&mut self, _handle: GeometryHandle) {
        self.geometry -= 1;
    }

    fn create_collision(&mut self, part: &GeneratedPart, _transform: &Mat4) -> CollisionHandle {
        self.collision += 1;
        log::debug!("scene: collision object with {} indices", part.indices.len());
        CollisionHandle(self.next())
    }

    fn destroy_collision(&mut self, _handle: CollisionHandle) {
        self.collision -= 1;
    }

    fn create_instance_primitive(&mut self, mesh: MeshAssetId) -> PrimitiveHandle {
        let handle = self.next();
        log::debug!("scene: instancing primitive for mesh {}", mesh.0);
        self.primitive_counts.insert(handle, 0);
        PrimitiveHandle(handle)
    }

    fn destroy_instance_primitive(&mut self, handle: PrimitiveHandle) {
        self.primitive_counts.remove(&handle.0);
    }

    fn resize_instances(&mut self, handle: PrimitiveHandle, count: usize) {
        self.primitive_counts.insert(handle.0, count);
    }

    fn set_instance_transforms(&mut self, _handle: PrimitiveHandle, transforms: &[Mat4]) {
        self.transform_uploads += transforms.len();
    }

    fn attach_mesh(&mut self, _mesh: MeshAssetId, _transform: &Mat4) -> ComponentHandle {
        self.components += 1;
        ComponentHandle(self.next())
    }

    fn attach_template(&mut self, _template: TemplateId, _transform: &Mat4) -> ComponentHandle {
        self.components += 1;
        ComponentHandle(self.next())
    }

    fn detach_component(&mut self, _handle: ComponentHandle) {
        self.components -= 1;
    }

    fn spawn_object(
        &mut self,
        procedure: ProcedureId,
        _params: &ParameterCollection,
        _transform: &Mat4,
    ) -> SpawnedHandle {
        self.spawned += 1;
        log::debug!("scene: spawned nested {procedure}");
        SpawnedHandle(self.next())
    }

    fn destroy_spawned(&mut self, _handle: SpawnedHandle) {
        self.spawned -= 1;
    }

    fn create_material_instance(
        &mut self,
        base: BaseMaterialId,
        snapshot: Option<&ParameterCollection>,
        textures: &[TextureId],
    ) -> MaterialInstanceHandle {
        self.material_instances += 1;
        log::debug!(
            "scene: material instance of base {} ({} snapshot slots, {} textures)",
            base.0,
            snapshot.map_or(0, ParameterCollection::len),
            textures.len()
        );
        MaterialInstanceHandle(self.next())
    }

    fn material_instance_alive(&self, _handle: MaterialInstanceHandle) -> bool {
        true
    }
}

/// Logs every completed synchronization pass
struct GroveListener;

impl SyncListener for GroveListener {
    fn on_pass_complete(&mut self, event: &CompletionEvent) {
        log::info!(
            "pass {} complete: {} holds {} content record(s)",
            event.pass,
            event.tier,
            event.content_count
        );
    }
}

struct FoliageDemoApp {
    engine: StubEngine,
    scene: CountingScene,
    assets: DemoAssets,
    sync: Synchronizer,
    instance_params: ParameterCollection,
}

impl FoliageDemoApp {
    fn new() -> Self {
        let config = SyncConfig {
            deferred_removal: true,
            ..SyncConfig::default()
        };
        let engine = StubEngine::new();
        let mut sync = Synchronizer::new(&config, engine.channel_count());
        sync.add_listener(Box::new(GroveListener));
        Self {
            engine,
            scene: CountingScene::default(),
            assets: DemoAssets,
            sync,
            instance_params: ParameterCollection::new(),
        }
    }

    fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.set_instance_params(12, 7);
        self.request_rebuild(None)?;

        for frame in 0..SIMULATED_FRAMES {
            // Finished results enter on the update thread, like a host
            // marshalling engine completions.
            for (request, output) in self.engine.advance() {
                self.sync
                    .complete_request(&mut self.scene, &self.assets, request, &output);
            }
            self.sync.update(&mut self.engine);

            match frame {
                8 => {
                    // Two rebuilds back to back; the first is superseded
                    // and never reaches the engine.
                    self.set_instance_params(20, 11);
                    self.request_rebuild(None)?;
                    self.set_instance_params(24, 11);
                    self.request_rebuild(None)?;
                }
                16 => {
                    // Script layer wins over instance params for the tint.
                    let mut script = ParameterCollection::new();
                    script.begin_edit();
                    script.add_slot(
                        CANOPY_TINT,
                        ParamValue::Colour(Colour::opaque(0.80, 0.45, 0.10)),
                    );
                    script.end_edit();
                    self.request_rebuild(Some(&script))?;
                }
                _ => {}
            }
        }

        self.report();
        self.sync.remove_all(&mut self.scene);
        log::info!(
            "teardown: {} live objects, {} batched instances remain",
            self.scene.live_objects(),
            self.scene.total_instances()
        );
        Ok(())
    }

    fn set_instance_params(&mut self, trees: i32, seed: i32) {
        let mut params = ParameterCollection::new();
        params.begin_edit();
        params.add_slot(TREE_COUNT, ParamValue::Integer(trees));
        params.add_slot(SCATTER_SEED, ParamValue::Integer(seed));
        params.end_edit();
        self.instance_params = params;
    }

    fn request_rebuild(&mut self, script: Option<&ParameterCollection>) -> Result<(), SyncError> {
        let mut cascade = Cascade::new();
        if let Some(overrides) = script {
            cascade.push(CascadeSource::ScriptOverride, overrides);
        }
        cascade.push(CascadeSource::InstanceParams, &self.instance_params);
        self.sync.request_rebuild(
            &self.engine,
            SCATTER_GROVE,
            cascade,
            GROVE_TIER,
            Frame::new(Vec3::new(120.0, 0.0, -40.0), Vec3::new(1.0, 1.0, 1.0)),
        )
    }

    fn report(&self) {
        let stats = self.sync.stats();
        let limiter = self.sync.limiter_stats();
        let content = self.sync.sync_stats();
        log::info!(
            "rebuilds: {} requested, {} superseded, {} dispatched, {} completed",
            stats.rebuilds_requested,
            stats.rebuilds_superseded,
            stats.dispatched,
            stats.completed
        );
        log::info!(
            "pacing: {} duration samples, target period {:?}, {} evictions",
            limiter.samples,
            limiter.target_period,
            limiter.evictions
        );
        log::info!(
            "content: {} added, {} removed, {} parts and {} placements realized over {} passes",
            content.content_added,
            content.content_removed,
            content.parts_realized,
            content.placements_realized,
            content.passes
        );
        log::info!(
            "scene: {} live objects, {} instances over {} primitives, {} transform uploads, {} material instances",
            self.scene.live_objects(),
            self.scene.total_instances(),
            self.scene.primitive_counts.len(),
            self.scene.transform_uploads,
            self.scene.material_instances
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up panic hook for better error reporting
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("PANIC occurred: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            eprintln!(
                "Panic location: {}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            );
        }
    }));

    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Starting foliage scatter demo");

    let mut app = FoliageDemoApp::new();
    match app.run() {
        Ok(()) => {
            log::info!("Foliage scatter demo completed successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Foliage scatter demo failed: {e:?}");
            Err(e)
        }
    }
}
