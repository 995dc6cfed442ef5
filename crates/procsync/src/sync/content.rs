//! Content synchronization cache
//!
//! Generation results become scene state here. Each accepted result is a
//! content record under a generation-checked [`ContentId`]; records are
//! grouped into detail tiers, and each tier owns its own material variant
//! cache and instancing batcher. Mutations happen inside begin/end update
//! passes: a pass can add and remove content freely, the tier's batcher
//! flushes once at pass end, and listeners hear about every touched tier
//! after the scene has settled.
//!
//! Nothing in here is fatal. Unresolvable assets are skipped with a
//! warning, declared-versus-realized disagreements are logged and the
//! realized content wins, and removal of a stale id is a no-op.

use crate::config::SyncConfig;
use crate::engine::output::{GeneratedOutput, GeneratedPart};
use crate::foundation::collections::HandleMap;
use crate::foundation::math::{Frame, Mat4};
use crate::notify::{CompletionEvent, ListenerSet, SyncListener};
use crate::params::marshal;
use crate::scene::{
    AssetResolver, BaseMaterialId, CollisionHandle, ComponentHandle, GeometryHandle,
    PlacementKind, SceneBackend, SpawnedHandle,
};
use crate::sync::instancing::{InstanceHandle, InstancedMeshBatcher};
use crate::sync::material::{MaterialVariantCache, ResolvedVariant};
use bitflags::bitflags;
use log::{debug, warn};
use slotmap::new_key_type;
use std::collections::HashMap;
use std::fmt;

new_key_type! {
    /// Stable, generation-checked identifier for accepted content
    ///
    /// Removal invalidates the id permanently; re-adding equivalent
    /// content yields a fresh id, so a stale id can never resurrect or
    /// alias newer content.
    pub struct ContentId;
}

/// Detail tier identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TierId(pub u8);

impl TierId {
    /// Tier reserved for in-editor preview content
    pub const EDITING: Self = Self(u8::MAX);
}

impl fmt::Display for TierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::EDITING {
            f.write_str("editing tier")
        } else {
            write!(f, "tier {}", self.0)
        }
    }
}

bitflags! {
    /// What a generated part contributes to the scene
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PartContent: u8 {
        /// Renderable geometry backed by a material instance
        const RENDERABLE = 1 << 0;
        /// Collision geometry
        const COLLISION = 1 << 1;
    }
}

/// Classify what a part will realize, given its resolved material
///
/// A part with no geometry realizes nothing regardless of material. With
/// geometry, a live material instance makes it renderable and the
/// material's collision intent adds collision; both, either, or neither
/// may hold.
pub fn classify_part(part: &GeneratedPart, variant: ResolvedVariant) -> PartContent {
    let mut flags = PartContent::empty();
    if part.has_geometry() {
        if variant.instance.is_some() {
            flags |= PartContent::RENDERABLE;
        }
        if variant.wants_collision {
            flags |= PartContent::COLLISION;
        }
    }
    flags
}

#[derive(Debug)]
struct RealizedPart {
    geometry: Option<GeometryHandle>,
    collision: Option<CollisionHandle>,
}

#[derive(Debug)]
struct ContentRecord {
    tier: TierId,
    parts: Vec<RealizedPart>,
    components: Vec<ComponentHandle>,
    spawned: Vec<SpawnedHandle>,
    instances: Vec<InstanceHandle>,
}

/// Per-tier synchronization state
pub struct TierState {
    /// Material variant deduplication for this tier
    pub materials: MaterialVariantCache,
    /// Instanced mesh batcher for this tier
    pub batcher: InstancedMeshBatcher,
    content: Vec<ContentId>,
}

impl TierState {
    fn new(default_material: Option<BaseMaterialId>) -> Self {
        Self {
            materials: MaterialVariantCache::new(default_material),
            batcher: InstancedMeshBatcher::new(),
            content: Vec::new(),
        }
    }

    /// Content records currently live in this tier
    pub fn content_count(&self) -> usize {
        self.content.len()
    }
}

/// Aggregated synchronization statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Content records accepted
    pub content_added: u64,
    /// Content records torn down
    pub content_removed: u64,
    /// Parts that realized at least one scene object
    pub parts_realized: u64,
    /// Sub-placements realized
    pub placements_realized: u64,
    /// Sub-placements skipped because their object type did not resolve
    pub placements_skipped: u64,
    /// Declared-versus-realized count disagreements
    pub declaration_mismatches: u64,
    /// Update passes completed
    pub passes: u64,
}

/// Diff-based cache of generated content in the scene
pub struct ContentSyncCache {
    records: HandleMap<ContentId, ContentRecord>,
    tiers: HashMap<TierId, TierState>,
    listeners: ListenerSet,
    deferred_pending: Vec<ContentId>,
    deferred_due: Vec<ContentId>,
    touched: Vec<TierId>,
    in_pass: bool,
    deferred_removal: bool,
    default_material: Option<BaseMaterialId>,
    stats: SyncStats,
}

impl ContentSyncCache {
    /// Create a cache configured by [`SyncConfig`]
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            records: HandleMap::with_key(),
            tiers: HashMap::new(),
            listeners: ListenerSet::new(),
            deferred_pending: Vec::new(),
            deferred_due: Vec::new(),
            touched: Vec::new(),
            in_pass: false,
            deferred_removal: config.deferred_removal,
            default_material: config.default_material,
            stats: SyncStats::default(),
        }
    }

    /// Register a completion listener
    pub fn add_listener(&mut self, listener: Box<dyn SyncListener>) {
        self.listeners.add(listener);
    }

    /// Total content records across all tiers
    pub fn content_count(&self) -> usize {
        self.records.len()
    }

    /// True if the id refers to live content
    pub fn contains(&self, id: ContentId) -> bool {
        self.records.contains_key(id)
    }

    /// True if the id is queued for deferred removal
    pub fn removal_pending(&self, id: ContentId) -> bool {
        self.deferred_pending.contains(&id) || self.deferred_due.contains(&id)
    }

    /// Per-tier state, if the tier has ever been touched
    pub fn tier(&self, tier: TierId) -> Option<&TierState> {
        self.tiers.get(&tier)
    }

    /// Statistics snapshot
    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    /// Open an update pass
    ///
    /// Removals queued before this pass become due and will tear down at
    /// this pass's end, after any re-adds. Returns `false` (and logs) if
    /// a pass is already open.
    pub fn begin_update(&mut self) -> bool {
        if self.in_pass {
            warn!("content sync: begin_update inside an open pass");
            return false;
        }
        self.in_pass = true;
        let mut pending = std::mem::take(&mut self.deferred_pending);
        self.deferred_due.append(&mut pending);
        true
    }

    /// Close the update pass
    ///
    /// Processes due deferred removals, flushes every tier's batcher
    /// (dirty batches only), then fires one completion event per touched
    /// tier.
    pub fn end_update(&mut self, scene: &mut dyn SceneBackend) {
        if !self.in_pass {
            warn!("content sync: end_update without begin_update");
            return;
        }
        for id in std::mem::take(&mut self.deferred_due) {
            self.remove_now(scene, id);
        }
        for state in self.tiers.values_mut() {
            state.batcher.flush(scene);
        }
        self.in_pass = false;
        self.stats.passes += 1;

        let touched = std::mem::take(&mut self.touched);
        for tier in touched {
            let content_count = self.tiers.get(&tier).map_or(0, TierState::content_count);
            self.listeners.notify(&CompletionEvent {
                tier,
                content_count,
                pass: self.stats.passes,
            });
        }
    }

    /// Accept a generation result into a tier
    ///
    /// Realizes parts (geometry and collision via the tier's material
    /// cache) and sub-placements (components, batched instances, spawned
    /// sub-objects) at the given placement offset, and returns the new
    /// content's id. Never fails: whatever cannot be realized is skipped
    /// with a warning and the rest of the result lands.
    pub fn add_content(
        &mut self,
        scene: &mut dyn SceneBackend,
        assets: &dyn AssetResolver,
        output: &GeneratedOutput,
        tier: TierId,
        offset: &Frame,
    ) -> ContentId {
        if !self.in_pass {
            warn!("content sync: add_content outside an update pass");
        }
        if output.parts.len() != output.declared_parts {
            warn!(
                "content sync: engine declared {} parts but delivered {}",
                output.declared_parts,
                output.parts.len()
            );
            self.stats.declaration_mismatches += 1;
        }
        if output.placements.len() != output.declared_placements {
            warn!(
                "content sync: engine declared {} placements but delivered {}",
                output.declared_placements,
                output.placements.len()
            );
            self.stats.declaration_mismatches += 1;
        }

        let default_material = self.default_material;
        let state = self
            .tiers
            .entry(tier)
            .or_insert_with(|| TierState::new(default_material));

        let base = offset.to_matrix();
        let mut parts = Vec::with_capacity(output.parts.len());
        let mut parts_realized = 0u64;
        for (index, part) in output.parts.iter().enumerate() {
            let variant = state.materials.resolve(
                scene,
                assets,
                part.material,
                part.snapshot.as_ref(),
                &part.textures,
            );
            let flags = classify_part(part, variant);
            let geometry = match (flags.contains(PartContent::RENDERABLE), variant.instance) {
                (true, Some(instance)) => Some(scene.create_geometry(part, &base, instance)),
                _ => None,
            };
            let collision = flags
                .contains(PartContent::COLLISION)
                .then(|| scene.create_collision(part, &base));
            if geometry.is_none() && collision.is_none() {
                debug!("content sync: part {index} of {} realized nothing", part.material);
            } else {
                parts_realized += 1;
            }
            parts.push(RealizedPart {
                geometry,
                collision,
            });
        }

        let mut components = Vec::new();
        let mut spawned = Vec::new();
        let mut instances = Vec::new();
        let mut placements_realized = 0u64;
        let mut placements_skipped = 0u64;
        for placement in &output.placements {
            let Some(info) = assets.resolve_object_type(placement.object_type) else {
                warn!(
                    "content sync: {} unresolved, placement skipped",
                    placement.object_type
                );
                placements_skipped += 1;
                continue;
            };
            let placed = marshal::extract_placement(&placement.params);
            let transform = base
                * placed.frame.to_matrix()
                * Mat4::new_translation(&(placed.local_offset + info.local_offset))
                * Mat4::new_scaling(placed.uniform_scale);
            match info.kind {
                PlacementKind::Mesh(mesh) => {
                    components.push(scene.attach_mesh(mesh, &transform));
                }
                PlacementKind::InstancedMesh(mesh) => {
                    instances.push(state.batcher.add_instance(scene, mesh, transform));
                }
                PlacementKind::Attachable(template) => {
                    components.push(scene.attach_template(template, &transform));
                }
                PlacementKind::NestedProcedure(procedure) => {
                    spawned.push(scene.spawn_object(procedure, &placement.params, &transform));
                }
            }
            placements_realized += 1;
        }

        let id = self.records.insert(ContentRecord {
            tier,
            parts,
            components,
            spawned,
            instances,
        });
        if let Some(state) = self.tiers.get_mut(&tier) {
            state.content.push(id);
        }
        self.mark_touched(tier);
        self.stats.content_added += 1;
        self.stats.parts_realized += parts_realized;
        self.stats.placements_realized += placements_realized;
        self.stats.placements_skipped += placements_skipped;
        id
    }

    /// Remove content by id
    ///
    /// A stale or already-removed id is a no-op. With deferred removal
    /// configured, the teardown is queued and happens at the end of the
    /// next pass, after that pass's re-adds; otherwise it happens now.
    pub fn remove_content(&mut self, scene: &mut dyn SceneBackend, id: ContentId) {
        if !self.records.contains_key(id) {
            debug!("content sync: remove_content for stale id, ignored");
            return;
        }
        if self.deferred_removal {
            if self.removal_pending(id) {
                debug!("content sync: removal already queued");
                return;
            }
            self.deferred_pending.push(id);
            return;
        }
        self.remove_now(scene, id);
    }

    /// Tear down everything
    ///
    /// Destroys every record's objects, then clears each tier's
    /// instancing infrastructure and material cache wholesale. No
    /// notifications fire; this is teardown, not a pass.
    pub fn remove_all(&mut self, scene: &mut dyn SceneBackend) {
        let mut removed = 0u64;
        for (_, record) in self.records.drain() {
            destroy_record_objects(scene, &record);
            removed += 1;
        }
        for state in self.tiers.values_mut() {
            state.batcher.clear_all(scene);
            state.materials.invalidate();
            state.content.clear();
        }
        self.deferred_pending.clear();
        self.deferred_due.clear();
        self.stats.content_removed += removed;
    }

    fn remove_now(&mut self, scene: &mut dyn SceneBackend, id: ContentId) {
        let Some(record) = self.records.remove(id) else {
            debug!("content sync: remove for stale id, ignored");
            return;
        };
        destroy_record_objects(scene, &record);
        if let Some(state) = self.tiers.get_mut(&record.tier) {
            // Retract entries still pending this pass; realized entries
            // need their batch rebuilt by the next flush instead.
            let mut instances = record.instances;
            instances.sort_unstable_by(|a, b| b.index.cmp(&a.index));
            for handle in instances {
                if !state.batcher.retract_pending(handle) {
                    state.batcher.mark_dirty(handle.slot);
                }
            }
            state.content.retain(|content| *content != id);
        }
        self.mark_touched(record.tier);
        self.stats.content_removed += 1;
    }

    fn mark_touched(&mut self, tier: TierId) {
        if !self.touched.contains(&tier) {
            self.touched.push(tier);
        }
    }
}

fn destroy_record_objects(scene: &mut dyn SceneBackend, record: &ContentRecord) {
    for part in &record.parts {
        if let Some(geometry) = part.geometry {
            scene.destroy_geometry(geometry);
        }
        if let Some(collision) = part.collision {
            scene.destroy_collision(collision);
        }
    }
    for component in &record.components {
        scene.detach_component(*component);
    }
    for handle in &record.spawned {
        scene.destroy_spawned(*handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::MeshAssetId;
    use crate::testing::{
        forest_assets, instanced_placement, mesh_placement, nested_placement, solid_part,
        template_placement, MockScene,
    };
    use std::cell::RefCell;
    use std::rc::Rc;

    const GROUND: TierId = TierId(0);

    fn cache() -> ContentSyncCache {
        ContentSyncCache::new(&SyncConfig::default())
    }

    fn forest_output() -> GeneratedOutput {
        GeneratedOutput::new(
            vec![solid_part(1), solid_part(1)],
            vec![
                mesh_placement(10),
                instanced_placement(11),
                instanced_placement(11),
                instanced_placement(11),
                template_placement(12),
                nested_placement(13),
            ],
        )
    }

    #[test]
    fn add_then_remove_restores_the_scene() {
        let mut scene = MockScene::default();
        let assets = forest_assets();
        let mut cache = cache();

        assert!(cache.begin_update());
        let id = cache.add_content(&mut scene, &assets, &forest_output(), GROUND, &Frame::unit());
        cache.end_update(&mut scene);

        assert_eq!(scene.live_geometry(), 2);
        assert_eq!(scene.live_components(), 2); // mesh + template
        assert_eq!(scene.live_spawned(), 1);
        assert_eq!(scene.primitive_for(MeshAssetId(21)).unwrap().count, 3);
        // Both parts share one material variant.
        assert_eq!(scene.created_material_instances, 1);
        assert_eq!(cache.tier(GROUND).unwrap().content_count(), 1);

        cache.begin_update();
        cache.remove_content(&mut scene, id);
        cache.end_update(&mut scene);

        assert_eq!(scene.live_geometry(), 0);
        assert_eq!(scene.live_components(), 0);
        assert_eq!(scene.live_spawned(), 0);
        assert_eq!(scene.primitive_for(MeshAssetId(21)).unwrap().count, 0);
        assert_eq!(cache.content_count(), 0);
        assert_eq!(cache.tier(GROUND).unwrap().content_count(), 0);
    }

    #[test]
    fn stale_ids_never_alias_new_content() {
        let mut scene = MockScene::default();
        let assets = forest_assets();
        let mut cache = cache();

        cache.begin_update();
        let first = cache.add_content(&mut scene, &assets, &forest_output(), GROUND, &Frame::unit());
        cache.remove_content(&mut scene, first);
        // Second removal of the same id is a no-op.
        cache.remove_content(&mut scene, first);
        let second = cache.add_content(&mut scene, &assets, &forest_output(), GROUND, &Frame::unit());
        cache.end_update(&mut scene);

        assert_ne!(first, second);
        assert!(!cache.contains(first));
        assert!(cache.contains(second));
        assert_eq!(cache.stats().content_removed, 1);
    }

    #[test]
    fn replacing_instanced_content_keeps_the_replacement() {
        let mut scene = MockScene::default();
        let assets = forest_assets();
        let mut cache = cache();
        let grove = GeneratedOutput::new(
            vec![],
            vec![instanced_placement(11), instanced_placement(11)],
        );

        cache.begin_update();
        let old = cache.add_content(&mut scene, &assets, &grove, GROUND, &Frame::unit());
        cache.end_update(&mut scene);
        assert_eq!(scene.primitive_for(MeshAssetId(21)).unwrap().count, 2);

        // A rebuild adds the replacement first, then retires the old id.
        // The old record's handles come from a flushed pass and must not
        // shrink the batch underneath the replacement.
        cache.begin_update();
        let replacement = cache.add_content(&mut scene, &assets, &grove, GROUND, &Frame::unit());
        cache.remove_content(&mut scene, old);
        cache.end_update(&mut scene);

        assert_eq!(scene.primitive_for(MeshAssetId(21)).unwrap().count, 2);
        assert!(cache.contains(replacement));
        assert!(!cache.contains(old));
    }

    #[test]
    fn collision_only_parts_create_no_geometry() {
        let mut scene = MockScene::default();
        let assets = forest_assets(); // material 2 is collision-intent
        let mut cache = cache();

        cache.begin_update();
        let output = GeneratedOutput::new(vec![solid_part(2)], vec![]);
        cache.add_content(&mut scene, &assets, &output, GROUND, &Frame::unit());
        cache.end_update(&mut scene);

        assert_eq!(scene.live_geometry(), 0);
        assert_eq!(scene.live_collision(), 1);
        assert_eq!(scene.created_material_instances, 0);
    }

    #[test]
    fn empty_parts_realize_nothing() {
        let mut scene = MockScene::default();
        let assets = forest_assets();
        let mut cache = cache();

        cache.begin_update();
        let mut part = solid_part(1);
        part.vertices.clear();
        part.indices.clear();
        let output = GeneratedOutput::new(vec![part], vec![]);
        cache.add_content(&mut scene, &assets, &output, GROUND, &Frame::unit());
        cache.end_update(&mut scene);

        assert_eq!(scene.live_geometry(), 0);
        assert_eq!(scene.live_collision(), 0);
        assert_eq!(cache.stats().parts_realized, 0);
    }

    #[test]
    fn declaration_mismatches_are_counted_not_fatal() {
        let mut scene = MockScene::default();
        let assets = forest_assets();
        let mut cache = cache();

        cache.begin_update();
        let mut output = GeneratedOutput::new(vec![solid_part(1)], vec![]);
        output.declared_parts = 3;
        let id = cache.add_content(&mut scene, &assets, &output, GROUND, &Frame::unit());
        cache.end_update(&mut scene);

        assert!(cache.contains(id));
        assert_eq!(scene.live_geometry(), 1);
        assert_eq!(cache.stats().declaration_mismatches, 1);
    }

    #[test]
    fn unresolved_object_types_are_skipped() {
        let mut scene = MockScene::default();
        let assets = forest_assets();
        let mut cache = cache();

        cache.begin_update();
        let output = GeneratedOutput::new(
            vec![],
            vec![mesh_placement(10), mesh_placement(99)], // 99 unknown
        );
        cache.add_content(&mut scene, &assets, &output, GROUND, &Frame::unit());
        cache.end_update(&mut scene);

        assert_eq!(scene.live_components(), 1);
        assert_eq!(cache.stats().placements_skipped, 1);
        assert_eq!(cache.stats().placements_realized, 1);
    }

    #[test]
    fn empty_results_still_complete_the_pass() {
        let mut scene = MockScene::default();
        let assets = forest_assets();
        let mut cache = cache();
        let seen = Rc::new(RefCell::new(Vec::new()));
        cache.add_listener(Box::new(Recorder {
            seen: Rc::clone(&seen),
        }));

        cache.begin_update();
        let id = cache.add_content(
            &mut scene,
            &assets,
            &GeneratedOutput::default(),
            GROUND,
            &Frame::unit(),
        );
        cache.end_update(&mut scene);

        assert!(cache.contains(id));
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(seen.borrow()[0].content_count, 1);
    }

    struct Recorder {
        seen: Rc<RefCell<Vec<CompletionEvent>>>,
    }

    impl SyncListener for Recorder {
        fn on_pass_complete(&mut self, event: &CompletionEvent) {
            self.seen.borrow_mut().push(*event);
        }
    }

    #[test]
    fn notifications_fire_per_touched_tier() {
        let mut scene = MockScene::default();
        let assets = forest_assets();
        let mut cache = cache();
        let seen = Rc::new(RefCell::new(Vec::new()));
        cache.add_listener(Box::new(Recorder {
            seen: Rc::clone(&seen),
        }));

        cache.begin_update();
        let output = GeneratedOutput::new(vec![solid_part(1)], vec![]);
        cache.add_content(&mut scene, &assets, &output, GROUND, &Frame::unit());
        cache.add_content(&mut scene, &assets, &output, TierId(3), &Frame::unit());
        cache.end_update(&mut scene);

        let events = seen.borrow();
        assert_eq!(events.len(), 2);
        assert!(events.iter().any(|e| e.tier == GROUND));
        assert!(events.iter().any(|e| e.tier == TierId(3)));
        assert!(events.iter().all(|e| e.pass == 1 && e.content_count == 1));
    }

    #[test]
    fn deferred_removal_survives_until_the_next_pass_end() {
        let mut scene = MockScene::default();
        let assets = forest_assets();
        let config = SyncConfig {
            deferred_removal: true,
            ..Default::default()
        };
        let mut cache = ContentSyncCache::new(&config);

        cache.begin_update();
        let output = GeneratedOutput::new(vec![solid_part(1)], vec![]);
        let id = cache.add_content(&mut scene, &assets, &output, GROUND, &Frame::unit());
        cache.end_update(&mut scene);
        assert_eq!(scene.live_geometry(), 1);

        // Removal inside this pass is queued, not executed.
        cache.begin_update();
        cache.remove_content(&mut scene, id);
        assert!(cache.removal_pending(id));
        cache.end_update(&mut scene);
        assert_eq!(scene.live_geometry(), 1);

        // The next pass replaces the content, then the old copy goes.
        cache.begin_update();
        let replacement =
            cache.add_content(&mut scene, &assets, &output, GROUND, &Frame::unit());
        cache.end_update(&mut scene);

        assert_eq!(scene.live_geometry(), 1);
        assert!(!cache.contains(id));
        assert!(cache.contains(replacement));
    }

    #[test]
    fn remove_all_clears_tiers_wholesale() {
        let mut scene = MockScene::default();
        let assets = forest_assets();
        let mut cache = cache();

        cache.begin_update();
        cache.add_content(&mut scene, &assets, &forest_output(), GROUND, &Frame::unit());
        cache.add_content(&mut scene, &assets, &forest_output(), TierId(1), &Frame::unit());
        cache.end_update(&mut scene);
        assert!(scene.live_primitive_count() > 0);

        cache.remove_all(&mut scene);

        assert_eq!(cache.content_count(), 0);
        assert_eq!(scene.live_geometry(), 0);
        assert_eq!(scene.live_components(), 0);
        assert_eq!(scene.live_spawned(), 0);
        assert_eq!(scene.live_primitive_count(), 0);
        assert!(cache.tier(GROUND).unwrap().materials.is_empty());
    }

    #[test]
    fn placement_offset_reaches_the_scene() {
        let mut scene = MockScene::default();
        let assets = forest_assets();
        let mut cache = cache();

        let offset = Frame::new(
            crate::foundation::math::Vec3::new(100.0, 0.0, 0.0),
            crate::foundation::math::Vec3::new(1.0, 1.0, 1.0),
        );
        cache.begin_update();
        let output = GeneratedOutput::new(vec![], vec![mesh_placement(10)]);
        cache.add_content(&mut scene, &assets, &output, GROUND, &offset);
        cache.end_update(&mut scene);

        let transform = scene.component_transforms.last().unwrap();
        assert!((transform[(0, 3)] - 100.0).abs() < 1.0e-5);
    }

    #[test]
    fn classification_covers_all_four_cases() {
        let with_geometry = solid_part(1);
        let mut bare = solid_part(1);
        bare.vertices.clear();

        let render_only = ResolvedVariant {
            instance: Some(crate::scene::MaterialInstanceHandle(1)),
            wants_collision: false,
        };
        let both = ResolvedVariant {
            instance: Some(crate::scene::MaterialInstanceHandle(1)),
            wants_collision: true,
        };
        let collision_only = ResolvedVariant {
            instance: None,
            wants_collision: true,
        };
        let nothing = ResolvedVariant {
            instance: None,
            wants_collision: false,
        };

        assert_eq!(
            classify_part(&with_geometry, render_only),
            PartContent::RENDERABLE
        );
        assert_eq!(
            classify_part(&with_geometry, both),
            PartContent::RENDERABLE | PartContent::COLLISION
        );
        assert_eq!(
            classify_part(&with_geometry, collision_only),
            PartContent::COLLISION
        );
        assert_eq!(classify_part(&with_geometry, nothing), PartContent::empty());
        assert_eq!(classify_part(&bare, both), PartContent::empty());
    }
}
