//! Material variant deduplication
//!
//! Generated parts key their shading by (engine material id, parameter
//! snapshot, texture set). Many parts of a result, and many results in a
//! tier, repeat the same triple; creating a fresh material instance per
//! part would swamp the host. [`MaterialVariantCache`] deduplicates the
//! triple to one live instance per tier.

use crate::engine::output::{MaterialId, TextureId};
use crate::params::collection::ParameterCollection;
use crate::scene::{AssetResolver, BaseMaterialId, MaterialInfo, MaterialInstanceHandle, SceneBackend};
use log::{debug, warn};

/// Result of resolving a part's material through the variant cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedVariant {
    /// Live material instance, absent for collision-only or unresolvable materials
    pub instance: Option<MaterialInstanceHandle>,
    /// Whether parts with this material should produce collision geometry
    pub wants_collision: bool,
}

#[derive(Debug)]
struct VariantEntry {
    material: MaterialId,
    snapshot: Option<ParameterCollection>,
    textures: Vec<TextureId>,
    resolved: ResolvedVariant,
}

/// Per-tier cache mapping (material, snapshot, textures) to a live instance
///
/// Lookup is a linear scan with deep snapshot equality; snapshots cannot
/// hash and tiers hold tens of variants, not thousands. A hit whose
/// instance the host has since dropped is purged and re-resolved.
/// [`MaterialVariantCache::invalidate`] empties the cache without touching
/// the instances; instances are pooled host-side and never reclaimed
/// individually from here.
pub struct MaterialVariantCache {
    entries: Vec<VariantEntry>,
    default_material: Option<BaseMaterialId>,
}

impl MaterialVariantCache {
    /// Create a cache with an optional fallback base material
    pub fn new(default_material: Option<BaseMaterialId>) -> Self {
        Self {
            entries: Vec::new(),
            default_material,
        }
    }

    /// Number of cached variants
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the cache holds no variants
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a part's material triple to a live instance
    ///
    /// Cache hit returns the stored handle (after a liveness check).
    /// On miss the material id goes through the asset resolver: materials
    /// with a base material get an instance with the snapshot applied;
    /// collision-intent materials without a base produce no instance and
    /// set the collision flag; anything unresolvable falls back to the
    /// configured default material, or to no instance if none is set.
    pub fn resolve(
        &mut self,
        scene: &mut dyn SceneBackend,
        assets: &dyn AssetResolver,
        material: MaterialId,
        snapshot: Option<&ParameterCollection>,
        textures: &[TextureId],
    ) -> ResolvedVariant {
        if let Some(index) = self.entries.iter().position(|entry| {
            entry.material == material
                && entry.snapshot.as_ref() == snapshot
                && entry.textures == textures
        }) {
            let alive = match self.entries[index].resolved.instance {
                Some(handle) => scene.material_instance_alive(handle),
                None => true,
            };
            if alive {
                return self.entries[index].resolved;
            }
            debug!("material cache: instance for {material} expired, rebuilding");
            self.entries.swap_remove(index);
        }

        let resolved = match assets.resolve_material(material) {
            Some(MaterialInfo {
                base: None,
                wants_collision: true,
            }) => ResolvedVariant {
                instance: None,
                wants_collision: true,
            },
            Some(info) => {
                let instance = match info.base.or(self.default_material) {
                    Some(base) => Some(scene.create_material_instance(base, snapshot, textures)),
                    None => {
                        warn!("material cache: {material} has no base material and no default is configured");
                        None
                    }
                };
                ResolvedVariant {
                    instance,
                    wants_collision: info.wants_collision,
                }
            }
            None => {
                let instance = match self.default_material {
                    Some(base) => {
                        warn!("material cache: {material} unresolved, using default");
                        Some(scene.create_material_instance(base, snapshot, textures))
                    }
                    None => {
                        warn!("material cache: {material} unresolved and no default is configured");
                        None
                    }
                };
                ResolvedVariant {
                    instance,
                    wants_collision: false,
                }
            }
        };

        self.entries.push(VariantEntry {
            material,
            snapshot: snapshot.cloned(),
            textures: textures.to_vec(),
            resolved,
        });
        resolved
    }

    /// Drop every cached variant without touching the live instances
    pub fn invalidate(&mut self) {
        debug!("material cache: invalidated {} variants", self.entries.len());
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::value::{ParamId, ParamValue};
    use crate::testing::{MockScene, TableAssets};

    fn snapshot(value: f32) -> ParameterCollection {
        let mut params = ParameterCollection::new();
        params.begin_edit();
        params.add_slot(ParamId(1), ParamValue::Float(value));
        params.end_edit();
        params
    }

    #[test]
    fn equal_triples_share_one_instance() {
        let mut scene = MockScene::default();
        let assets = TableAssets::with_material(
            MaterialId(1),
            MaterialInfo {
                base: Some(BaseMaterialId(10)),
                wants_collision: false,
            },
        );
        let mut cache = MaterialVariantCache::new(None);
        let snap = snapshot(0.5);

        let first = cache.resolve(&mut scene, &assets, MaterialId(1), Some(&snap), &[TextureId(3)]);
        let second = cache.resolve(&mut scene, &assets, MaterialId(1), Some(&snap), &[TextureId(3)]);

        assert_eq!(first.instance, second.instance);
        assert!(first.instance.is_some());
        assert_eq!(scene.created_material_instances, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn any_key_component_differing_makes_a_new_variant() {
        let mut scene = MockScene::default();
        let assets = TableAssets::with_material(
            MaterialId(1),
            MaterialInfo {
                base: Some(BaseMaterialId(10)),
                wants_collision: false,
            },
        );
        let mut cache = MaterialVariantCache::new(None);
        let snap_a = snapshot(0.5);
        let snap_b = snapshot(0.9);

        cache.resolve(&mut scene, &assets, MaterialId(1), Some(&snap_a), &[]);
        cache.resolve(&mut scene, &assets, MaterialId(1), Some(&snap_b), &[]);
        cache.resolve(&mut scene, &assets, MaterialId(1), Some(&snap_a), &[TextureId(1)]);
        cache.resolve(&mut scene, &assets, MaterialId(1), None, &[]);

        assert_eq!(cache.len(), 4);
        assert_eq!(scene.created_material_instances, 4);
    }

    #[test]
    fn expired_instances_are_purged_and_rebuilt() {
        let mut scene = MockScene::default();
        let assets = TableAssets::with_material(
            MaterialId(1),
            MaterialInfo {
                base: Some(BaseMaterialId(10)),
                wants_collision: false,
            },
        );
        let mut cache = MaterialVariantCache::new(None);

        let first = cache.resolve(&mut scene, &assets, MaterialId(1), None, &[]);
        let handle = first.instance.unwrap();
        scene.kill_material_instance(handle);

        let second = cache.resolve(&mut scene, &assets, MaterialId(1), None, &[]);
        assert_ne!(second.instance, Some(handle));
        assert_eq!(cache.len(), 1);
        assert_eq!(scene.created_material_instances, 2);
    }

    #[test]
    fn collision_intent_materials_produce_no_instance() {
        let mut scene = MockScene::default();
        let assets = TableAssets::with_material(
            MaterialId(2),
            MaterialInfo {
                base: None,
                wants_collision: true,
            },
        );
        let mut cache = MaterialVariantCache::new(Some(BaseMaterialId(99)));

        let resolved = cache.resolve(&mut scene, &assets, MaterialId(2), None, &[]);
        assert_eq!(resolved.instance, None);
        assert!(resolved.wants_collision);
        assert_eq!(scene.created_material_instances, 0);
    }

    #[test]
    fn unresolved_materials_fall_back_to_default() {
        let mut scene = MockScene::default();
        let assets = TableAssets::default();
        let mut cache = MaterialVariantCache::new(Some(BaseMaterialId(99)));

        let resolved = cache.resolve(&mut scene, &assets, MaterialId(5), None, &[]);
        assert!(resolved.instance.is_some());
        assert!(!resolved.wants_collision);

        let mut bare = MaterialVariantCache::new(None);
        let unresolved = bare.resolve(&mut scene, &assets, MaterialId(5), None, &[]);
        assert_eq!(unresolved.instance, None);
    }

    #[test]
    fn invalidate_keeps_instances_alive() {
        let mut scene = MockScene::default();
        let assets = TableAssets::with_material(
            MaterialId(1),
            MaterialInfo {
                base: Some(BaseMaterialId(10)),
                wants_collision: false,
            },
        );
        let mut cache = MaterialVariantCache::new(None);
        let resolved = cache.resolve(&mut scene, &assets, MaterialId(1), None, &[]);

        cache.invalidate();
        assert!(cache.is_empty());
        assert!(scene.material_instance_alive(resolved.instance.unwrap()));

        // Next resolve builds a fresh instance rather than finding the old one.
        cache.resolve(&mut scene, &assets, MaterialId(1), None, &[]);
        assert_eq!(scene.created_material_instances, 2);
    }
}
