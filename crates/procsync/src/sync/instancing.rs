//! Instanced mesh batching
//!
//! Sub-placements that resolve to instanced meshes do not become scene
//! objects one by one. Transforms accumulate per mesh asset during an
//! update pass and flush once at pass end: the host primitive resizes to
//! the pending count, every transform applies in a single call, and the
//! pending list clears.
//!
//! There is no per-instance removal from a realized primitive. Retracting
//! a pending entry re-packs the list and invalidates handles issued later
//! in the same pass; removal of already-flushed content instead marks the
//! batch dirty so the next flush rebuilds it from whatever that pass
//! re-adds. Handles carry the pass epoch they were issued in, so a handle
//! that outlived its pass falls to the rebuild path instead of eating an
//! entry a later pass queued at the same index. Callers that need
//! instance granularity rebuild the whole batch every pass.

use crate::foundation::math::Mat4;
use crate::scene::{MeshAssetId, PrimitiveHandle, SceneBackend};
use log::debug;

/// Handle to one pending instance: batch slot plus sequence index
///
/// Valid only until the pass flushes or an earlier entry of the same
/// batch is retracted. The epoch stamp keeps a handle from outliving
/// its pass: once the batcher flushes, retraction through the handle
/// refuses instead of touching whatever a later pass queued there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceHandle {
    /// Index of the batch (one batch per mesh asset)
    pub slot: usize,
    /// Sequence index within the batch's current pending list
    pub index: usize,
    epoch: u64,
}

#[derive(Debug)]
struct MeshBatch {
    mesh: MeshAssetId,
    primitive: PrimitiveHandle,
    pending: Vec<Mat4>,
    dirty: bool,
}

/// Per-tier instanced mesh batcher
pub struct InstancedMeshBatcher {
    batches: Vec<MeshBatch>,
    epoch: u64,
}

impl InstancedMeshBatcher {
    /// Create an empty batcher
    pub fn new() -> Self {
        Self {
            batches: Vec::new(),
            epoch: 0,
        }
    }

    /// Number of batches (one per mesh asset seen)
    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    /// Pending transforms queued for a mesh in the current pass
    pub fn pending_count(&self, mesh: MeshAssetId) -> usize {
        self.batches
            .iter()
            .find(|batch| batch.mesh == mesh)
            .map_or(0, |batch| batch.pending.len())
    }

    /// Queue an instance of a mesh for this pass
    ///
    /// The batch and its host primitive are created lazily on first use.
    pub fn add_instance(
        &mut self,
        scene: &mut dyn SceneBackend,
        mesh: MeshAssetId,
        transform: Mat4,
    ) -> InstanceHandle {
        let slot = match self.batches.iter().position(|batch| batch.mesh == mesh) {
            Some(slot) => slot,
            None => {
                let primitive = scene.create_instance_primitive(mesh);
                debug!("instancing: new batch for {mesh:?}");
                self.batches.push(MeshBatch {
                    mesh,
                    primitive,
                    pending: Vec::new(),
                    dirty: false,
                });
                self.batches.len() - 1
            }
        };
        let batch = &mut self.batches[slot];
        batch.pending.push(transform);
        batch.dirty = true;
        InstanceHandle {
            slot,
            index: batch.pending.len() - 1,
            epoch: self.epoch,
        }
    }

    /// Retract an entry queued earlier in the current pass
    ///
    /// Returns `false` if the handle's pass has already flushed or a
    /// retraction re-packed past its entry. The pending list shifts
    /// down, so handles issued after this one are invalidated. A stale
    /// handle never matches by index alone; retiring old content falls
    /// to `mark_dirty` instead of eating a later pass's entry.
    pub fn retract_pending(&mut self, handle: InstanceHandle) -> bool {
        let Some(batch) = self.batches.get_mut(handle.slot) else {
            debug!("instancing: retract for unknown batch slot {}", handle.slot);
            return false;
        };
        if handle.epoch != self.epoch {
            debug!(
                "instancing: retract with a flushed-pass handle for {:?}",
                batch.mesh
            );
            return false;
        }
        if handle.index < batch.pending.len() {
            batch.pending.remove(handle.index);
            batch.dirty = true;
            true
        } else {
            debug!(
                "instancing: retract index {} past pending range of {:?}",
                handle.index, batch.mesh
            );
            false
        }
    }

    /// Force a batch to reconcile on the next flush
    ///
    /// Used when realized content is removed: the primitive shrinks to
    /// whatever the pass re-added (possibly nothing).
    pub fn mark_dirty(&mut self, slot: usize) {
        if let Some(batch) = self.batches.get_mut(slot) {
            batch.dirty = true;
        }
    }

    /// Flush dirty batches: resize, bulk-apply transforms, clear pending
    ///
    /// Ends the pass for retraction purposes; handles issued before the
    /// flush go stale.
    pub fn flush(&mut self, scene: &mut dyn SceneBackend) {
        for batch in &mut self.batches {
            if !batch.dirty {
                continue;
            }
            scene.resize_instances(batch.primitive, batch.pending.len());
            scene.set_instance_transforms(batch.primitive, &batch.pending);
            batch.pending.clear();
            batch.dirty = false;
        }
        self.epoch += 1;
    }

    /// Destroy every primitive and drop all batches
    pub fn clear_all(&mut self, scene: &mut dyn SceneBackend) {
        for batch in self.batches.drain(..) {
            scene.destroy_instance_primitive(batch.primitive);
        }
        self.epoch += 1;
    }
}

impl Default for InstancedMeshBatcher {
    fn default() -> Self {
        Self::new()
    }
}
