//! Per-owner synchronization orchestrator
//!
//! One [`Synchronizer`] ties the pieces together for one host-side owner.
//! A rebuild request resolves its parameter cascade immediately (with the
//! procedure's spec defaults as the lowest priority) and parks in a
//! single pending slot. Each tick, [`Synchronizer::update`] folds the
//! rate limiter's staged completions and dispatches the pending rebuild
//! once pacing allows. The host routes finished results through
//! [`Synchronizer::complete_request`], which reconciles them into the
//! scene inside one update pass and retires the tier's previous content.
//!
//! A rebuild queued while another is still pending supersedes it: the
//! older one never dispatches and never enters duration history. The
//! drop is logged at debug level and listeners are not told; the newer
//! rebuild's completion subsumes the older one's purpose.

use crate::config::SyncConfig;
use crate::engine::output::GeneratedOutput;
use crate::engine::rate_limiter::{RateLimiter, RateLimiterStats};
use crate::engine::{GenerationEngine, ProcedureId, RequestId};
use crate::foundation::math::Frame;
use crate::notify::SyncListener;
use crate::params::cascade::{Cascade, CascadeError, CascadeSource};
use crate::params::collection::ParameterCollection;
use crate::scene::{AssetResolver, SceneBackend};
use crate::sync::content::{ContentId, ContentSyncCache, SyncStats, TierId};
use log::{debug, warn};
use std::collections::HashMap;
use thiserror::Error;

/// Errors from the rebuild request path
///
/// Everything here is recoverable: the caller keeps its state and retries
/// on the next rebuild trigger.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The engine has no procedure under the requested id
    #[error("rebuild references unknown {0}")]
    UnknownProcedure(ProcedureId),

    /// Cascade resolution failed, retry on the next rebuild
    #[error("cascade resolution failed: {0}")]
    Unresolved(#[from] CascadeError),
}

/// Orchestrator statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SynchronizerStats {
    /// Rebuild requests accepted into the pending slot
    pub rebuilds_requested: u64,
    /// Pending rebuilds discarded by a newer request before dispatch
    pub rebuilds_superseded: u64,
    /// Builds submitted to the engine
    pub dispatched: u64,
    /// Completions reconciled into the scene
    pub completed: u64,
    /// Completions for ids this synchronizer was not tracking
    pub orphan_completions: u64,
    /// Dispatch attempts the engine boundary refused
    pub build_failures: u64,
}

struct PendingRebuild {
    procedure: ProcedureId,
    params: ParameterCollection,
    tier: TierId,
    offset: Frame,
}

struct InFlightRequest {
    tier: TierId,
    offset: Frame,
}

/// Per-owner synchronization front end
///
/// Owns the pending-rebuild slot, the request routing table, the rate
/// limiter, and the content cache for one host-side owner. All methods
/// run on the single update thread; completions arriving from the
/// engine's own workers must be marshalled onto that thread by the host
/// before calling [`Self::complete_request`].
pub struct Synchronizer {
    limiter: RateLimiter,
    cache: ContentSyncCache,
    pending: Option<PendingRebuild>,
    in_flight: HashMap<RequestId, InFlightRequest>,
    current: HashMap<TierId, ContentId>,
    background_builds: bool,
    stats: SynchronizerStats,
}

impl Synchronizer {
    /// Create a synchronizer for an engine reporting the given channel count
    ///
    /// `SyncConfig::channel_count_override` takes precedence over the
    /// reported count when set.
    pub fn new(config: &SyncConfig, engine_channels: usize) -> Self {
        let channels = config.channel_count_override.unwrap_or(engine_channels);
        Self {
            limiter: RateLimiter::new(channels, config.history_window, config.tracking_slots),
            cache: ContentSyncCache::new(config),
            pending: None,
            in_flight: HashMap::new(),
            current: HashMap::new(),
            background_builds: config.background_builds,
            stats: SynchronizerStats::default(),
        }
    }

    /// Adjust the channel count after a late engine report or host override
    pub fn set_channel_count(&mut self, channels: usize) {
        self.limiter.set_channel_count(channels);
    }

    /// Channel count the limiter is currently pacing against
    pub fn channel_count(&self) -> usize {
        self.limiter.channel_count()
    }

    /// Register a completion listener on the content cache
    pub fn add_listener(&mut self, listener: Box<dyn SyncListener>) {
        self.cache.add_listener(listener);
    }

    /// The content cache this synchronizer reconciles into
    pub fn content(&self) -> &ContentSyncCache {
        &self.cache
    }

    /// Mutable content cache access
    ///
    /// Hosts drive extra passes through this for content the synchronizer
    /// does not route itself, such as [`TierId::EDITING`] previews.
    pub fn content_mut(&mut self) -> &mut ContentSyncCache {
        &mut self.cache
    }

    /// True while a rebuild is waiting to dispatch
    pub fn has_pending_rebuild(&self) -> bool {
        self.pending.is_some()
    }

    /// Requests dispatched and not yet completed
    pub fn requests_in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Content currently realized for a tier, if any
    pub fn current_content(&self, tier: TierId) -> Option<ContentId> {
        self.current.get(&tier).copied()
    }

    /// Orchestrator statistics snapshot
    pub fn stats(&self) -> SynchronizerStats {
        self.stats
    }

    /// Rate limiter statistics snapshot
    pub fn limiter_stats(&self) -> RateLimiterStats {
        self.limiter.stats()
    }

    /// Content cache statistics snapshot
    pub fn sync_stats(&self) -> SyncStats {
        self.cache.stats()
    }

    /// Queue a rebuild of a procedure's content
    ///
    /// The cascade is resolved against the procedure's input template
    /// right away, with the spec defaults appended as the lowest-priority
    /// layer, so the pending slot holds a complete parameter set with no
    /// borrows left open. A rebuild already pending is superseded: it
    /// never dispatches and leaves no trace in duration history.
    ///
    /// # Errors
    ///
    /// [`SyncError::UnknownProcedure`] if the engine does not register
    /// the procedure; [`SyncError::Unresolved`] if a template slot
    /// resolves from no source.
    pub fn request_rebuild<'c>(
        &mut self,
        engine: &'c dyn GenerationEngine,
        procedure: ProcedureId,
        mut cascade: Cascade<'c>,
        tier: TierId,
        offset: Frame,
    ) -> Result<(), SyncError> {
        let Some(spec) = engine.procedure_spec(procedure) else {
            return Err(SyncError::UnknownProcedure(procedure));
        };
        cascade.push(CascadeSource::SpecDefaults, &spec.inputs);
        let params = cascade.resolve(&spec.inputs)?;
        if let Some(superseded) = self.pending.replace(PendingRebuild {
            procedure,
            params,
            tier,
            offset,
        }) {
            debug!(
                "synchronizer: pending rebuild of {} superseded before dispatch",
                superseded.procedure
            );
            self.stats.rebuilds_superseded += 1;
        }
        self.stats.rebuilds_requested += 1;
        Ok(())
    }

    /// Per-tick update: fold staged completions, dispatch when pacing allows
    ///
    /// Call once per frame. A pending rebuild held back by the rate
    /// limiter stays queued; a build the engine refuses is re-queued and
    /// retried next tick.
    pub fn update(&mut self, engine: &mut dyn GenerationEngine) {
        self.limiter.update();
        if self.limiter.check_defer() {
            return;
        }
        let Some(rebuild) = self.pending.take() else {
            return;
        };
        self.dispatch(engine, rebuild);
    }

    /// Reconcile a finished generation result into the scene
    ///
    /// Runs one update pass: the result lands as new content in the tier
    /// the request was routed to, the tier's previous content is retired
    /// (queued for the next pass end under deferred removal), and
    /// listeners hear about the touched tier. Completions for unknown
    /// ids, including requests cancelled by [`Self::remove_all`], are
    /// discarded with a warning. Returns the new content id, or `None`
    /// for a discarded completion.
    pub fn complete_request(
        &mut self,
        scene: &mut dyn SceneBackend,
        assets: &dyn AssetResolver,
        request: RequestId,
        output: &GeneratedOutput,
    ) -> Option<ContentId> {
        let Some(route) = self.in_flight.remove(&request) else {
            warn!("synchronizer: completion for unknown {request} discarded");
            self.stats.orphan_completions += 1;
            return None;
        };
        self.limiter.end(request);
        self.cache.begin_update();
        let id = self
            .cache
            .add_content(scene, assets, output, route.tier, &route.offset);
        if let Some(replaced) = self.current.insert(route.tier, id) {
            self.cache.remove_content(scene, replaced);
        }
        self.cache.end_update(scene);
        self.stats.completed += 1;
        debug!("synchronizer: {request} completed into {}", route.tier);
        Some(id)
    }

    /// Tear down all realized content and forget in-flight bookkeeping
    ///
    /// The pending rebuild is dropped and routing for dispatched requests
    /// is cleared; their completions, if they ever arrive, are discarded
    /// as unknown.
    pub fn remove_all(&mut self, scene: &mut dyn SceneBackend) {
        if self.pending.take().is_some() {
            debug!("synchronizer: pending rebuild dropped by remove_all");
        }
        self.in_flight.clear();
        self.current.clear();
        self.cache.remove_all(scene);
    }

    fn dispatch(&mut self, engine: &mut dyn GenerationEngine, rebuild: PendingRebuild) {
        let mut closure = match engine.create_closure(rebuild.procedure) {
            Ok(closure) => closure,
            Err(error) => {
                warn!(
                    "synchronizer: closure for {} failed: {error}; rebuild dropped",
                    rebuild.procedure
                );
                self.stats.build_failures += 1;
                return;
            }
        };
        closure.params.begin_edit();
        closure.params.merge(&rebuild.params);
        closure.params.end_edit();

        match engine.build(closure, self.background_builds) {
            Ok(request) => {
                self.limiter.begin(request);
                self.in_flight.insert(
                    request,
                    InFlightRequest {
                        tier: rebuild.tier,
                        offset: rebuild.offset,
                    },
                );
                self.stats.dispatched += 1;
                debug!("synchronizer: dispatched {} as {request}", rebuild.procedure);
            }
            Err(error) => {
                warn!(
                    "synchronizer: build of {} refused: {error}; queued for retry",
                    rebuild.procedure
                );
                self.stats.build_failures += 1;
                self.pending = Some(rebuild);
            }
        }
    }
}
