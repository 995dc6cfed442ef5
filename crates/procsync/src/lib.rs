//! # Procsync
//!
//! A client-side synchronization layer between an external procedural-content
//! generation engine and a live scene graph.
//!
//! ## Features
//!
//! - **Parameter Cascades**: Typed parameter collections resolved through
//!   priority-ordered source lists with per-slot fallback
//! - **Request Pacing**: Moving-average rate limiting sized to the engine's
//!   concurrent channel count
//! - **Diff-Based Sync**: Generation results reconciled into the scene as
//!   keyed content records, changing only what differs between rebuilds
//! - **Material Dedup**: One live material instance per distinct
//!   (material, parameter snapshot, texture set) triple, per detail tier
//! - **Instanced Batching**: Per-asset transform batches flushed once per
//!   update pass as a single resize plus bulk upload
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use procsync::prelude::*;
//!
//! let config = SyncConfig::default();
//! let mut sync = Synchronizer::new(&config, 4);
//! sync.set_channel_count(8); // engine reported more channels after startup
//! ```
//!
//! Each frame the host calls [`Synchronizer::update`] to let any pending
//! rebuild dispatch once the rate limiter allows it, and routes finished
//! generation results through [`Synchronizer::complete_request`], which
//! reconciles them into the scene inside a begin/end update pass.

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Foundation utilities shared by every layer
pub mod foundation;

// Parameter model: values, collections, cascade resolution, marshalling
pub mod params;

// Generation-engine boundary: traits, outputs, request pacing
pub mod engine;

// Scene-graph boundary traits and handle types
pub mod scene;

// Scene synchronization: content records, material dedup, instance batching
pub mod sync;

// Completion notification plumbing
pub mod notify;

// Configuration loading
pub mod config;

mod synchronizer;

pub use synchronizer::{SyncError, Synchronizer, SynchronizerStats};

#[cfg(test)]
pub(crate) mod testing;

/// Common imports for library users
pub mod prelude {
    pub use crate::{
        SyncError, Synchronizer, SynchronizerStats,
        config::{Config, ConfigError, SyncConfig},
        engine::{
            output::{GeneratedOutput, GeneratedPart, SubPlacement, Vertex},
            rate_limiter::{RateLimiter, RateLimiterStats},
            EngineError, GenerationEngine, ProcedureId, ProcedureSpec, RequestId,
        },
        foundation::{
            math::{Colour, Frame, Mat4, Vec3},
            time::Stopwatch,
        },
        notify::{CompletionEvent, SyncListener},
        params::{
            cascade::{Cascade, CascadeError, CascadeSource},
            collection::ParameterCollection,
            value::{ParamId, ParamKind, ParamValue},
        },
        scene::{AssetResolver, MaterialInfo, PlacementInfo, PlacementKind, SceneBackend},
        sync::{
            content::{ContentId, ContentSyncCache, TierId},
            instancing::InstancedMeshBatcher,
            material::MaterialVariantCache,
        },
    };
}
