//! Scene synchronization
//!
//! Reconciles generation results into the live scene: keyed content
//! records grouped into detail tiers, material variant deduplication per
//! tier, and per-tier instanced mesh batching flushed once per update
//! pass.

pub mod content;
pub mod instancing;
pub mod material;
