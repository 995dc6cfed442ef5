//! Foundation module - Core utilities and types
//!
//! Fundamental utilities used throughout the synchronization layer:
//! - Math types (vectors, matrices, colours, placement frames)
//! - Collections (handle maps, bounded pools)
//! - Time measurement

pub mod collections;
pub mod math;
pub mod time;
