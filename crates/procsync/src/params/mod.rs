//! Parameter model
//!
//! Typed parameter values and collections, cascade resolution across
//! priority-ordered sources, and marshalling of placement metadata out of
//! engine-produced collections.

pub mod cascade;
pub mod collection;
pub mod marshal;
pub mod value;
