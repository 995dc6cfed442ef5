//! Generation-engine boundary
//!
//! The synchronization layer drives an external procedural-generation
//! engine through the [`GenerationEngine`] trait. The engine owns
//! procedure specifications and a pool of concurrent generation channels;
//! builds are submitted as closures (a procedure bound to a parameter
//! payload) and complete asynchronously under a request id. The host is
//! responsible for marshalling completions back onto the update thread.

pub mod output;
pub mod rate_limiter;

use crate::params::collection::ParameterCollection;
use std::fmt;
use thiserror::Error;

/// Identifier of a generation procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcedureId(pub u32);

impl fmt::Display for ProcedureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "procedure#{}", self.0)
    }
}

/// Identifier of an in-flight generation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request#{}", self.0)
    }
}

/// A procedure's declared interface
#[derive(Debug, Clone)]
pub struct ProcedureSpec {
    /// Procedure identifier
    pub id: ProcedureId,
    /// Human-readable procedure name
    pub name: String,
    /// Input slots with their declared defaults
    ///
    /// Doubles as the resolve template and as the lowest-priority cascade
    /// layer: every rebuild of this procedure resolves exactly these
    /// slots, falling back to these values.
    pub inputs: ParameterCollection,
}

/// A procedure bound to a parameter payload, awaiting submission
#[derive(Debug)]
pub struct BuildClosure {
    /// Procedure to run
    pub procedure: ProcedureId,
    /// Parameter payload, created with the procedure's defaults
    pub params: ParameterCollection,
}

/// Errors from the generation-engine boundary
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine has no procedure under this id
    #[error("unknown {0}")]
    UnknownProcedure(ProcedureId),
    /// The engine refused the build submission
    #[error("build submission rejected: {0}")]
    BuildRejected(String),
}

/// Client-side interface to the generation engine
pub trait GenerationEngine {
    /// Number of concurrent generation channels the engine runs
    fn channel_count(&self) -> usize;

    /// Look up a procedure's declared interface
    fn procedure_spec(&self, id: ProcedureId) -> Option<&ProcedureSpec>;

    /// Create a build closure populated with the procedure's defaults
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownProcedure`] if the id is not registered.
    fn create_closure(&mut self, id: ProcedureId) -> Result<BuildClosure, EngineError>;

    /// Submit a closure for generation
    ///
    /// With `background` set the engine may generate off-thread and
    /// deliver the result whenever ready; otherwise it completes the
    /// request before the next update tick.
    ///
    /// # Errors
    ///
    /// [`EngineError::BuildRejected`] if the engine cannot take the work.
    fn build(&mut self, closure: BuildClosure, background: bool) -> Result<RequestId, EngineError>;
}
