//! Cascade resolution across priority-ordered parameter sources
//!
//! A rebuild gathers its final parameters from several places: script
//! overrides, the parameters an object was created with, per-instance
//! settings, preset defaults, and the procedure spec's own defaults.
//! [`Cascade`] is that ordered list of borrowed sources; resolving it
//! against a template emits one collection with every template slot
//! filled from the highest-priority source that defines it.
//!
//! Resolution is all-or-nothing. If no source defines a template slot,
//! the whole resolve fails and the caller retries on the next rebuild;
//! partial parameter sets must never reach the engine.

use crate::params::collection::ParameterCollection;
use crate::params::value::{ParamId, ParamKind, ParamValue};
use log::{debug, warn};
use std::fmt;
use thiserror::Error;

/// Origin of a cascade layer, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeSource {
    /// Imperative override set by script at runtime
    ScriptOverride,
    /// Parameters the owning object was created with
    CreationParams,
    /// Per-instance parameter edits
    InstanceParams,
    /// Defaults from an applied preset
    PresetDefaults,
    /// Defaults declared by the procedure spec
    SpecDefaults,
}

impl fmt::Display for CascadeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ScriptOverride => "script override",
            Self::CreationParams => "creation params",
            Self::InstanceParams => "instance params",
            Self::PresetDefaults => "preset defaults",
            Self::SpecDefaults => "spec defaults",
        };
        f.write_str(name)
    }
}

/// Errors from cascade resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CascadeError {
    /// No source in the cascade defines a template slot
    #[error("no cascade source defines parameter {id} ({kind})")]
    Unresolved {
        /// The slot that could not be filled
        id: ParamId,
        /// The kind the template declares for it
        kind: ParamKind,
    },
}

struct Layer<'a> {
    source: CascadeSource,
    params: &'a ParameterCollection,
}

/// Priority-ordered list of borrowed parameter sources
///
/// Push layers highest priority first; by convention the last layer is
/// the procedure spec's defaults, which also serve as the template.
#[derive(Default)]
pub struct Cascade<'a> {
    layers: Vec<Layer<'a>>,
}

impl<'a> Cascade<'a> {
    /// Create an empty cascade
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Append a layer below every layer already present
    pub fn push(&mut self, source: CascadeSource, params: &'a ParameterCollection) {
        self.layers.push(Layer { source, params });
    }

    /// Builder-style [`Self::push`]
    #[must_use]
    pub fn with_layer(mut self, source: CascadeSource, params: &'a ParameterCollection) -> Self {
        self.push(source, params);
        self
    }

    /// Number of layers
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// True if the cascade has no layers
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Resolve the cascade against a template collection
    ///
    /// The output has exactly the template's slots, in template order, so
    /// identical inputs produce identical output. Scalar slots take the
    /// highest-priority value of the matching kind; a source holding the
    /// id at the wrong kind logs a warning and the scan falls through to
    /// lower priorities. List slots instead merge every source's list,
    /// lowest priority first, so higher-priority entries overwrite by id
    /// while unique entries from all sources survive. Frame values have
    /// collapsed axes replaced with the world basis before acceptance.
    ///
    /// # Errors
    ///
    /// [`CascadeError::Unresolved`] if any template slot is defined by no
    /// source; no partial output is produced.
    pub fn resolve(
        &self,
        template: &ParameterCollection,
    ) -> Result<ParameterCollection, CascadeError> {
        let mut resolved = ParameterCollection::new();
        for slot in template.slots() {
            let kind = slot.value.kind();
            let value = match kind {
                // Tag-only slots carry no data to resolve.
                ParamKind::None => ParamValue::None,
                ParamKind::List => ParamValue::List(self.merge_lists(slot.id)?),
                _ => self.scan(slot.id, kind)?,
            };
            resolved.push_unchecked(slot.id, value);
        }
        Ok(resolved)
    }

    fn scan(&self, id: ParamId, kind: ParamKind) -> Result<ParamValue, CascadeError> {
        for layer in &self.layers {
            if let Some(value) = layer.params.value(id) {
                if value.kind() == kind {
                    let mut value = value.clone();
                    if let ParamValue::Frame(frame) = &mut value {
                        if frame.repair_axes() {
                            debug!(
                                "cascade: repaired degenerate frame axes for {id} from {}",
                                layer.source
                            );
                        }
                    }
                    return Ok(value);
                }
                warn!(
                    "cascade: {} defines {id} as {}, expected {kind}; ignoring",
                    layer.source,
                    value.kind()
                );
            }
        }
        Err(CascadeError::Unresolved { id, kind })
    }

    fn merge_lists(&self, id: ParamId) -> Result<ParameterCollection, CascadeError> {
        let mut merged = ParameterCollection::new();
        let mut found = false;
        merged.begin_edit();
        for layer in self.layers.iter().rev() {
            if let Some(value) = layer.params.value(id) {
                if let ParamValue::List(list) = value {
                    merged.merge(list);
                    found = true;
                } else {
                    warn!(
                        "cascade: {} defines {id} as {}, expected list; ignoring",
                        layer.source,
                        value.kind()
                    );
                }
            }
        }
        merged.end_edit();
        if found {
            let repaired = merged.repair_frames();
            if repaired > 0 {
                debug!("cascade: repaired {repaired} frame(s) in merged list {id}");
            }
            Ok(merged)
        } else {
            Err(CascadeError::Unresolved {
                id,
                kind: ParamKind::List,
            })
        }
    }
}
