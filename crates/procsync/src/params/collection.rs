//! Ordered, typed parameter collections
//!
//! A [`ParameterCollection`] is the unit of parameter exchange with the
//! generation engine: an ordered list of id/value slots. Slot order is
//! engine-facing wire order and is preserved by every operation; lookups
//! go by id.
//!
//! Mutation is guarded by explicit edit brackets. The brackets are
//! re-entrancy guards for single-threaded callers (an event handler
//! mutating a collection that is mid-scan), not locks; violations log a
//! warning and the offending call becomes a no-op. Read brackets exist
//! for call-site symmetry and are advisory: lookups are permitted at any
//! time since the hazard the brackets guard against is mutation.

use crate::foundation::math::{Colour, Frame, Vec3};
use crate::params::value::{ParamId, ParamKind, ParamValue};
use log::{debug, warn};

/// One id/value slot in a collection
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSlot {
    /// Slot identifier
    pub id: ParamId,
    /// Slot value, which also carries the type tag
    pub value: ParamValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Idle,
    Editing,
    Reading,
}

/// Ordered collection of typed parameter slots
#[derive(Debug)]
pub struct ParameterCollection {
    slots: Vec<ParamSlot>,
    access: Access,
}

impl ParameterCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            access: Access::Idle,
        }
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if the collection has no slots
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// True if a slot with this id exists
    pub fn contains(&self, id: ParamId) -> bool {
        self.slots.iter().any(|slot| slot.id == id)
    }

    /// Iterate slots in wire order
    pub fn slots(&self) -> impl Iterator<Item = &ParamSlot> {
        self.slots.iter()
    }

    // --- Brackets -------------------------------------------------------

    /// Open an edit bracket
    ///
    /// Returns `false` (and logs) if any bracket is already open.
    pub fn begin_edit(&mut self) -> bool {
        if self.access == Access::Idle {
            self.access = Access::Editing;
            true
        } else {
            warn!(
                "ParameterCollection: begin_edit while a {:?} bracket is open",
                self.access
            );
            false
        }
    }

    /// Close the edit bracket opened by [`Self::begin_edit`]
    pub fn end_edit(&mut self) -> bool {
        if self.access == Access::Editing {
            self.access = Access::Idle;
            true
        } else {
            warn!("ParameterCollection: end_edit without a matching begin_edit");
            false
        }
    }

    /// Open a read bracket
    ///
    /// Returns `false` (and logs) if any bracket is already open.
    pub fn begin_read(&mut self) -> bool {
        if self.access == Access::Idle {
            self.access = Access::Reading;
            true
        } else {
            warn!(
                "ParameterCollection: begin_read while a {:?} bracket is open",
                self.access
            );
            false
        }
    }

    /// Close the read bracket opened by [`Self::begin_read`]
    pub fn end_read(&mut self) -> bool {
        if self.access == Access::Reading {
            self.access = Access::Idle;
            true
        } else {
            warn!("ParameterCollection: end_read without a matching begin_read");
            false
        }
    }

    fn require_edit(&self, op: &str) -> bool {
        if self.access == Access::Editing {
            true
        } else {
            warn!("ParameterCollection: {op} outside an edit bracket ignored");
            false
        }
    }

    // --- Slot management ------------------------------------------------

    /// Add a slot with the given id and value
    ///
    /// Fails if a slot with this id already exists or no edit bracket is
    /// open. New slots append to the end of the wire order.
    pub fn add_slot(&mut self, id: ParamId, value: ParamValue) -> bool {
        if !self.require_edit("add_slot") {
            return false;
        }
        if self.contains(id) {
            debug!("ParameterCollection: add_slot for existing id {id}");
            return false;
        }
        self.slots.push(ParamSlot { id, value });
        true
    }

    /// Remove the slot with the given id
    pub fn remove_slot(&mut self, id: ParamId) -> bool {
        if !self.require_edit("remove_slot") {
            return false;
        }
        let before = self.slots.len();
        self.slots.retain(|slot| slot.id != id);
        before != self.slots.len()
    }

    // --- Typed lookups (fail silently on absent id or kind mismatch) ---

    /// The value stored under an id, if any
    pub fn value(&self, id: ParamId) -> Option<&ParamValue> {
        self.slots
            .iter()
            .find(|slot| slot.id == id)
            .map(|slot| &slot.value)
    }

    /// The type tag stored under an id, if any
    pub fn kind_of(&self, id: ParamId) -> Option<ParamKind> {
        self.value(id).map(ParamValue::kind)
    }

    /// Look up a boolean slot
    pub fn find_bool(&self, id: ParamId) -> Option<bool> {
        match self.value(id)? {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Look up an integer slot
    pub fn find_integer(&self, id: ParamId) -> Option<i32> {
        match self.value(id)? {
            ParamValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Look up a float slot
    pub fn find_float(&self, id: ParamId) -> Option<f32> {
        match self.value(id)? {
            ParamValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Look up a string slot
    pub fn find_string(&self, id: ParamId) -> Option<&str> {
        match self.value(id)? {
            ParamValue::String(v) => Some(v),
            _ => None,
        }
    }

    /// Look up a colour slot
    pub fn find_colour(&self, id: ParamId) -> Option<Colour> {
        match self.value(id)? {
            ParamValue::Colour(v) => Some(*v),
            _ => None,
        }
    }

    /// Look up a vector slot
    pub fn find_vector3(&self, id: ParamId) -> Option<Vec3> {
        match self.value(id)? {
            ParamValue::Vector3(v) => Some(*v),
            _ => None,
        }
    }

    /// Look up a frame slot
    pub fn find_frame(&self, id: ParamId) -> Option<Frame> {
        match self.value(id)? {
            ParamValue::Frame(v) => Some(*v),
            _ => None,
        }
    }

    /// Look up a nested list slot
    pub fn find_list(&self, id: ParamId) -> Option<&ParameterCollection> {
        match self.value(id)? {
            ParamValue::List(v) => Some(v),
            _ => None,
        }
    }

    // --- Typed writes by id --------------------------------------------

    fn modify_value(&mut self, id: ParamId, value: ParamValue, op: &str) -> bool {
        if !self.require_edit(op) {
            return false;
        }
        match self.slots.iter_mut().find(|slot| slot.id == id) {
            Some(slot) if slot.value.kind() == value.kind() => {
                slot.value = value;
                true
            }
            Some(slot) => {
                debug!(
                    "ParameterCollection: {op} on {id} expects {}, slot is {}",
                    value.kind(),
                    slot.value.kind()
                );
                false
            }
            None => {
                debug!("ParameterCollection: {op} on missing id {id}");
                false
            }
        }
    }

    /// Overwrite a boolean slot by id
    pub fn modify_bool(&mut self, id: ParamId, value: bool) -> bool {
        self.modify_value(id, ParamValue::Bool(value), "modify_bool")
    }

    /// Overwrite an integer slot by id
    pub fn modify_integer(&mut self, id: ParamId, value: i32) -> bool {
        self.modify_value(id, ParamValue::Integer(value), "modify_integer")
    }

    /// Overwrite a float slot by id
    pub fn modify_float(&mut self, id: ParamId, value: f32) -> bool {
        self.modify_value(id, ParamValue::Float(value), "modify_float")
    }

    /// Overwrite a string slot by id
    pub fn modify_string(&mut self, id: ParamId, value: impl Into<String>) -> bool {
        self.modify_value(id, ParamValue::String(value.into()), "modify_string")
    }

    /// Overwrite a colour slot by id
    pub fn modify_colour(&mut self, id: ParamId, value: Colour) -> bool {
        self.modify_value(id, ParamValue::Colour(value), "modify_colour")
    }

    /// Overwrite a vector slot by id
    pub fn modify_vector3(&mut self, id: ParamId, value: Vec3) -> bool {
        self.modify_value(id, ParamValue::Vector3(value), "modify_vector3")
    }

    /// Overwrite a frame slot by id
    pub fn modify_frame(&mut self, id: ParamId, value: Frame) -> bool {
        self.modify_value(id, ParamValue::Frame(value), "modify_frame")
    }

    /// Overwrite a list slot by id
    pub fn modify_list(&mut self, id: ParamId, value: ParameterCollection) -> bool {
        self.modify_value(id, ParamValue::List(value), "modify_list")
    }

    // --- Typed writes by slot index ------------------------------------

    fn set_value(&mut self, index: usize, value: ParamValue, op: &str) -> bool {
        if !self.require_edit(op) {
            return false;
        }
        match self.slots.get_mut(index) {
            Some(slot) if slot.value.kind() == value.kind() => {
                slot.value = value;
                true
            }
            Some(slot) => {
                debug!(
                    "ParameterCollection: {op} at index {index} expects {}, slot is {}",
                    value.kind(),
                    slot.value.kind()
                );
                false
            }
            None => {
                debug!("ParameterCollection: {op} at out-of-range index {index}");
                false
            }
        }
    }

    /// Overwrite a boolean slot by wire-order index
    pub fn set_bool(&mut self, index: usize, value: bool) -> bool {
        self.set_value(index, ParamValue::Bool(value), "set_bool")
    }

    /// Overwrite an integer slot by wire-order index
    pub fn set_integer(&mut self, index: usize, value: i32) -> bool {
        self.set_value(index, ParamValue::Integer(value), "set_integer")
    }

    /// Overwrite a float slot by wire-order index
    pub fn set_float(&mut self, index: usize, value: f32) -> bool {
        self.set_value(index, ParamValue::Float(value), "set_float")
    }

    /// Overwrite a string slot by wire-order index
    pub fn set_string(&mut self, index: usize, value: impl Into<String>) -> bool {
        self.set_value(index, ParamValue::String(value.into()), "set_string")
    }

    /// Overwrite a colour slot by wire-order index
    pub fn set_colour(&mut self, index: usize, value: Colour) -> bool {
        self.set_value(index, ParamValue::Colour(value), "set_colour")
    }

    /// Overwrite a vector slot by wire-order index
    pub fn set_vector3(&mut self, index: usize, value: Vec3) -> bool {
        self.set_value(index, ParamValue::Vector3(value), "set_vector3")
    }

    /// Overwrite a frame slot by wire-order index
    pub fn set_frame(&mut self, index: usize, value: Frame) -> bool {
        self.set_value(index, ParamValue::Frame(value), "set_frame")
    }

    /// Overwrite a list slot by wire-order index
    pub fn set_list(&mut self, index: usize, value: ParameterCollection) -> bool {
        self.set_value(index, ParamValue::List(value), "set_list")
    }

    // --- Whole-collection operations ------------------------------------

    /// Merge another collection into this one
    ///
    /// Matching ids of the same kind are overwritten (list slots merge
    /// recursively); matching ids of a different kind log a warning and
    /// keep the existing value; unknown ids are appended.
    pub fn merge(&mut self, other: &Self) {
        if !self.require_edit("merge") {
            return;
        }
        self.merge_slots(other);
    }

    fn merge_slots(&mut self, other: &Self) {
        for slot in &other.slots {
            match self.slots.iter_mut().find(|mine| mine.id == slot.id) {
                Some(existing) if existing.value.kind() == slot.value.kind() => {
                    if let (ParamValue::List(mine), ParamValue::List(theirs)) =
                        (&mut existing.value, &slot.value)
                    {
                        mine.merge_slots(theirs);
                    } else {
                        existing.value = slot.value.clone();
                    }
                }
                Some(existing) => {
                    warn!(
                        "ParameterCollection: merge kind mismatch for {} ({} vs {}), keeping existing",
                        slot.id,
                        existing.value.kind(),
                        slot.value.kind()
                    );
                }
                None => self.slots.push(slot.clone()),
            }
        }
    }

    /// Conform this collection to a template
    ///
    /// Drops slots whose id is absent from the template, replaces slots
    /// whose kind disagrees with the template's, and appends template
    /// slots missing locally (with the template's value as default).
    /// Returns the number of slots dropped, replaced, or added; zero means
    /// the collection already conformed, so the operation is idempotent.
    /// Nested list contents are treated as values and are not conformed.
    pub fn sync_to_template(&mut self, template: &Self) -> usize {
        if !self.require_edit("sync_to_template") {
            return 0;
        }
        let mut changes = 0;
        self.slots.retain(|slot| {
            let keep = template.contains(slot.id);
            if !keep {
                changes += 1;
            }
            keep
        });
        for tslot in &template.slots {
            match self.slots.iter_mut().find(|mine| mine.id == tslot.id) {
                Some(slot) if slot.value.kind() == tslot.value.kind() => {}
                Some(slot) => {
                    slot.value = tslot.value.clone();
                    changes += 1;
                }
                None => {
                    self.slots.push(tslot.clone());
                    changes += 1;
                }
            }
        }
        changes
    }

    /// Deep value equality, ignoring slot order and bracket state
    pub fn equal(&self, other: &Self) -> bool {
        self.slots.len() == other.slots.len()
            && self
                .slots
                .iter()
                .all(|slot| other.value(slot.id) == Some(&slot.value))
    }

    /// Append a slot without bracket checks, for building resolved output
    pub(crate) fn push_unchecked(&mut self, id: ParamId, value: ParamValue) {
        self.slots.push(ParamSlot { id, value });
    }

    /// Repair degenerate frame axes in this collection and nested lists
    ///
    /// Returns the number of frames repaired.
    pub(crate) fn repair_frames(&mut self) -> usize {
        let mut repaired = 0;
        for slot in &mut self.slots {
            match &mut slot.value {
                ParamValue::Frame(frame) => {
                    if frame.repair_axes() {
                        repaired += 1;
                    }
                }
                ParamValue::List(list) => repaired += list.repair_frames(),
                _ => {}
            }
        }
        repaired
    }
}

impl Default for ParameterCollection {
    fn default() -> Self {
        Self::new()
    }
}

// Bracket state is transient guard state, not data: clones start idle and
// equality compares slots only.
impl Clone for ParameterCollection {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            access: Access::Idle,
        }
    }
}

impl PartialEq for ParameterCollection {
    fn eq(&self, other: &Self) -> bool {
        self.equal(other)
    }
}
