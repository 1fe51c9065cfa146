//! Tuple construction and slot transitions.

use chrono::{DateTime, Utc};

use crate::core::types::{Slot, SlotAction, Tuple, TupleStatus};

/// Marker a `check` entry carries when the invariant has been verified.
pub const PASS_MARKER: &str = "PASS";

impl Tuple {
    /// Fresh tuple in `running` state with only the supplied slots populated.
    pub fn new(
        id: String,
        task: String,
        constraints: Vec<String>,
        invariant: Vec<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            task,
            constraints,
            invariant,
            principles: Vec::new(),
            strategy: Vec::new(),
            check: Vec::new(),
            iteration: 0,
            status: TupleStatus::Running,
            gradient_history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn slot(&self, slot: Slot) -> &[String] {
        match slot {
            Slot::Constraints => &self.constraints,
            Slot::Invariant => &self.invariant,
            Slot::Principles => &self.principles,
            Slot::Strategy => &self.strategy,
            Slot::Check => &self.check,
        }
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut Vec<String> {
        match slot {
            Slot::Constraints => &mut self.constraints,
            Slot::Invariant => &mut self.invariant,
            Slot::Principles => &mut self.principles,
            Slot::Strategy => &mut self.strategy,
            Slot::Check => &mut self.check,
        }
    }

    /// Apply a slot update. `items` is ignored for [`SlotAction::Clear`].
    pub fn apply_slot_update(
        &mut self,
        slot: Slot,
        action: SlotAction,
        items: Vec<String>,
        now: DateTime<Utc>,
    ) {
        let target = self.slot_mut(slot);
        match action {
            SlotAction::Append => target.extend(items),
            SlotAction::Replace => *target = items,
            SlotAction::Clear => target.clear(),
        }
        self.touch(now);
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    /// True when any `check` entry contains [`PASS_MARKER`], ignoring case.
    pub fn check_passes(&self) -> bool {
        self.check
            .iter()
            .any(|entry| entry.to_uppercase().contains(PASS_MARKER))
    }
}
