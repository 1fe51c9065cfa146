//! Tuple lifecycle tools: `tuple_init`, `tuple_get`, `tuple_update`.

use anyhow::Result;
use serde::Serialize;

use crate::core::types::{Slot, SlotAction, SlotContent, Tuple, TupleStatus};
use crate::io::tuple_store::TupleRepository;
use crate::kernel::Kernel;

const INIT_MESSAGE: &str = "Thinking Tuple initialized. Use tuple_update to modify slots, route_command to decide next action, evaluate_gradient after each step.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TupleInitResponse {
    pub id: String,
    pub task: String,
    pub status: TupleStatus,
    pub iteration: u32,
    pub message: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TupleUpdateResponse {
    pub id: String,
    pub slot: Slot,
    pub action: SlotAction,
    pub current_value: Vec<String>,
    pub iteration: u32,
}

impl<S: TupleRepository> Kernel<S> {
    pub fn tuple_init(
        &mut self,
        task: &str,
        constraints: Option<Vec<String>>,
        invariant: Option<Vec<String>>,
    ) -> Result<TupleInitResponse> {
        let tuple = self.store.create(
            task,
            constraints.unwrap_or_default(),
            invariant.unwrap_or_default(),
        )?;
        Ok(TupleInitResponse {
            id: tuple.id,
            task: tuple.task,
            status: tuple.status,
            iteration: tuple.iteration,
            message: INIT_MESSAGE,
        })
    }

    pub fn tuple_get(&mut self, id: &str) -> Result<Tuple> {
        self.store.get(id)
    }

    /// Parse `slot` and `action`, then apply the update. `content` is ignored for `clear`.
    pub fn tuple_update(
        &mut self,
        id: &str,
        slot: &str,
        action: &str,
        content: SlotContent,
    ) -> Result<TupleUpdateResponse> {
        let slot: Slot = slot.parse()?;
        let action: SlotAction = action.parse()?;
        let tuple = self
            .store
            .update_slot(id, slot, action, content.into_items())?;
        Ok(TupleUpdateResponse {
            current_value: tuple.slot(slot).to_vec(),
            id: tuple.id,
            slot,
            action,
            iteration: tuple.iteration,
        })
    }
}
