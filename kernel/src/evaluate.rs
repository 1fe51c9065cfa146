//! `evaluate_gradient`: record one iteration's progress signals.

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::core::gradient::{Recommendation, apply_gradient};
use crate::core::types::{GradientEntry, GradientSignals, TupleStatus};
use crate::io::tuple_store::TupleRepository;
use crate::kernel::Kernel;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradientResponse {
    /// Iteration count after this evaluation.
    pub iteration: u32,
    pub gradient: GradientEntry,
    pub recommendation: Recommendation,
    pub status: TupleStatus,
    pub total_iterations: u32,
    pub significant_count: usize,
}

impl<S: TupleRepository> Kernel<S> {
    pub fn evaluate_gradient(
        &mut self,
        tuple_id: &str,
        signals: GradientSignals,
        action: Option<String>,
        notes: Option<String>,
    ) -> Result<GradientResponse> {
        let max_iterations = self.config.max_iterations;
        let (_, outcome) = self.store.modify(tuple_id, |tuple| {
            apply_gradient(tuple, signals, action, notes, max_iterations, Utc::now())
        })?;

        if outcome.recommendation.is_terminate() {
            info!(
                tuple_id,
                status = outcome.status.as_str(),
                iteration = outcome.total_iterations,
                "gradient recommends termination"
            );
        }

        Ok(GradientResponse {
            iteration: outcome.total_iterations,
            gradient: outcome.entry,
            recommendation: outcome.recommendation,
            status: outcome.status,
            total_iterations: outcome.total_iterations,
            significant_count: outcome.significant_count,
        })
    }
}
