use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Elapsed time since `start` in fractional milliseconds.
pub fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    pub label: String,
    pub duration_ms: f64,
}

/// Ordered log of timed stages. Stage order is insertion order and is
/// preserved through reporting.
#[derive(Debug, Default)]
pub struct StageLog {
    records: Vec<StageRecord>,
}

impl StageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Times `op` and appends a record under `label`. A failed stage is
    /// not recorded; the error propagates and ends the run, so no stage
    /// after the failing one is ever timed.
    pub fn time<T>(
        &mut self,
        label: impl Into<String>,
        op: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        let start = Instant::now();
        let value = op()?;
        self.records.push(StageRecord {
            label: label.into(),
            duration_ms: elapsed_ms(start),
        });
        Ok(value)
    }

    pub fn records(&self) -> &[StageRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<StageRecord> {
        self.records
    }
}
