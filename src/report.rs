use serde::{Deserialize, Serialize};

use crate::timing::StageRecord;
use crate::verify::VerificationResult;

/// Complete outcome of one benchmark run: the backend that executed it,
/// per-stage timings in execution order, the verification outcome and
/// the wall time of the whole run (generation through verification).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub name: String,
    pub backend: String,
    pub detail: Option<String>,
    pub stages: Vec<StageRecord>,
    pub verification: VerificationResult,
    pub total_ms: f64,
}

impl RunReport {
    pub fn stage_ms(&self, label: &str) -> Option<f64> {
        self.stages
            .iter()
            .find(|stage| stage.label == label)
            .map(|stage| stage.duration_ms)
    }

    pub fn stage_total_ms(&self) -> f64 {
        self.stages.iter().map(|stage| stage.duration_ms).sum()
    }

    /// Line-oriented text: one line per stage in recorded order, then
    /// the correctness summary, then the total.
    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        lines.push(match &self.detail {
            Some(detail) => format!("backend: {} ({detail})", self.backend),
            None => format!("backend: {}", self.backend),
        });
        for stage in &self.stages {
            lines.push(format!("{:<14} {:>10.3} ms", stage.label, stage.duration_ms));
        }
        if self.verification.all_correct() {
            lines.push(format!("{} done: all results correct", self.name));
        } else {
            lines.push(format!(
                "{} done with {} errors",
                self.name, self.verification.mismatches
            ));
        }
        lines.push(format!("{:<14} {:>10.3} ms", "total", self.total_ms));
        lines.join("\n")
    }

    pub fn print(&self) {
        println!("{}", self.render());
    }
}
