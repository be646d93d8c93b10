//! Batch reports returned to the operator.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{EditorAdminId, NovelId};

/// Outcome of one month-scoped generation batch.
///
/// Per-record skips and non-blocking anomalies are collected here for
/// operator review rather than failing the batch.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BatchReport {
    /// `YYYY-MM` batch key.
    pub month: String,
    /// Rows written.
    pub generated: u64,
    /// Records passed over with a recorded reason.
    pub skipped: u64,
    pub skip_reasons: Vec<String>,
    /// Non-blocking anomalies (day-count mismatches, unassigned pools).
    pub warnings: Vec<String>,
}

impl BatchReport {
    pub fn new(month: impl Into<String>) -> Self {
        Self {
            month: month.into(),
            ..Self::default()
        }
    }

    /// Record a per-record skip with its reason.
    pub fn skip(&mut self, reason: impl Into<String>) {
        self.skipped += 1;
        self.skip_reasons.push(reason.into());
    }

    /// Record a non-blocking anomaly.
    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

/// One editor's computed share of a novel's monthly pools.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EditorShare {
    pub editor_admin_id: EditorAdminId,
    pub amount_usd: Decimal,
}

/// Result of distributing one novel's monthly champion income.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EditorDistribution {
    pub novel_id: NovelId,
    pub month: String,
    pub champion_income: Decimal,
    pub chief_pool: Decimal,
    pub editor_pool: Decimal,
    /// Shares actually credited, chiefs and editors alike.
    pub shares: Vec<EditorShare>,
    pub warnings: Vec<String>,
}

impl EditorDistribution {
    /// Whether anything was credited.
    pub fn distributed(&self) -> bool {
        !self.shares.is_empty()
    }
}

/// A novel that failed during a multi-novel distribution run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FailedNovel {
    pub novel_id: NovelId,
    pub error: String,
}

/// Collected outcome of a multi-novel distribution run. Novels commit
/// independently, so successes stand even when later novels fail.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EditorBatchOutcome {
    pub succeeded: Vec<EditorDistribution>,
    pub failed: Vec<FailedNovel>,
}
