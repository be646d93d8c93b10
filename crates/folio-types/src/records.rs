//! Generated output record rows.
//!
//! These mirror the settlement output tables. Amount fields are exact
//! decimals end-to-end; timestamps are Unix epoch seconds.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CommissionType, EditorAdminId, NovelId, PlanId, RecordId, SourceType, UserId};

/// One month-scoped revenue record produced by the proration allocator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReaderSpending {
    pub id: RecordId,
    pub user_id: UserId,
    pub novel_id: NovelId,
    /// Karma paid for a chapter unlock; zero for subscriptions.
    pub karma_amount: i64,
    pub amount_usd: Decimal,
    pub source_type: SourceType,
    /// Id of the originating unlock or subscription row.
    pub source_id: RecordId,
    /// Unix epoch seconds of the economic instant.
    pub spend_time: i64,
    /// `YYYY-MM` batch key.
    pub settlement_month: String,
    /// Service days allocated to this month; zero for chapter unlocks.
    pub days: i64,
    pub settled: bool,
}

/// Cross-month allocation ledger row for one subscription.
///
/// Written alongside each subscription's revenue record; the final overlapped
/// month reads the prior rows back to force exact conservation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubscriptionAllocation {
    pub subscription_id: RecordId,
    pub settlement_month: String,
    pub days: i64,
    pub amount_usd: Decimal,
}

/// One author royalty record, derived 1:1 from a revenue record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthorRoyalty {
    pub id: RecordId,
    pub author_id: UserId,
    pub novel_id: NovelId,
    /// The revenue record this royalty was computed from.
    pub source_spend_id: RecordId,
    pub gross_amount_usd: Decimal,
    pub author_amount_usd: Decimal,
    pub settlement_month: String,
    pub settled: bool,
}

/// One per-level referral commission record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommissionTransaction {
    pub id: RecordId,
    /// The referrer receiving this commission.
    pub user_id: UserId,
    /// Originating consumer (reader track).
    pub source_user_id: Option<UserId>,
    /// Originating author (author track).
    pub source_author_id: Option<UserId>,
    pub novel_id: NovelId,
    pub plan_id: PlanId,
    pub level: u32,
    pub commission_type: CommissionType,
    pub base_amount_usd: Decimal,
    pub commission_amount_usd: Decimal,
    /// Id of the revenue record (reader track) or royalty record (author track).
    pub reference_id: RecordId,
    pub settlement_month: String,
    pub settled: bool,
}

/// Accumulating per-editor, per-novel, per-month income ledger row.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EditorIncome {
    pub editor_admin_id: EditorAdminId,
    pub novel_id: NovelId,
    pub month: String,
    pub gross_book_income_usd: Decimal,
    pub editor_income_usd: Decimal,
}
