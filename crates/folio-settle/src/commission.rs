//! Commission propagator: referral-chain walks over revenue and royalty
//! records.
//!
//! Two independent tracks run per month. The reader track starts at each
//! revenue record's consumer with the gross amount as base; the author track
//! starts at each royalty record's author with the author amount as base.
//! Each walk climbs the referral graph one edge per level, resolving the
//! track's plan per level with time-versioned fallback to the default plan,
//! and stops at the resolved plan's max level or the hard depth ceiling.

use folio_types::plans::{CommissionPlan, PlanRef, PlanType};
use folio_types::{
    BatchReport, CommissionType, NovelId, PlanId, RecordId, SettlementMonth, UserId,
    MAX_WALK_DEPTH,
};
use rusqlite::Connection;
use rust_decimal::Decimal;

use folio_db::queries::{commission, plans, royalty, spending};

use crate::{Result, SettleError};

/// One walk's starting point and billing context.
struct WalkOrigin {
    /// User the walk climbs from (consumer or author).
    origin: UserId,
    base_amount: Decimal,
    /// Economic instant used for plan validity.
    instant: i64,
    novel_id: NovelId,
    /// Revenue record id (reader track) or royalty record id (author track).
    reference_id: RecordId,
    track: CommissionType,
}

/// Generate the month's commission transactions for both tracks.
///
/// # Errors
///
/// - [`SettleError::InvalidMonth`] on a malformed month token
/// - [`SettleError::AlreadyGenerated`] when the month is populated
/// - [`SettleError::Db`] on storage failure (nothing persisted)
pub fn generate_commissions(conn: &mut Connection, month: &str) -> Result<BatchReport> {
    let month = SettlementMonth::parse(month)?;
    let key = month.key();

    if commission::month_populated(conn, &key)? {
        return Err(SettleError::AlreadyGenerated {
            table: "commission_transaction",
            month: key,
        });
    }

    let mut report = BatchReport::new(&key);
    let tx = conn.transaction().map_err(folio_db::DbError::Sqlite)?;

    for row in spending::month_rows(&tx, &key)? {
        walk(
            &tx,
            &key,
            &WalkOrigin {
                origin: row.user_id,
                base_amount: row.amount_usd,
                instant: row.spend_time,
                novel_id: row.novel_id,
                reference_id: row.id,
                track: CommissionType::ReaderReferral,
            },
            &mut report,
        )?;
    }

    for row in royalty::month_rows(&tx, &key)? {
        walk(
            &tx,
            &key,
            &WalkOrigin {
                origin: row.author_id,
                base_amount: row.author_amount_usd,
                instant: row.spend_time,
                novel_id: row.novel_id,
                reference_id: row.id,
                track: CommissionType::AuthorReferral,
            },
            &mut report,
        )?;
    }

    tx.commit().map_err(folio_db::DbError::Sqlite)?;

    tracing::info!(
        month = %key,
        generated = report.generated,
        "commission generation complete"
    );

    Ok(report)
}

/// Delete the month's commission transactions.
///
/// # Errors
///
/// - [`SettleError::MonthSettled`] once any row of the month is settled
pub fn delete_commissions(conn: &mut Connection, month: &str) -> Result<u64> {
    let month = SettlementMonth::parse(month)?;
    let key = month.key();

    if commission::settled_count(conn, &key)? > 0 {
        return Err(SettleError::MonthSettled {
            table: "commission_transaction",
            month: key,
        });
    }

    let deleted = commission::delete_month(conn, &key)?;
    tracing::info!(month = %key, deleted, "commission transactions deleted");
    Ok(deleted)
}

/// Climb the referral graph from one origin, emitting a commission per level
/// that resolves a plan with a positive percentage.
fn walk(
    conn: &Connection,
    month_key: &str,
    origin: &WalkOrigin,
    report: &mut BatchReport,
) -> Result<()> {
    let plan_type = match origin.track {
        CommissionType::ReaderReferral => PlanType::Promoter,
        CommissionType::AuthorReferral => PlanType::Author,
    };

    let mut current = origin.origin;
    let mut level: u32 = 1;

    // The ceiling bounds malformed or cyclic referral graphs.
    while level <= MAX_WALK_DEPTH {
        let Some(edge) = plans::referral_edge(conn, current)? else {
            break;
        };
        let assigned = match origin.track {
            CommissionType::ReaderReferral => edge.promoter_plan_id,
            CommissionType::AuthorReferral => edge.author_plan_id,
        };

        match resolve_plan(conn, plan_type, assigned, origin.instant)? {
            Some((plan_ref, plan)) => {
                if level > plan.max_level {
                    break;
                }
                if let Some(percent) = plans::level_percent(conn, plan.id, level)? {
                    if percent > Decimal::ZERO {
                        let amount = origin.base_amount * percent;
                        commission::insert(
                            conn,
                            &commission::NewCommission {
                                user_id: edge.referrer_id,
                                source_user_id: (origin.track
                                    == CommissionType::ReaderReferral)
                                    .then_some(origin.origin),
                                source_author_id: (origin.track
                                    == CommissionType::AuthorReferral)
                                    .then_some(origin.origin),
                                novel_id: origin.novel_id,
                                plan_id: plan.id,
                                level,
                                commission_type: origin.track,
                                base_amount_usd: origin.base_amount,
                                commission_amount_usd: amount,
                                reference_id: origin.reference_id,
                            },
                            month_key,
                        )?;
                        report.generated += 1;

                        tracing::debug!(
                            beneficiary = edge.referrer_id,
                            level,
                            plan = ?plan_ref,
                            %amount,
                            "commission emitted"
                        );
                    }
                }
            }
            // No plan valid at the event instant: this level earns nothing,
            // but uplines may still have valid assignments.
            None => {}
        }

        current = edge.referrer_id;
        level += 1;
    }

    Ok(())
}

/// Resolve the plan governing one walk level at one instant.
///
/// The edge's assigned plan wins while its effective window covers the
/// instant; otherwise the track's default plan in force at that instant;
/// otherwise none.
pub fn resolve_plan(
    conn: &Connection,
    plan_type: PlanType,
    assigned: Option<PlanId>,
    instant: i64,
) -> Result<Option<(PlanRef, CommissionPlan)>> {
    if let Some(plan_id) = assigned {
        if let Some(plan) = plans::commission_plan(conn, plan_id)? {
            if plan.valid_at(instant) {
                return Ok(Some((PlanRef::Assigned(plan_id), plan)));
            }
        }
    }
    if let Some(plan) = plans::default_commission_plan_at(conn, plan_type, instant)? {
        return Ok(Some((PlanRef::Default(plan.id), plan)));
    }
    Ok(None)
}
