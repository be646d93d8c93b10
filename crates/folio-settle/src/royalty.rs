//! Author royalty calculator: revenue records → per-record author royalties.
//!
//! The royalty fraction resolves through a three-step chain: the author-novel
//! contract active at the spend instant, else the newest default royalty
//! plan, else a hard-coded 50% fallback.

use folio_types::{fallback_royalty_percent, BatchReport, NovelId, SettlementMonth, UserId};
use rusqlite::Connection;
use rust_decimal::Decimal;

use folio_db::queries::{catalog, plans, royalty, spending};

use crate::{Result, SettleError};

/// Generate the month's author royalty records, one per revenue record.
///
/// Records with a missing novel or an authorless novel are skipped with a
/// recorded reason; the batch continues.
///
/// # Errors
///
/// - [`SettleError::InvalidMonth`] on a malformed month token
/// - [`SettleError::AlreadyGenerated`] when the month is populated
/// - [`SettleError::Db`] on storage failure (nothing persisted)
pub fn generate_royalties(conn: &mut Connection, month: &str) -> Result<BatchReport> {
    let month = SettlementMonth::parse(month)?;
    let key = month.key();

    if royalty::month_populated(conn, &key)? {
        return Err(SettleError::AlreadyGenerated {
            table: "author_royalty",
            month: key,
        });
    }

    let mut report = BatchReport::new(&key);
    let tx = conn.transaction().map_err(folio_db::DbError::Sqlite)?;

    let rows = spending::month_rows(&tx, &key)?;
    if rows.is_empty() {
        report.warn(format!("no revenue records for {key}, nothing to compute"));
    }

    for row in rows {
        let Some(novel) = catalog::novel(&tx, row.novel_id)? else {
            report.skip(format!("revenue record {} references missing novel {}", row.id, row.novel_id));
            continue;
        };
        let Some(author_id) = novel.author_id else {
            report.skip(format!("novel {} has no author", novel.id));
            continue;
        };

        let percent = resolve_royalty_percent(&tx, row.novel_id, author_id, row.spend_time)?;
        let author_amount = row.amount_usd * percent;

        royalty::insert(
            &tx,
            author_id,
            row.novel_id,
            row.id,
            row.amount_usd,
            author_amount,
            &key,
        )?;
        report.generated += 1;
    }

    tx.commit().map_err(folio_db::DbError::Sqlite)?;

    tracing::info!(
        month = %key,
        generated = report.generated,
        skipped = report.skipped,
        "royalty generation complete"
    );
    for reason in &report.skip_reasons {
        tracing::warn!(month = %key, "{reason}");
    }

    Ok(report)
}

/// Delete the month's royalty records.
///
/// # Errors
///
/// - [`SettleError::MonthSettled`] once any row of the month is settled
pub fn delete_royalties(conn: &mut Connection, month: &str) -> Result<u64> {
    let month = SettlementMonth::parse(month)?;
    let key = month.key();

    if royalty::settled_count(conn, &key)? > 0 {
        return Err(SettleError::MonthSettled {
            table: "author_royalty",
            month: key,
        });
    }

    let deleted = royalty::delete_month(conn, &key)?;
    tracing::info!(month = %key, deleted, "royalty records deleted");
    Ok(deleted)
}

/// Royalty fraction in force for an author-novel pair at an instant:
/// active contract's plan, else newest default plan, else 50%.
pub fn resolve_royalty_percent(
    conn: &Connection,
    novel_id: NovelId,
    author_id: UserId,
    instant: i64,
) -> Result<Decimal> {
    if let Some(plan_id) = plans::contract_plan_at(conn, novel_id, author_id, instant)? {
        if let Some(plan) = plans::royalty_plan(conn, plan_id)? {
            return Ok(plan.royalty_percent);
        }
    }
    if let Some(plan) = plans::default_royalty_plan(conn)? {
        return Ok(plan.royalty_percent);
    }
    Ok(fallback_royalty_percent())
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_types::plans::RoyaltyPlan;

    #[test]
    fn test_resolution_falls_back_to_half() {
        let conn = folio_db::open_memory().expect("open");
        let percent = resolve_royalty_percent(&conn, 1, 9, 1_000).expect("resolve");
        assert_eq!(percent.to_string(), "0.5");
    }

    #[test]
    fn test_resolution_prefers_contract() {
        let conn = folio_db::open_memory().expect("open");
        catalog::insert_novel(&conn, 1, Some(9), "N").expect("novel");
        plans::insert_royalty_plan(
            &conn,
            &RoyaltyPlan {
                id: 1,
                royalty_percent: Decimal::new(7, 1),
                is_default: false,
                start_date: 0,
            },
        )
        .expect("plan");
        plans::insert_royalty_plan(
            &conn,
            &RoyaltyPlan {
                id: 2,
                royalty_percent: Decimal::new(4, 1),
                is_default: true,
                start_date: 0,
            },
        )
        .expect("plan");
        plans::insert_royalty_contract(&conn, 1, 1, 9, 1, 0, Some(2_000)).expect("contract");

        // Contract active at 1000.
        let active = resolve_royalty_percent(&conn, 1, 9, 1_000).expect("resolve");
        assert_eq!(active.to_string(), "0.7");

        // Contract expired at 2000: default plan takes over.
        let expired = resolve_royalty_percent(&conn, 1, 9, 2_000).expect("resolve");
        assert_eq!(expired.to_string(), "0.4");
    }
}
