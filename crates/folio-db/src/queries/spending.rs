//! Revenue record (`reader_spending`) and subscription allocation ledger queries.

use folio_types::records::SubscriptionAllocation;
use folio_types::{NovelId, RecordId, SourceType, UserId};
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::{parse_decimal, Result};

/// The fields the downstream calculators need from a revenue record.
#[derive(Debug)]
pub struct SpendingRow {
    pub id: RecordId,
    pub user_id: UserId,
    pub novel_id: NovelId,
    pub amount_usd: Decimal,
    pub spend_time: i64,
}

/// Per-month aggregate returned to operator tooling.
#[derive(Debug, serde::Serialize)]
pub struct SpendingSummary {
    pub total_count: u64,
    pub total_amount_usd: Decimal,
    pub chapter_unlock_count: u64,
    pub subscription_count: u64,
}

/// Insert one revenue record.
#[allow(clippy::too_many_arguments)]
pub fn insert(
    conn: &Connection,
    user_id: UserId,
    novel_id: NovelId,
    karma_amount: i64,
    amount_usd: Decimal,
    source_type: SourceType,
    source_id: RecordId,
    spend_time: i64,
    settlement_month: &str,
    days: i64,
) -> Result<RecordId> {
    conn.execute(
        "INSERT INTO reader_spending
         (user_id, novel_id, karma_amount, amount_usd, source_type, source_id,
          spend_time, settlement_month, days)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            user_id,
            novel_id,
            karma_amount,
            amount_usd.to_string(),
            source_type.as_str(),
            source_id,
            spend_time,
            settlement_month,
            days,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Whether any revenue record exists for the month.
pub fn month_populated(conn: &Connection, month: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM reader_spending WHERE settlement_month = ?1",
        [month],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Number of settled rows in the month. Non-zero blocks deletion.
pub fn settled_count(conn: &Connection, month: &str) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM reader_spending WHERE settlement_month = ?1 AND settled = 1",
        [month],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Mark every revenue record of the month settled. Done by downstream
/// accounting once the month is closed.
pub fn mark_month_settled(conn: &Connection, month: &str) -> Result<u64> {
    let updated = conn.execute(
        "UPDATE reader_spending SET settled = 1 WHERE settlement_month = ?1",
        [month],
    )?;
    Ok(updated as u64)
}

/// Delete the month's revenue records, returning the row count.
pub fn delete_month(conn: &Connection, month: &str) -> Result<u64> {
    let deleted = conn.execute(
        "DELETE FROM reader_spending WHERE settlement_month = ?1",
        [month],
    )?;
    Ok(deleted as u64)
}

/// All revenue records of the month, oldest spend first.
pub fn month_rows(conn: &Connection, month: &str) -> Result<Vec<SpendingRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, novel_id, amount_usd, spend_time
         FROM reader_spending
         WHERE settlement_month = ?1
         ORDER BY spend_time, id",
    )?;

    let rows = stmt
        .query_map([month], |row| {
            Ok((
                row.get::<_, RecordId>(0)?,
                row.get::<_, UserId>(1)?,
                row.get::<_, NovelId>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(id, user_id, novel_id, amount, spend_time)| {
            Ok(SpendingRow {
                id,
                user_id,
                novel_id,
                amount_usd: parse_decimal("amount_usd", &amount)?,
                spend_time,
            })
        })
        .collect()
}

/// Per-month totals for operator review.
pub fn month_summary(conn: &Connection, month: &str) -> Result<SpendingSummary> {
    let mut stmt = conn.prepare(
        "SELECT amount_usd, source_type FROM reader_spending WHERE settlement_month = ?1",
    )?;
    let rows = stmt
        .query_map([month], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut summary = SpendingSummary {
        total_count: 0,
        total_amount_usd: Decimal::ZERO,
        chapter_unlock_count: 0,
        subscription_count: 0,
    };
    for (amount, source_type) in rows {
        summary.total_count += 1;
        summary.total_amount_usd += parse_decimal("amount_usd", &amount)?;
        match SourceType::from_db(&source_type) {
            Some(SourceType::ChapterUnlock) => summary.chapter_unlock_count += 1,
            Some(SourceType::Subscription) => summary.subscription_count += 1,
            None => {
                return Err(crate::DbError::Malformed(format!(
                    "source_type: {source_type:?}"
                )))
            }
        }
    }
    Ok(summary)
}

/// Record one month's slice of a subscription in the allocation ledger.
pub fn insert_allocation(conn: &Connection, allocation: &SubscriptionAllocation) -> Result<()> {
    conn.execute(
        "INSERT INTO subscription_allocation (subscription_id, settlement_month, days, amount_usd)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            allocation.subscription_id,
            allocation.settlement_month,
            allocation.days,
            allocation.amount_usd.to_string(),
        ],
    )?;
    Ok(())
}

/// Whether a subscription already has an allocation for the month.
pub fn allocation_exists(conn: &Connection, subscription_id: RecordId, month: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM subscription_allocation
         WHERE subscription_id = ?1 AND settlement_month = ?2",
        rusqlite::params![subscription_id, month],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// All prior allocations of a subscription, oldest month first.
pub fn allocations_for(
    conn: &Connection,
    subscription_id: RecordId,
) -> Result<Vec<SubscriptionAllocation>> {
    let mut stmt = conn.prepare(
        "SELECT subscription_id, settlement_month, days, amount_usd
         FROM subscription_allocation
         WHERE subscription_id = ?1
         ORDER BY settlement_month",
    )?;

    let rows = stmt
        .query_map([subscription_id], |row| {
            Ok((
                row.get::<_, RecordId>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(subscription_id, settlement_month, days, amount)| {
            Ok(SubscriptionAllocation {
                subscription_id,
                settlement_month,
                days,
                amount_usd: parse_decimal("amount_usd", &amount)?,
            })
        })
        .collect()
}

/// Delete the month's allocation ledger rows.
pub fn delete_allocations(conn: &Connection, month: &str) -> Result<u64> {
    let deleted = conn.execute(
        "DELETE FROM subscription_allocation WHERE settlement_month = ?1",
        [month],
    )?;
    Ok(deleted as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spend(conn: &Connection, source_id: RecordId, amount: &str, source: SourceType) {
        insert(
            conn,
            7,
            1,
            0,
            amount.parse().expect("decimal"),
            source,
            source_id,
            1_000,
            "2025-10",
            0,
        )
        .expect("insert");
    }

    #[test]
    fn test_month_populated_and_delete() {
        let conn = crate::open_memory().expect("open");
        assert!(!month_populated(&conn, "2025-10").expect("q"));

        spend(&conn, 1, "1.20", SourceType::ChapterUnlock);
        assert!(month_populated(&conn, "2025-10").expect("q"));
        assert!(!month_populated(&conn, "2025-11").expect("q"));

        assert_eq!(delete_month(&conn, "2025-10").expect("delete"), 1);
        assert!(!month_populated(&conn, "2025-10").expect("q"));
    }

    #[test]
    fn test_duplicate_source_rejected() {
        let conn = crate::open_memory().expect("open");
        spend(&conn, 1, "1.20", SourceType::ChapterUnlock);
        let dup = insert(
            &conn,
            7,
            1,
            0,
            Decimal::new(120, 2),
            SourceType::ChapterUnlock,
            1,
            1_000,
            "2025-10",
            0,
        );
        assert!(dup.is_err(), "unique (source, month) must hold");
    }

    #[test]
    fn test_settled_guard_counts() {
        let conn = crate::open_memory().expect("open");
        spend(&conn, 1, "1.20", SourceType::ChapterUnlock);
        assert_eq!(settled_count(&conn, "2025-10").expect("q"), 0);

        assert_eq!(mark_month_settled(&conn, "2025-10").expect("mark"), 1);
        assert_eq!(settled_count(&conn, "2025-10").expect("q"), 1);
    }

    #[test]
    fn test_month_summary() {
        let conn = crate::open_memory().expect("open");
        spend(&conn, 1, "1.20", SourceType::ChapterUnlock);
        spend(&conn, 2, "16.00", SourceType::Subscription);

        let summary = month_summary(&conn, "2025-10").expect("summary");
        assert_eq!(summary.total_count, 2);
        assert_eq!(summary.chapter_unlock_count, 1);
        assert_eq!(summary.subscription_count, 1);
        assert_eq!(summary.total_amount_usd.to_string(), "17.20");
    }

    #[test]
    fn test_allocation_ledger_round_trip() {
        let conn = crate::open_memory().expect("open");
        let first = SubscriptionAllocation {
            subscription_id: 9,
            settlement_month: "2025-10".into(),
            days: 16,
            amount_usd: Decimal::new(1600, 2),
        };
        insert_allocation(&conn, &first).expect("insert");

        assert!(allocation_exists(&conn, 9, "2025-10").expect("q"));
        assert!(!allocation_exists(&conn, 9, "2025-11").expect("q"));

        let rows = allocations_for(&conn, 9).expect("q");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].days, 16);
        assert_eq!(rows[0].amount_usd.to_string(), "16.00");
    }
}
