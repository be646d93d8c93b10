//! Commission transaction queries.

use folio_types::{CommissionType, NovelId, PlanId, RecordId, UserId};
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::{parse_decimal, Result};

/// A commission insert, one per walk level that earned a percentage.
#[derive(Debug)]
pub struct NewCommission {
    /// The referrer being credited.
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
    /// Revenue record id (reader track) or royalty record id (author track).
    pub reference_id: RecordId,
}

/// Per-month aggregate returned to operator tooling.
#[derive(Debug, serde::Serialize)]
pub struct CommissionSummary {
    pub total_count: u64,
    pub total_commission_usd: Decimal,
    pub reader_referral_usd: Decimal,
    pub author_referral_usd: Decimal,
}

/// Insert one commission transaction.
pub fn insert(conn: &Connection, tx: &NewCommission, settlement_month: &str) -> Result<RecordId> {
    conn.execute(
        "INSERT INTO commission_transaction
         (user_id, source_user_id, source_author_id, novel_id, plan_id, level,
          commission_type, base_amount_usd, commission_amount_usd, reference_id, settlement_month)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        rusqlite::params![
            tx.user_id,
            tx.source_user_id,
            tx.source_author_id,
            tx.novel_id,
            tx.plan_id,
            tx.level,
            tx.commission_type.as_str(),
            tx.base_amount_usd.to_string(),
            tx.commission_amount_usd.to_string(),
            tx.reference_id,
            settlement_month,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Whether any commission transaction exists for the month.
pub fn month_populated(conn: &Connection, month: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM commission_transaction WHERE settlement_month = ?1",
        [month],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Number of settled rows in the month.
pub fn settled_count(conn: &Connection, month: &str) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM commission_transaction WHERE settlement_month = ?1 AND settled = 1",
        [month],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Mark every commission transaction of the month settled.
pub fn mark_month_settled(conn: &Connection, month: &str) -> Result<u64> {
    let updated = conn.execute(
        "UPDATE commission_transaction SET settled = 1 WHERE settlement_month = ?1",
        [month],
    )?;
    Ok(updated as u64)
}

/// Delete the month's commission transactions.
pub fn delete_month(conn: &Connection, month: &str) -> Result<u64> {
    let deleted = conn.execute(
        "DELETE FROM commission_transaction WHERE settlement_month = ?1",
        [month],
    )?;
    Ok(deleted as u64)
}

/// Commissions credited to one beneficiary in a month, walk order.
pub fn for_beneficiary(
    conn: &Connection,
    user_id: UserId,
    month: &str,
) -> Result<Vec<(u32, Decimal)>> {
    let mut stmt = conn.prepare(
        "SELECT level, commission_amount_usd
         FROM commission_transaction
         WHERE user_id = ?1 AND settlement_month = ?2
         ORDER BY id",
    )?;
    let rows = stmt
        .query_map(rusqlite::params![user_id, month], |row| {
            Ok((row.get::<_, u32>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(level, amount)| Ok((level, parse_decimal("commission_amount_usd", &amount)?)))
        .collect()
}

/// Per-month totals for operator review.
pub fn month_summary(conn: &Connection, month: &str) -> Result<CommissionSummary> {
    let mut stmt = conn.prepare(
        "SELECT commission_type, commission_amount_usd
         FROM commission_transaction WHERE settlement_month = ?1",
    )?;
    let rows = stmt
        .query_map([month], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut summary = CommissionSummary {
        total_count: 0,
        total_commission_usd: Decimal::ZERO,
        reader_referral_usd: Decimal::ZERO,
        author_referral_usd: Decimal::ZERO,
    };
    for (commission_type, amount) in rows {
        let amount = parse_decimal("commission_amount_usd", &amount)?;
        summary.total_count += 1;
        summary.total_commission_usd += amount;
        match CommissionType::from_db(&commission_type) {
            Some(CommissionType::ReaderReferral) => summary.reader_referral_usd += amount,
            Some(CommissionType::AuthorReferral) => summary.author_referral_usd += amount,
            None => {
                return Err(crate::DbError::Malformed(format!(
                    "commission_type: {commission_type:?}"
                )))
            }
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commission(user_id: UserId, level: u32, amount: Decimal) -> NewCommission {
        NewCommission {
            user_id,
            source_user_id: Some(99),
            source_author_id: None,
            novel_id: 1,
            plan_id: 1,
            level,
            commission_type: CommissionType::ReaderReferral,
            base_amount_usd: Decimal::new(1000, 2),
            commission_amount_usd: amount,
            reference_id: 1,
        }
    }

    #[test]
    fn test_insert_and_summary() {
        let conn = crate::open_memory().expect("open");
        insert(&conn, &commission(10, 1, Decimal::new(100, 2)), "2025-10").expect("insert");
        insert(&conn, &commission(20, 2, Decimal::new(50, 2)), "2025-10").expect("insert");

        assert!(month_populated(&conn, "2025-10").expect("q"));
        let summary = month_summary(&conn, "2025-10").expect("summary");
        assert_eq!(summary.total_count, 2);
        assert_eq!(summary.total_commission_usd.to_string(), "1.50");
        assert_eq!(summary.reader_referral_usd.to_string(), "1.50");
        assert_eq!(summary.author_referral_usd.to_string(), "0");
    }

    #[test]
    fn test_for_beneficiary() {
        let conn = crate::open_memory().expect("open");
        insert(&conn, &commission(10, 1, Decimal::new(100, 2)), "2025-10").expect("insert");
        insert(&conn, &commission(10, 2, Decimal::new(50, 2)), "2025-10").expect("insert");
        insert(&conn, &commission(20, 1, Decimal::new(75, 2)), "2025-10").expect("insert");

        let mine = for_beneficiary(&conn, 10, "2025-10").expect("q");
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].0, 1);
        assert_eq!(mine[1].1.to_string(), "0.50");
    }

    #[test]
    fn test_delete_and_settled_guard() {
        let conn = crate::open_memory().expect("open");
        insert(&conn, &commission(10, 1, Decimal::new(100, 2)), "2025-10").expect("insert");

        mark_month_settled(&conn, "2025-10").expect("mark");
        assert_eq!(settled_count(&conn, "2025-10").expect("q"), 1);
        assert_eq!(delete_month(&conn, "2025-10").expect("delete"), 1);
    }
}
