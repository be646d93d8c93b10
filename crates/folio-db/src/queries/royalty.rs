//! Author royalty record queries.

use folio_types::{NovelId, RecordId, UserId};
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::{parse_decimal, Result};

/// The fields the commission propagator needs from a royalty record,
/// joined back to the source spending for its economic instant.
#[derive(Debug)]
pub struct RoyaltyWalkRow {
    pub id: RecordId,
    pub author_id: UserId,
    pub novel_id: NovelId,
    pub author_amount_usd: Decimal,
    pub spend_time: i64,
}

/// Per-month aggregate returned to operator tooling.
#[derive(Debug, serde::Serialize)]
pub struct RoyaltySummary {
    pub total_count: u64,
    pub total_gross_usd: Decimal,
    pub total_author_usd: Decimal,
    pub author_count: u64,
    pub novel_count: u64,
}

/// Insert one author royalty record.
pub fn insert(
    conn: &Connection,
    author_id: UserId,
    novel_id: NovelId,
    source_spend_id: RecordId,
    gross_amount_usd: Decimal,
    author_amount_usd: Decimal,
    settlement_month: &str,
) -> Result<RecordId> {
    conn.execute(
        "INSERT INTO author_royalty
         (author_id, novel_id, source_spend_id, gross_amount_usd, author_amount_usd, settlement_month)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            author_id,
            novel_id,
            source_spend_id,
            gross_amount_usd.to_string(),
            author_amount_usd.to_string(),
            settlement_month,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Whether any royalty record exists for the month.
pub fn month_populated(conn: &Connection, month: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM author_royalty WHERE settlement_month = ?1",
        [month],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Number of settled rows in the month.
pub fn settled_count(conn: &Connection, month: &str) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM author_royalty WHERE settlement_month = ?1 AND settled = 1",
        [month],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Mark every royalty record of the month settled.
pub fn mark_month_settled(conn: &Connection, month: &str) -> Result<u64> {
    let updated = conn.execute(
        "UPDATE author_royalty SET settled = 1 WHERE settlement_month = ?1",
        [month],
    )?;
    Ok(updated as u64)
}

/// Delete the month's royalty records.
pub fn delete_month(conn: &Connection, month: &str) -> Result<u64> {
    let deleted = conn.execute(
        "DELETE FROM author_royalty WHERE settlement_month = ?1",
        [month],
    )?;
    Ok(deleted as u64)
}

/// All royalty records of the month with their source spend times,
/// in source spend order.
pub fn month_rows(conn: &Connection, month: &str) -> Result<Vec<RoyaltyWalkRow>> {
    let mut stmt = conn.prepare(
        "SELECT ar.id, ar.author_id, ar.novel_id, ar.author_amount_usd, rs.spend_time
         FROM author_royalty ar
         INNER JOIN reader_spending rs ON ar.source_spend_id = rs.id
         WHERE ar.settlement_month = ?1
         ORDER BY rs.spend_time, ar.id",
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
        .map(|(id, author_id, novel_id, amount, spend_time)| {
            Ok(RoyaltyWalkRow {
                id,
                author_id,
                novel_id,
                author_amount_usd: parse_decimal("author_amount_usd", &amount)?,
                spend_time,
            })
        })
        .collect()
}

/// Per-month totals for operator review.
pub fn month_summary(conn: &Connection, month: &str) -> Result<RoyaltySummary> {
    let (total_count, author_count, novel_count): (u64, u64, u64) = conn.query_row(
        "SELECT COUNT(*), COUNT(DISTINCT author_id), COUNT(DISTINCT novel_id)
         FROM author_royalty WHERE settlement_month = ?1",
        [month],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;

    let mut stmt = conn.prepare(
        "SELECT gross_amount_usd, author_amount_usd
         FROM author_royalty WHERE settlement_month = ?1",
    )?;
    let amounts = stmt
        .query_map([month], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut total_gross_usd = Decimal::ZERO;
    let mut total_author_usd = Decimal::ZERO;
    for (gross, author) in amounts {
        total_gross_usd += parse_decimal("gross_amount_usd", &gross)?;
        total_author_usd += parse_decimal("author_amount_usd", &author)?;
    }

    Ok(RoyaltySummary {
        total_count,
        total_gross_usd,
        total_author_usd,
        author_count,
        novel_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_types::SourceType;

    fn seed_spending(conn: &Connection) -> RecordId {
        crate::queries::spending::insert(
            conn,
            7,
            1,
            0,
            Decimal::new(1000, 2),
            SourceType::Subscription,
            1,
            1_000,
            "2025-10",
            30,
        )
        .expect("spending")
    }

    #[test]
    fn test_insert_and_walk_rows() {
        let conn = crate::open_memory().expect("open");
        let spend_id = seed_spending(&conn);
        insert(
            &conn,
            9,
            1,
            spend_id,
            Decimal::new(1000, 2),
            Decimal::new(500, 2),
            "2025-10",
        )
        .expect("insert");

        let rows = month_rows(&conn, "2025-10").expect("rows");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].author_id, 9);
        assert_eq!(rows[0].author_amount_usd.to_string(), "5.00");
        assert_eq!(rows[0].spend_time, 1_000);
    }

    #[test]
    fn test_month_summary() {
        let conn = crate::open_memory().expect("open");
        let spend_id = seed_spending(&conn);
        insert(
            &conn,
            9,
            1,
            spend_id,
            Decimal::new(1000, 2),
            Decimal::new(500, 2),
            "2025-10",
        )
        .expect("insert");

        let summary = month_summary(&conn, "2025-10").expect("summary");
        assert_eq!(summary.total_count, 1);
        assert_eq!(summary.author_count, 1);
        assert_eq!(summary.novel_count, 1);
        assert_eq!(summary.total_gross_usd.to_string(), "10.00");
        assert_eq!(summary.total_author_usd.to_string(), "5.00");
    }

    #[test]
    fn test_settled_guard() {
        let conn = crate::open_memory().expect("open");
        let spend_id = seed_spending(&conn);
        insert(
            &conn,
            9,
            1,
            spend_id,
            Decimal::new(1000, 2),
            Decimal::new(500, 2),
            "2025-10",
        )
        .expect("insert");

        assert_eq!(settled_count(&conn, "2025-10").expect("q"), 0);
        mark_month_settled(&conn, "2025-10").expect("mark");
        assert_eq!(settled_count(&conn, "2025-10").expect("q"), 1);
    }
}
