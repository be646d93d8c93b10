//! Consumption event queries: chapter unlocks and champion subscriptions.
//!
//! These tables are written by upstream collaborators (unlock flow, payment
//! gateway webhooks); the settlement core only reads them.

use folio_types::{NovelId, RecordId, UserId};
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::{parse_decimal, Result};

/// A karma-paid chapter unlock joined to its novel.
#[derive(Debug)]
pub struct ChapterUnlockRow {
    pub id: RecordId,
    pub user_id: UserId,
    pub novel_id: NovelId,
    pub karma_amount: i64,
    pub unlocked_at: i64,
}

/// A completed subscription payment with its service window.
#[derive(Debug)]
pub struct SubscriptionRow {
    pub id: RecordId,
    pub user_id: UserId,
    pub novel_id: NovelId,
    pub payment_amount: Decimal,
    /// Unix epoch seconds; window is half-open `[service_start, service_end)`.
    pub service_start: i64,
    pub service_end: i64,
    /// Duration the payment gateway claims the payment bought, in days.
    pub nominal_days: i64,
}

/// Insert a chapter unlock event.
pub fn insert_chapter_unlock(
    conn: &Connection,
    id: RecordId,
    user_id: UserId,
    chapter_id: i64,
    karma_amount: i64,
    unlocked_at: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO chapter_unlock (id, user_id, chapter_id, karma_amount, unlocked_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![id, user_id, chapter_id, karma_amount, unlocked_at],
    )?;
    Ok(())
}

/// Insert a subscription payment.
#[allow(clippy::too_many_arguments)]
pub fn insert_subscription(
    conn: &Connection,
    id: RecordId,
    user_id: UserId,
    novel_id: NovelId,
    payment_amount: Decimal,
    service_start: i64,
    service_end: i64,
    nominal_days: i64,
    payment_status: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO champion_subscription
         (id, user_id, novel_id, payment_amount, service_start, service_end, nominal_days, payment_status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            id,
            user_id,
            novel_id,
            payment_amount.to_string(),
            service_start,
            service_end,
            nominal_days,
            payment_status,
        ],
    )?;
    Ok(())
}

/// Karma-paid unlocks inside `[start, end)`, oldest first.
pub fn chapter_unlocks_in(
    conn: &Connection,
    start: i64,
    end: i64,
) -> Result<Vec<ChapterUnlockRow>> {
    let mut stmt = conn.prepare(
        "SELECT cu.id, cu.user_id, c.novel_id, cu.karma_amount, cu.unlocked_at
         FROM chapter_unlock cu
         INNER JOIN chapter c ON cu.chapter_id = c.id
         WHERE cu.unlocked_at >= ?1 AND cu.unlocked_at < ?2 AND cu.karma_amount > 0
         ORDER BY cu.unlocked_at",
    )?;

    let rows = stmt
        .query_map([start, end], |row| {
            Ok(ChapterUnlockRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                novel_id: row.get(2)?,
                karma_amount: row.get(3)?,
                unlocked_at: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Completed subscriptions whose service window overlaps `[start, end)`,
/// ordered by window start.
pub fn subscriptions_overlapping(
    conn: &Connection,
    start: i64,
    end: i64,
) -> Result<Vec<SubscriptionRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, novel_id, payment_amount, service_start, service_end, nominal_days
         FROM champion_subscription
         WHERE payment_status = 'completed' AND service_end > ?1 AND service_start < ?2
         ORDER BY service_start",
    )?;

    let rows = stmt
        .query_map([start, end], |row| {
            Ok((
                row.get::<_, RecordId>(0)?,
                row.get::<_, UserId>(1)?,
                row.get::<_, NovelId>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, i64>(6)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(id, user_id, novel_id, amount, s, e, nominal)| {
            Ok(SubscriptionRow {
                id,
                user_id,
                novel_id,
                payment_amount: parse_decimal("payment_amount", &amount)?,
                service_start: s,
                service_end: e,
                nominal_days: nominal,
            })
        })
        .collect()
}
