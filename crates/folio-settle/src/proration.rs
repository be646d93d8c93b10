//! Proration allocator: consumption events → month-scoped revenue records.
//!
//! Chapter unlocks map 1:1 to revenue records at the karma rate in force at
//! the unlock instant. Subscription payments are prorated across the calendar
//! months their service window overlaps, by whole-day counts over the
//! half-open window `[start, end)` normalized to UTC midnight.
//!
//! ## Conservation
//!
//! Every month except the last takes `payment × overlap_days / total_days`.
//! The last overlapped month instead takes whatever days and money the
//! allocation ledger has not yet handed out, so the per-subscription sums
//! match the service window and payment exactly no matter how earlier
//! divisions rounded.

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use folio_types::records::SubscriptionAllocation;
use folio_types::{default_usd_per_karma, BatchReport, SettlementMonth, SourceType};
use rusqlite::Connection;
use rust_decimal::Decimal;

use folio_db::queries::{events, rates, spending};

use crate::{Result, SettleError};

/// Generate the month's revenue records from chapter unlocks and
/// subscription payments.
///
/// Refused outright when the month already has records; the whole batch runs
/// in one transaction and rolls back on any storage failure.
///
/// # Errors
///
/// - [`SettleError::InvalidMonth`] on a malformed month token
/// - [`SettleError::AlreadyGenerated`] when the month is populated
/// - [`SettleError::Db`] on storage failure (nothing persisted)
pub fn generate_revenue(conn: &mut Connection, month: &str) -> Result<BatchReport> {
    let month = SettlementMonth::parse(month)?;
    let key = month.key();

    if spending::month_populated(conn, &key)? {
        return Err(SettleError::AlreadyGenerated {
            table: "reader_spending",
            month: key,
        });
    }

    let mut report = BatchReport::new(&key);
    let tx = conn.transaction().map_err(folio_db::DbError::Sqlite)?;

    let start = month.start_instant().timestamp();
    let end = month.end_instant().timestamp();

    for unlock in events::chapter_unlocks_in(&tx, start, end)? {
        let rate = match rates::rate_at(&tx, unlock.unlocked_at)? {
            Some(rate) => rate,
            None => {
                report.warn(format!(
                    "no karma rate covers unlock {} at {}, using default",
                    unlock.id, unlock.unlocked_at
                ));
                default_usd_per_karma()
            }
        };
        let amount = Decimal::from(unlock.karma_amount) * rate;
        spending::insert(
            &tx,
            unlock.user_id,
            unlock.novel_id,
            unlock.karma_amount,
            amount,
            SourceType::ChapterUnlock,
            unlock.id,
            unlock.unlocked_at,
            &key,
            0,
        )?;
        report.generated += 1;
    }

    for sub in events::subscriptions_overlapping(&tx, start, end)? {
        if sub.payment_amount <= Decimal::ZERO {
            continue;
        }
        if spending::allocation_exists(&tx, sub.id, &key)? {
            report.skip(format!("subscription {} already allocated for {key}", sub.id));
            continue;
        }

        let (Some(service_start), Some(service_end)) =
            (date_of(sub.service_start), date_of(sub.service_end))
        else {
            report.skip(format!("subscription {} has an unrepresentable window", sub.id));
            continue;
        };

        let total_days = (service_end - service_start).num_days();
        if total_days <= 0 {
            report.skip(format!("subscription {} has an empty service window", sub.id));
            continue;
        }
        if (sub.nominal_days - total_days).abs() >= 1 {
            report.warn(format!(
                "subscription {} claims {} days but its window spans {total_days}",
                sub.id, sub.nominal_days
            ));
        }

        let overlap_start = service_start.max(month.first_day());
        let overlap_end = service_end.min(month.end_day());
        let overlap_days = (overlap_end - overlap_start).num_days();
        if overlap_days <= 0 {
            continue;
        }

        // The last day of service decides the final overlapped month.
        let Some(last_day) = service_end.checked_sub_days(chrono::Days::new(1)) else {
            report.skip(format!("subscription {} has an unrepresentable window", sub.id));
            continue;
        };
        let last_month = SettlementMonth::containing(last_day);
        let (days, amount) = if last_month == month {
            let prior = spending::allocations_for(&tx, sub.id)?;
            final_catchup(sub.payment_amount, total_days, &prior)
        } else {
            (
                overlap_days,
                prorated_amount(sub.payment_amount, overlap_days, total_days),
            )
        };

        let spend_time = midnight_epoch(overlap_start);
        spending::insert(
            &tx,
            sub.user_id,
            sub.novel_id,
            0,
            amount,
            SourceType::Subscription,
            sub.id,
            spend_time,
            &key,
            days,
        )?;
        spending::insert_allocation(
            &tx,
            &SubscriptionAllocation {
                subscription_id: sub.id,
                settlement_month: key.clone(),
                days,
                amount_usd: amount,
            },
        )?;
        report.generated += 1;
    }

    tx.commit().map_err(folio_db::DbError::Sqlite)?;

    tracing::info!(
        month = %key,
        generated = report.generated,
        skipped = report.skipped,
        warnings = report.warnings.len(),
        "revenue generation complete"
    );
    for reason in report.skip_reasons.iter().chain(report.warnings.iter()) {
        tracing::warn!(month = %key, "{reason}");
    }

    Ok(report)
}

/// Delete the month's revenue records and allocation ledger rows.
///
/// # Errors
///
/// - [`SettleError::MonthSettled`] once downstream accounting has settled
///   any row of the month
pub fn delete_revenue(conn: &mut Connection, month: &str) -> Result<u64> {
    let month = SettlementMonth::parse(month)?;
    let key = month.key();

    if spending::settled_count(conn, &key)? > 0 {
        return Err(SettleError::MonthSettled {
            table: "reader_spending",
            month: key,
        });
    }

    let tx = conn.transaction().map_err(folio_db::DbError::Sqlite)?;
    let deleted = spending::delete_month(&tx, &key)?;
    spending::delete_allocations(&tx, &key)?;
    tx.commit().map_err(folio_db::DbError::Sqlite)?;

    tracing::info!(month = %key, deleted, "revenue records deleted");
    Ok(deleted)
}

/// Non-final month share: `payment × overlap_days / total_days`, exact.
pub fn prorated_amount(payment: Decimal, overlap_days: i64, total_days: i64) -> Decimal {
    payment * Decimal::from(overlap_days) / Decimal::from(total_days)
}

/// Final-month catch-up: whatever the ledger has not yet allocated.
pub fn final_catchup(
    payment: Decimal,
    total_days: i64,
    prior: &[SubscriptionAllocation],
) -> (i64, Decimal) {
    let allocated_days: i64 = prior.iter().map(|a| a.days).sum();
    let allocated_amount: Decimal = prior.iter().map(|a| a.amount_usd).sum();
    (total_days - allocated_days, payment - allocated_amount)
}

fn date_of(epoch: i64) -> Option<NaiveDate> {
    chrono::DateTime::from_timestamp(epoch, 0).map(|dt| dt.date_naive())
}

fn midnight_epoch(date: NaiveDate) -> i64 {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)).timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alloc(month: &str, days: i64, amount: &str) -> SubscriptionAllocation {
        SubscriptionAllocation {
            subscription_id: 1,
            settlement_month: month.into(),
            days,
            amount_usd: amount.parse().expect("decimal"),
        }
    }

    #[test]
    fn test_prorated_amount_exact() {
        // 16 of 30 days of $30.00.
        let amount = prorated_amount(Decimal::new(3000, 2), 16, 30);
        assert_eq!(amount, Decimal::new(1600, 2));
    }

    #[test]
    fn test_prorated_amount_keeps_precision() {
        // 10 of 30 days of $10.00 — one third, no float rounding.
        let amount = prorated_amount(Decimal::new(1000, 2), 10, 30);
        let back = amount * Decimal::from(3);
        assert_eq!(back.round_dp(10), Decimal::new(1000, 2).round_dp(10));
    }

    #[test]
    fn test_final_catchup_conserves() {
        let prior = [alloc("2025-10", 16, "16.00")];
        let (days, amount) = final_catchup(Decimal::new(3000, 2), 30, &prior);
        assert_eq!(days, 14);
        assert_eq!(amount.to_string(), "14.00");
    }

    #[test]
    fn test_final_catchup_absorbs_rounding() {
        // Earlier months rounded oddly; the final month must absorb the error.
        let prior = [alloc("2025-09", 10, "3.3333"), alloc("2025-10", 10, "3.3333")];
        let (days, amount) = final_catchup(Decimal::new(1000, 2), 30, &prior);
        assert_eq!(days, 10);
        assert_eq!(amount.to_string(), "3.3334");
    }

    #[test]
    fn test_final_catchup_single_month() {
        let (days, amount) = final_catchup(Decimal::new(3000, 2), 30, &[]);
        assert_eq!(days, 30);
        assert_eq!(amount.to_string(), "30.00");
    }

    #[test]
    fn test_date_normalization_drops_time() {
        // 2025-10-16T08:30:00Z normalizes to the date.
        let date = date_of(1_760_603_400).expect("date");
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 10, 16).expect("ymd"));
        assert_eq!(midnight_epoch(date), 1_760_572_800);
    }
}
