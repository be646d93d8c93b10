//! Editor income distributor: champion income → editor/chief-editor ledger.
//!
//! A novel's monthly champion income is split into two pools sized by the
//! active contracts' share percentages. The chief pool divides across chief
//! contracts by their own shares; the editor pool divides across editors by
//! released word-count attribution. Every computed share is an
//! accumulate-upsert, so distribution is safe to re-invoke per novel.

use folio_types::report::{EditorShare, FailedNovel};
use folio_types::{
    EditorBatchOutcome, EditorDistribution, EditorRole, NovelId, SettlementMonth,
};
use rusqlite::Connection;
use rust_decimal::Decimal;

use folio_db::queries::editor;

use crate::Result;

/// Distribute one novel's champion income for the month.
///
/// Runs in its own transaction. A novel with no champion income returns an
/// empty distribution rather than an error.
///
/// # Errors
///
/// - [`crate::SettleError::InvalidMonth`] on a malformed month token
/// - [`crate::SettleError::Db`] on storage failure (this novel rolled back)
pub fn distribute_editor_income(
    conn: &mut Connection,
    novel_id: NovelId,
    month: &str,
) -> Result<EditorDistribution> {
    let month = SettlementMonth::parse(month)?;
    let key = month.key();

    let tx = conn.transaction().map_err(folio_db::DbError::Sqlite)?;

    let income = editor::champion_income(&tx, novel_id, &key)?.unwrap_or(Decimal::ZERO);
    let mut distribution = EditorDistribution {
        novel_id,
        month: key.clone(),
        champion_income: income,
        chief_pool: Decimal::ZERO,
        editor_pool: Decimal::ZERO,
        shares: Vec::new(),
        warnings: Vec::new(),
    };

    if income <= Decimal::ZERO {
        tx.commit().map_err(folio_db::DbError::Sqlite)?;
        tracing::info!(novel_id, month = %key, "no champion income to distribute");
        return Ok(distribution);
    }

    let contracts = editor::active_contracts(&tx, novel_id)?;
    let chiefs: Vec<_> = contracts
        .iter()
        .filter(|c| c.role == EditorRole::ChiefEditor)
        .collect();
    let chief_percent: Decimal = chiefs.iter().map(|c| c.share_percent).sum();
    let editor_percent: Decimal = contracts
        .iter()
        .filter(|c| c.role == EditorRole::Editor)
        .map(|c| c.share_percent)
        .sum();

    let hundred = Decimal::ONE_HUNDRED;
    distribution.chief_pool = income * chief_percent / hundred;
    distribution.editor_pool = income * editor_percent / hundred;

    // Editor pool: weighted by released word-count attribution.
    if distribution.editor_pool > Decimal::ZERO {
        let word_counts = editor::released_word_counts(&tx, novel_id)?;
        let total_words: i64 = word_counts.iter().map(|(_, words)| words).sum();
        if total_words > 0 {
            for (editor_admin_id, words) in word_counts {
                let amount = proportional_share(
                    distribution.editor_pool,
                    Decimal::from(words),
                    Decimal::from(total_words),
                );
                if amount > Decimal::ZERO {
                    distribution.shares.push(EditorShare {
                        editor_admin_id,
                        amount_usd: amount,
                    });
                }
            }
        } else {
            // Never hand an unattributed pool to an arbitrary editor.
            distribution.warnings.push(format!(
                "novel {novel_id} has editor pool income for {key} but no released word attribution"
            ));
        }
    }

    // Chief pool: weighted by each chief contract's own share.
    if distribution.chief_pool > Decimal::ZERO {
        for chief in &chiefs {
            let amount = proportional_share(
                distribution.chief_pool,
                chief.share_percent,
                chief_percent,
            );
            if amount > Decimal::ZERO {
                distribution.shares.push(EditorShare {
                    editor_admin_id: chief.editor_admin_id,
                    amount_usd: amount,
                });
            }
        }
    }

    for share in &distribution.shares {
        editor::upsert_income(
            &tx,
            share.editor_admin_id,
            novel_id,
            &key,
            income,
            share.amount_usd,
        )?;
    }

    tx.commit().map_err(folio_db::DbError::Sqlite)?;

    tracing::info!(
        novel_id,
        month = %key,
        %income,
        shares = distribution.shares.len(),
        "editor income distributed"
    );
    for warning in &distribution.warnings {
        tracing::warn!(novel_id, month = %key, "{warning}");
    }

    Ok(distribution)
}

/// Distribute several novels, each committing independently.
///
/// A failing novel is collected into the outcome without rolling back novels
/// already distributed.
///
/// # Errors
///
/// - [`crate::SettleError::InvalidMonth`] on a malformed month token,
///   rejected before any novel is processed
pub fn distribute_editor_income_many(
    conn: &mut Connection,
    novel_ids: &[NovelId],
    month: &str,
) -> Result<EditorBatchOutcome> {
    // Validate once so a bad token fails before any work.
    SettlementMonth::parse(month)?;

    let mut outcome = EditorBatchOutcome::default();
    for &novel_id in novel_ids {
        match distribute_editor_income(conn, novel_id, month) {
            Ok(distribution) => outcome.succeeded.push(distribution),
            Err(error) => {
                tracing::warn!(novel_id, %error, "editor distribution failed");
                outcome.failed.push(FailedNovel {
                    novel_id,
                    error: error.to_string(),
                });
            }
        }
    }
    Ok(outcome)
}

/// One participant's exact slice of a pool: `pool × weight / total_weight`.
pub fn proportional_share(pool: Decimal, weight: Decimal, total_weight: Decimal) -> Decimal {
    pool * weight / total_weight
}
