//! Integration test: editor income distribution.
//!
//! Exercises the champion-income pool split:
//! 1. Chief pool sized and divided by contract shares
//! 2. Editor pool divided by released word-count attribution
//! 3. Accumulate-upsert semantics across repeated runs
//! 4. The unattributed-pool warning path

use folio_db::queries::{catalog, editor};
use folio_types::EditorRole;
use rusqlite::Connection;
use rust_decimal::Decimal;

fn dec(s: &str) -> Decimal {
    s.parse().expect("decimal literal")
}

/// Helper: one novel with $100.00 champion income for 2025-10, a 10% chief
/// and two editors at 5% each.
fn seed_novel(conn: &Connection) {
    catalog::insert_novel(conn, 1, Some(9), "Sword of Dawn").expect("novel");
    editor::insert_novel_income(conn, 1, "2025-10", "champion", dec("100.00")).expect("income");

    editor::insert_contract(conn, 1, 1, 100, EditorRole::ChiefEditor, dec("10"), "active")
        .expect("chief");
    editor::insert_contract(conn, 2, 1, 200, EditorRole::Editor, dec("5"), "active")
        .expect("editor");
    editor::insert_contract(conn, 3, 1, 300, EditorRole::Editor, dec("5"), "active")
        .expect("editor");
}

/// Helper: released chapters attributing 60% / 40% of words to the editors.
fn seed_attribution(conn: &Connection) {
    catalog::insert_chapter(conn, 10, 1, 6000, true).expect("chapter");
    catalog::insert_chapter(conn, 11, 1, 4000, true).expect("chapter");
    editor::insert_chapter_attribution(conn, 1, 10, 200).expect("attr");
    editor::insert_chapter_attribution(conn, 1, 11, 300).expect("attr");
}

#[test]
fn pools_split_by_share_and_word_count() {
    let mut conn = folio_db::open_memory().expect("open");
    seed_novel(&conn);
    seed_attribution(&conn);

    let distribution =
        folio_settle::editor::distribute_editor_income(&mut conn, 1, "2025-10").expect("distribute");

    assert_eq!(distribution.champion_income, dec("100.00"));
    assert_eq!(distribution.chief_pool, dec("10.00"));
    assert_eq!(distribution.editor_pool, dec("10.00"));
    assert!(distribution.distributed());
    assert!(distribution.warnings.is_empty());

    // Chief takes the whole chief pool; editors split 60/40 by words.
    let chief = editor::income_row(&conn, 100, 1, "2025-10").expect("q").expect("row");
    assert_eq!(chief.editor_income_usd, dec("10.00"));
    let editor_a = editor::income_row(&conn, 200, 1, "2025-10").expect("q").expect("row");
    assert_eq!(editor_a.editor_income_usd, dec("6.00"));
    let editor_b = editor::income_row(&conn, 300, 1, "2025-10").expect("q").expect("row");
    assert_eq!(editor_b.editor_income_usd, dec("4.00"));

    // Gross book income recorded alongside every share.
    assert_eq!(chief.gross_book_income_usd, dec("100.00"));
}

#[test]
fn rerun_accumulates_without_drift() {
    let mut conn = folio_db::open_memory().expect("open");
    seed_novel(&conn);
    seed_attribution(&conn);

    folio_settle::editor::distribute_editor_income(&mut conn, 1, "2025-10").expect("first");
    folio_settle::editor::distribute_editor_income(&mut conn, 1, "2025-10").expect("second");

    // Exactly double, no cumulative rounding drift.
    let editor_a = editor::income_row(&conn, 200, 1, "2025-10").expect("q").expect("row");
    assert_eq!(editor_a.editor_income_usd, dec("12.00"));
    let editor_b = editor::income_row(&conn, 300, 1, "2025-10").expect("q").expect("row");
    assert_eq!(editor_b.editor_income_usd, dec("8.00"));
}

#[test]
fn unattributed_editor_pool_warns_and_stays_unassigned() {
    let mut conn = folio_db::open_memory().expect("open");
    seed_novel(&conn);
    // No released chapter attribution at all.

    let distribution =
        folio_settle::editor::distribute_editor_income(&mut conn, 1, "2025-10").expect("distribute");

    assert_eq!(distribution.editor_pool, dec("10.00"));
    assert_eq!(distribution.warnings.len(), 1);

    // The chief was still paid; neither editor was.
    assert!(editor::income_row(&conn, 100, 1, "2025-10").expect("q").is_some());
    assert!(editor::income_row(&conn, 200, 1, "2025-10").expect("q").is_none());
    assert!(editor::income_row(&conn, 300, 1, "2025-10").expect("q").is_none());
}

#[test]
fn novel_without_income_distributes_nothing() {
    let mut conn = folio_db::open_memory().expect("open");
    catalog::insert_novel(&conn, 1, Some(9), "Quiet Book").expect("novel");

    let distribution =
        folio_settle::editor::distribute_editor_income(&mut conn, 1, "2025-10").expect("distribute");
    assert!(!distribution.distributed());
    assert_eq!(distribution.champion_income, Decimal::ZERO);
}

#[test]
fn multi_novel_run_collects_outcomes_independently() {
    let mut conn = folio_db::open_memory().expect("open");
    seed_novel(&conn);
    seed_attribution(&conn);
    catalog::insert_novel(&conn, 2, Some(9), "Second Book").expect("novel");
    editor::insert_novel_income(&conn, 2, "2025-10", "champion", dec("50.00")).expect("income");
    editor::insert_contract(&conn, 4, 2, 100, EditorRole::ChiefEditor, dec("20"), "active")
        .expect("chief");

    let outcome =
        folio_settle::editor::distribute_editor_income_many(&mut conn, &[1, 2], "2025-10")
            .expect("batch");
    assert_eq!(outcome.succeeded.len(), 2);
    assert!(outcome.failed.is_empty());

    // Chief 100 accumulated shares from both novels in separate ledger rows.
    let from_first = editor::income_row(&conn, 100, 1, "2025-10").expect("q").expect("row");
    assert_eq!(from_first.editor_income_usd, dec("10.00"));
    let from_second = editor::income_row(&conn, 100, 2, "2025-10").expect("q").expect("row");
    assert_eq!(from_second.editor_income_usd, dec("10.00"));

    // The outcome serializes for the operator response.
    let json = serde_json::to_value(&outcome).expect("serialize");
    assert_eq!(json["succeeded"].as_array().map(Vec::len), Some(2));
}

#[test]
fn malformed_month_rejected_before_any_novel() {
    let mut conn = folio_db::open_memory().expect("open");
    let result = folio_settle::editor::distribute_editor_income_many(&mut conn, &[1], "last month");
    assert!(matches!(
        result,
        Err(folio_settle::SettleError::InvalidMonth(_))
    ));
}
