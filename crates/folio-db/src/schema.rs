//! SQL schema definitions.

/// Complete schema for the settlement database, v1.
pub const SCHEMA_V1: &str = r#"
-- ============================================================
-- Catalog
-- ============================================================

CREATE TABLE IF NOT EXISTS novel (
    id INTEGER PRIMARY KEY,
    author_id INTEGER,
    title TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chapter (
    id INTEGER PRIMARY KEY,
    novel_id INTEGER NOT NULL REFERENCES novel(id),
    word_count INTEGER NOT NULL DEFAULT 0,
    is_released INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_chapter_novel ON chapter(novel_id);

-- ============================================================
-- Consumption events (written by upstream collaborators)
-- ============================================================

CREATE TABLE IF NOT EXISTS chapter_unlock (
    id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL,
    chapter_id INTEGER NOT NULL REFERENCES chapter(id),
    karma_amount INTEGER NOT NULL,
    unlocked_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_unlock_time ON chapter_unlock(unlocked_at);

CREATE TABLE IF NOT EXISTS champion_subscription (
    id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL,
    novel_id INTEGER NOT NULL REFERENCES novel(id),
    payment_amount TEXT NOT NULL,
    service_start INTEGER NOT NULL,
    service_end INTEGER NOT NULL,
    nominal_days INTEGER NOT NULL,
    payment_status TEXT NOT NULL DEFAULT 'completed'
);

CREATE INDEX IF NOT EXISTS idx_subscription_window
    ON champion_subscription(service_start, service_end);

-- ============================================================
-- Rates, plans & contracts (time-versioned lookups)
-- ============================================================

CREATE TABLE IF NOT EXISTS karma_rate (
    id INTEGER PRIMARY KEY,
    usd_per_karma TEXT NOT NULL,
    effective_from INTEGER NOT NULL,
    effective_to INTEGER
);

CREATE INDEX IF NOT EXISTS idx_karma_rate_from ON karma_rate(effective_from);

CREATE TABLE IF NOT EXISTS commission_plan (
    id INTEGER PRIMARY KEY,
    plan_type TEXT NOT NULL,
    max_level INTEGER NOT NULL,
    is_custom INTEGER NOT NULL DEFAULT 0,
    owner_user_id INTEGER,
    effective_from INTEGER NOT NULL,
    effective_to INTEGER
);

CREATE INDEX IF NOT EXISTS idx_commission_plan_type ON commission_plan(plan_type, is_custom);

CREATE TABLE IF NOT EXISTS commission_plan_level (
    plan_id INTEGER NOT NULL REFERENCES commission_plan(id),
    level INTEGER NOT NULL,
    percent TEXT NOT NULL,
    PRIMARY KEY (plan_id, level)
);

CREATE TABLE IF NOT EXISTS royalty_plan (
    id INTEGER PRIMARY KEY,
    royalty_percent TEXT NOT NULL,
    is_default INTEGER NOT NULL DEFAULT 0,
    start_date INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS royalty_contract (
    id INTEGER PRIMARY KEY,
    novel_id INTEGER NOT NULL REFERENCES novel(id),
    author_id INTEGER NOT NULL,
    plan_id INTEGER NOT NULL REFERENCES royalty_plan(id),
    effective_from INTEGER NOT NULL,
    effective_to INTEGER
);

CREATE INDEX IF NOT EXISTS idx_royalty_contract ON royalty_contract(novel_id, author_id);

-- ============================================================
-- Referrals
-- ============================================================

CREATE TABLE IF NOT EXISTS referral_edge (
    user_id INTEGER PRIMARY KEY,
    referrer_id INTEGER NOT NULL,
    promoter_plan_id INTEGER,
    author_plan_id INTEGER
);

-- ============================================================
-- Editors
-- ============================================================

CREATE TABLE IF NOT EXISTS novel_editor_contract (
    id INTEGER PRIMARY KEY,
    novel_id INTEGER NOT NULL REFERENCES novel(id),
    editor_admin_id INTEGER NOT NULL,
    role TEXT NOT NULL,
    share_percent TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'active'
);

CREATE INDEX IF NOT EXISTS idx_editor_contract ON novel_editor_contract(novel_id, status);

CREATE TABLE IF NOT EXISTS editor_chapter_share (
    novel_id INTEGER NOT NULL REFERENCES novel(id),
    chapter_id INTEGER NOT NULL REFERENCES chapter(id),
    editor_admin_id INTEGER NOT NULL,
    PRIMARY KEY (chapter_id, editor_admin_id)
);

CREATE INDEX IF NOT EXISTS idx_chapter_share_novel ON editor_chapter_share(novel_id);

CREATE TABLE IF NOT EXISTS novel_income_monthly (
    novel_id INTEGER NOT NULL REFERENCES novel(id),
    month TEXT NOT NULL,
    income_type TEXT NOT NULL,
    income_usd TEXT NOT NULL,
    PRIMARY KEY (novel_id, month, income_type)
);

-- ============================================================
-- Settlement outputs
-- ============================================================

CREATE TABLE IF NOT EXISTS reader_spending (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    novel_id INTEGER NOT NULL,
    karma_amount INTEGER NOT NULL DEFAULT 0,
    amount_usd TEXT NOT NULL,
    source_type TEXT NOT NULL,
    source_id INTEGER NOT NULL,
    spend_time INTEGER NOT NULL,
    settlement_month TEXT NOT NULL,
    days INTEGER NOT NULL DEFAULT 0,
    settled INTEGER NOT NULL DEFAULT 0,
    UNIQUE (source_type, source_id, settlement_month)
);

CREATE INDEX IF NOT EXISTS idx_spending_month ON reader_spending(settlement_month);

CREATE TABLE IF NOT EXISTS subscription_allocation (
    subscription_id INTEGER NOT NULL,
    settlement_month TEXT NOT NULL,
    days INTEGER NOT NULL,
    amount_usd TEXT NOT NULL,
    PRIMARY KEY (subscription_id, settlement_month)
);

CREATE TABLE IF NOT EXISTS author_royalty (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    author_id INTEGER NOT NULL,
    novel_id INTEGER NOT NULL,
    source_spend_id INTEGER NOT NULL REFERENCES reader_spending(id),
    gross_amount_usd TEXT NOT NULL,
    author_amount_usd TEXT NOT NULL,
    settlement_month TEXT NOT NULL,
    settled INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_royalty_month ON author_royalty(settlement_month);

CREATE TABLE IF NOT EXISTS commission_transaction (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    source_user_id INTEGER,
    source_author_id INTEGER,
    novel_id INTEGER NOT NULL,
    plan_id INTEGER NOT NULL,
    level INTEGER NOT NULL,
    commission_type TEXT NOT NULL,
    base_amount_usd TEXT NOT NULL,
    commission_amount_usd TEXT NOT NULL,
    reference_id INTEGER NOT NULL,
    settlement_month TEXT NOT NULL,
    settled INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_commission_month ON commission_transaction(settlement_month);
CREATE INDEX IF NOT EXISTS idx_commission_user ON commission_transaction(user_id, settlement_month);

CREATE TABLE IF NOT EXISTS editor_income_monthly (
    editor_admin_id INTEGER NOT NULL,
    novel_id INTEGER NOT NULL,
    month TEXT NOT NULL,
    gross_book_income_usd TEXT NOT NULL,
    editor_income_usd TEXT NOT NULL,
    PRIMARY KEY (editor_admin_id, novel_id, month)
);
"#;
