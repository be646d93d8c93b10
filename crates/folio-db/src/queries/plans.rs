//! Commission plan, royalty plan and referral edge queries.

use folio_types::plans::{CommissionPlan, PlanType, RoyaltyPlan};
use folio_types::{NovelId, PlanId, UserId};
use rusqlite::{Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::{parse_decimal, Result};

/// A user's referral edge with its per-track plan assignments.
#[derive(Debug)]
pub struct ReferralEdgeRow {
    pub user_id: UserId,
    pub referrer_id: UserId,
    pub promoter_plan_id: Option<PlanId>,
    pub author_plan_id: Option<PlanId>,
}

/// Insert a commission plan header.
pub fn insert_commission_plan(conn: &Connection, plan: &CommissionPlan) -> Result<()> {
    conn.execute(
        "INSERT INTO commission_plan
         (id, plan_type, max_level, is_custom, owner_user_id, effective_from, effective_to)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            plan.id,
            plan.plan_type.as_str(),
            plan.max_level,
            plan.is_custom as i64,
            plan.owner_user_id,
            plan.effective_from,
            plan.effective_to,
        ],
    )?;
    Ok(())
}

/// Insert one level's percentage for a plan. `percent` is a fraction (0.10 = 10%).
pub fn insert_plan_level(
    conn: &Connection,
    plan_id: PlanId,
    level: u32,
    percent: Decimal,
) -> Result<()> {
    conn.execute(
        "INSERT INTO commission_plan_level (plan_id, level, percent) VALUES (?1, ?2, ?3)",
        rusqlite::params![plan_id, level, percent.to_string()],
    )?;
    Ok(())
}

type RawPlan = (PlanId, String, u32, i64, Option<UserId>, i64, Option<i64>);

fn plan_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawPlan> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn finish_plan(raw: RawPlan) -> Result<CommissionPlan> {
    let (id, plan_type, max_level, is_custom, owner_user_id, effective_from, effective_to) = raw;
    let plan_type = PlanType::from_db(&plan_type)
        .ok_or_else(|| crate::DbError::Malformed(format!("plan_type: {plan_type:?}")))?;
    Ok(CommissionPlan {
        id,
        plan_type,
        max_level,
        is_custom: is_custom != 0,
        owner_user_id,
        effective_from,
        effective_to,
    })
}

/// Look up a commission plan by id.
pub fn commission_plan(conn: &Connection, id: PlanId) -> Result<Option<CommissionPlan>> {
    let pair = conn
        .query_row(
            "SELECT id, plan_type, max_level, is_custom, owner_user_id, effective_from, effective_to
             FROM commission_plan WHERE id = ?1",
            [id],
            plan_from_row,
        )
        .optional()?;
    pair.map(finish_plan).transpose()
}

/// The default (un-owned) plan for a track in force at the given instant,
/// newest `effective_from` first.
pub fn default_commission_plan_at(
    conn: &Connection,
    plan_type: PlanType,
    instant: i64,
) -> Result<Option<CommissionPlan>> {
    let pair = conn
        .query_row(
            "SELECT id, plan_type, max_level, is_custom, owner_user_id, effective_from, effective_to
             FROM commission_plan
             WHERE plan_type = ?1 AND is_custom = 0 AND owner_user_id IS NULL
               AND effective_from <= ?2 AND (effective_to IS NULL OR effective_to > ?2)
             ORDER BY effective_from DESC
             LIMIT 1",
            rusqlite::params![plan_type.as_str(), instant],
            plan_from_row,
        )
        .optional()?;
    pair.map(finish_plan).transpose()
}

/// A plan level's percentage fraction, if configured.
pub fn level_percent(conn: &Connection, plan_id: PlanId, level: u32) -> Result<Option<Decimal>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT percent FROM commission_plan_level WHERE plan_id = ?1 AND level = ?2",
            rusqlite::params![plan_id, level],
            |row| row.get(0),
        )
        .optional()?;
    raw.map(|s| parse_decimal("percent", &s)).transpose()
}

/// Insert a referral edge.
pub fn insert_referral_edge(conn: &Connection, edge: &ReferralEdgeRow) -> Result<()> {
    conn.execute(
        "INSERT INTO referral_edge (user_id, referrer_id, promoter_plan_id, author_plan_id)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            edge.user_id,
            edge.referrer_id,
            edge.promoter_plan_id,
            edge.author_plan_id,
        ],
    )?;
    Ok(())
}

/// A user's referral edge, if they were referred.
pub fn referral_edge(conn: &Connection, user_id: UserId) -> Result<Option<ReferralEdgeRow>> {
    let row = conn
        .query_row(
            "SELECT user_id, referrer_id, promoter_plan_id, author_plan_id
             FROM referral_edge WHERE user_id = ?1",
            [user_id],
            |row| {
                Ok(ReferralEdgeRow {
                    user_id: row.get(0)?,
                    referrer_id: row.get(1)?,
                    promoter_plan_id: row.get(2)?,
                    author_plan_id: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

/// Insert a royalty plan.
pub fn insert_royalty_plan(conn: &Connection, plan: &RoyaltyPlan) -> Result<()> {
    conn.execute(
        "INSERT INTO royalty_plan (id, royalty_percent, is_default, start_date)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            plan.id,
            plan.royalty_percent.to_string(),
            plan.is_default as i64,
            plan.start_date,
        ],
    )?;
    Ok(())
}

/// Look up a royalty plan by id.
pub fn royalty_plan(conn: &Connection, id: PlanId) -> Result<Option<RoyaltyPlan>> {
    let row = conn
        .query_row(
            "SELECT id, royalty_percent, is_default, start_date FROM royalty_plan WHERE id = ?1",
            [id],
            |row| {
                Ok((
                    row.get::<_, PlanId>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)? != 0,
                    row.get::<_, i64>(3)?,
                ))
            },
        )
        .optional()?;

    row.map(|(id, pct, is_default, start_date)| {
        Ok(RoyaltyPlan {
            id,
            royalty_percent: parse_decimal("royalty_percent", &pct)?,
            is_default,
            start_date,
        })
    })
    .transpose()
}

/// The default royalty plan with the most recent start date.
pub fn default_royalty_plan(conn: &Connection) -> Result<Option<RoyaltyPlan>> {
    let id: Option<PlanId> = conn
        .query_row(
            "SELECT id FROM royalty_plan WHERE is_default = 1 ORDER BY start_date DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;
    match id {
        Some(id) => royalty_plan(conn, id),
        None => Ok(None),
    }
}

/// Insert an author-novel royalty contract.
pub fn insert_royalty_contract(
    conn: &Connection,
    id: i64,
    novel_id: NovelId,
    author_id: UserId,
    plan_id: PlanId,
    effective_from: i64,
    effective_to: Option<i64>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO royalty_contract
         (id, novel_id, author_id, plan_id, effective_from, effective_to)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![id, novel_id, author_id, plan_id, effective_from, effective_to],
    )?;
    Ok(())
}

/// Plan selected by the contract active at the given instant, newest first.
pub fn contract_plan_at(
    conn: &Connection,
    novel_id: NovelId,
    author_id: UserId,
    instant: i64,
) -> Result<Option<PlanId>> {
    let id = conn
        .query_row(
            "SELECT plan_id FROM royalty_contract
             WHERE novel_id = ?1 AND author_id = ?2
               AND effective_from <= ?3 AND (effective_to IS NULL OR effective_to > ?3)
             ORDER BY effective_from DESC
             LIMIT 1",
            rusqlite::params![novel_id, author_id, instant],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}
