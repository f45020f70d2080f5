use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use uuid::Uuid;

/// Usage bucket: one row per (user, cycle start). The composite primary key
/// makes the per-row write serialization unit exactly the contention unit.
/// Counters only ever grow; old buckets are retained for history.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "usage_buckets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub cycle_start: DateTime<Utc>,
    pub cycle_end: DateTime<Utc>,
    pub messages_used: i64,
    pub page_speed_reports_used: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
