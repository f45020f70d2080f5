//! SeaORM-backed repository implementation for the domain port.
//!
//! This struct is generic over `C: ConnectionTrait`, so you can construct it
//! with a `DatabaseConnection` **or** a transactional connection. The guarded
//! increment relies on single-statement UPDATE atomicity: the cap check and
//! the counter bump are one statement, so no cross-statement locking is
//! needed for the monotonic-counter invariant.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::contract::model::{CycleWindow, Limit};
use crate::domain::repo::{
    BillingRepository, IncrementOutcome, MeteredCounter, UsageCounters,
};
use crate::infra::storage::entity::{anchor, bucket, site};
use crate::infra::storage::mapper::bucket_to_counters;

/// SeaORM repository impl.
/// Holds a connection object; its lifetime/ownership is up to the caller.
pub struct SeaOrmBillingRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmBillingRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl<C> BillingRepository for SeaOrmBillingRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn find_anchor(&self, user_id: Uuid) -> anyhow::Result<Option<DateTime<Utc>>> {
        let found = anchor::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("find_anchor failed")?;
        Ok(found.map(|m| m.anchor_at))
    }

    async fn upsert_anchor(&self, user_id: Uuid, anchor_at: DateTime<Utc>) -> anyhow::Result<bool> {
        let existing = anchor::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("upsert_anchor lookup failed")?;

        match existing {
            None => {
                let m = anchor::ActiveModel {
                    user_id: Set(user_id),
                    anchor_at: Set(anchor_at),
                    updated_at: Set(Utc::now()),
                };
                m.insert(&self.conn)
                    .await
                    .context("upsert_anchor insert failed")?;
                Ok(true)
            }
            Some(current) if current.anchor_at != anchor_at => {
                let m = anchor::ActiveModel {
                    user_id: Set(user_id),
                    anchor_at: Set(anchor_at),
                    updated_at: Set(Utc::now()),
                };
                m.update(&self.conn)
                    .await
                    .context("upsert_anchor update failed")?;
                Ok(true)
            }
            // Same value stored: no write, the upsert is a comparison.
            Some(_) => Ok(false),
        }
    }

    async fn usage_for_cycle(
        &self,
        user_id: Uuid,
        cycle_start: DateTime<Utc>,
    ) -> anyhow::Result<UsageCounters> {
        let found = bucket::Entity::find_by_id((user_id, cycle_start))
            .one(&self.conn)
            .await
            .context("usage_for_cycle failed")?;
        Ok(found
            .map(|m| bucket_to_counters(&m))
            .unwrap_or_default())
    }

    async fn ensure_bucket(&self, user_id: Uuid, cycle: CycleWindow) -> anyhow::Result<()> {
        let now = Utc::now();
        let m = bucket::ActiveModel {
            user_id: Set(user_id),
            cycle_start: Set(cycle.start),
            cycle_end: Set(cycle.end),
            messages_used: Set(0),
            page_speed_reports_used: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };
        // Tolerate a concurrent creator; the existing row wins.
        bucket::Entity::insert(m)
            .on_conflict(
                OnConflict::columns([bucket::Column::UserId, bucket::Column::CycleStart])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .context("ensure_bucket insert failed")?;
        Ok(())
    }

    async fn try_increment(
        &self,
        user_id: Uuid,
        cycle: CycleWindow,
        counter: MeteredCounter,
        delta: u64,
        cap: Limit,
    ) -> anyhow::Result<IncrementOutcome> {
        let column = match counter {
            MeteredCounter::Messages => bucket::Column::MessagesUsed,
            MeteredCounter::PageSpeedReports => bucket::Column::PageSpeedReportsUsed,
        };

        let mut update = bucket::Entity::update_many()
            .col_expr(column, Expr::col(column).add(delta as i64))
            // cycle_end tracks the latest resolved window for this bucket.
            .col_expr(bucket::Column::CycleEnd, Expr::value(cycle.end))
            .col_expr(bucket::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(bucket::Column::UserId.eq(user_id))
            .filter(bucket::Column::CycleStart.eq(cycle.start));
        if let Limit::Limited(cap) = cap {
            update = update.filter(column.lt(cap as i64));
        }

        let result = update
            .exec(&self.conn)
            .await
            .context("try_increment failed")?;

        // Separate read-back: `used` may include a concurrent increment that
        // landed between the UPDATE and this SELECT. The guard itself is not
        // affected; only the reported count can run ahead.
        let used = self
            .usage_for_cycle(user_id, cycle.start)
            .await
            .map(|counters| match counter {
                MeteredCounter::Messages => counters.messages,
                MeteredCounter::PageSpeedReports => counters.page_speed_reports,
            })?;

        if result.rows_affected == 0 {
            Ok(IncrementOutcome::CapReached { used })
        } else {
            Ok(IncrementOutcome::Updated { used })
        }
    }

    async fn count_sites(&self, user_id: Uuid) -> anyhow::Result<u64> {
        let count = site::Entity::find()
            .filter(site::Column::UserId.eq(user_id))
            .count(&self.conn)
            .await
            .context("count_sites failed")?;
        Ok(count)
    }
}
