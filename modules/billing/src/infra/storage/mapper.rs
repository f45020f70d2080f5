use crate::domain::repo::UsageCounters;
use crate::infra::storage::entity::bucket::Model as BucketModel;

/// Convert a usage-bucket row to domain counters. Counters are stored as
/// i64 for the database but never go negative.
pub fn bucket_to_counters(bucket: &BucketModel) -> UsageCounters {
    UsageCounters {
        messages: bucket.messages_used.max(0) as u64,
        page_speed_reports: bucket.page_speed_reports_used.max(0) as u64,
    }
}
