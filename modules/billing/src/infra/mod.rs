pub mod storage;
pub mod subscriptions;
