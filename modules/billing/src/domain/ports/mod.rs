pub mod subscriptions;

pub use subscriptions::{SubscriptionProvider, SubscriptionRecord};
