pub mod local;

pub use local::BillingLocalClient;
