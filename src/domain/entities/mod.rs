pub mod billing_event;
pub mod billing_interval;
pub mod coach_request;
pub mod price_table;
pub mod subscription_status;
pub mod subscription_tier;
pub mod usage_window;
pub mod user_account;
