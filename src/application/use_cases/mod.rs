pub mod account;
pub mod billing;
pub mod coach;
pub mod metering;
pub mod reconciler;
