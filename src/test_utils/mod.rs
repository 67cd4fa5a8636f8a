//! Test utilities.
//!
//! This module provides:
//! - Test data factories with override closures
//! - In-memory implementations of the repository and provider ports
//! - `TestAppStateBuilder` for HTTP-level tests

mod account_mocks;
mod app_state_builder;
mod billing_mocks;
mod coach_mocks;
mod factories;

pub use account_mocks::*;
pub use app_state_builder::*;
pub use billing_mocks::*;
pub use coach_mocks::*;
pub use factories::*;
