pub mod billing_provider;
pub mod coach_model;
pub mod webhook_verifier;
