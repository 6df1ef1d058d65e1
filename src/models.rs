pub mod auth;
pub mod callback;
pub mod lead;
pub mod metrics;
pub mod transfer;
