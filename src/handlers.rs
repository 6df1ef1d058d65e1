pub mod auth;
pub mod callbacks;
pub mod leads;
pub mod metrics;
pub mod transfers;
