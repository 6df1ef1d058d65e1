pub mod auth;
pub mod callback_service;
pub mod lead_service;
pub mod metrics_service;
pub mod transfer_service;
