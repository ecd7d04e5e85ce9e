pub mod access_policy;
pub mod auth;
pub mod dashboard_service;
pub mod lead_service;
pub mod receipt_storage;
pub mod record_service;
pub mod workflow_service;
