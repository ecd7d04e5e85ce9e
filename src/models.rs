pub mod access;
pub mod auth;
pub mod dashboard;
pub mod sales;
pub mod tech;
pub mod validation;
pub mod workflow;
