//! platform-core: shared infrastructure for CRM platform services.

pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
