pub mod collector_service;
pub mod dashboard_service;
pub mod tracking;
