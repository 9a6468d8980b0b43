pub mod aggregator;
pub mod analysis_service;
pub mod correlation;
pub mod dashboard_service;
pub mod job_scheduler_service;
pub mod narrative_service;
pub mod rate_limiter;
