//! Background Jobs Module
//!
//! Jobs here are registered with the job scheduler service and run
//! independently of user requests. They are designed to be:
//! - Idempotent: the daily upsert is keyed on (ticker, analysis_date)
//! - Fault-tolerant: per-asset failures degrade to neutral records
//! - Observable: every run lands in the job_runs table

pub mod daily_analysis_job;
