//! Background jobs executed by the job scheduler service.
//!
//! - `collect_history_job` - incremental price history collection for the
//!   tracked symbols
//!
//! Jobs are idempotent and can be re-run at any time; a killed run leaves
//! committed upserts in place and the next run resumes from them.

pub mod collect_history_job;
