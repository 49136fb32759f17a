pub mod collection_service;
pub mod job_scheduler_service;
pub mod upsert_service;
pub mod watermark_service;
