use crate::jobs::collect_history_job::JobContext;

#[derive(Clone)]
pub struct AppState {
    pub jobs: JobContext,
}
