use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::jobs::collect_history_job;
use crate::models::TriggerResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/collect-history", post(trigger_collect_history))
}

/// POST /api/jobs/collect-history - Run one collection and wait for it.
///
/// Symbol-level failures are counted in the summary message and detailed in
/// the logs. The response reports success as long as the run completed.
pub async fn trigger_collect_history(
    State(state): State<AppState>,
) -> Result<Json<TriggerResponse>, AppError> {
    info!("POST /api/jobs/collect-history - Manual collection run");
    let report = collect_history_job::collect_history(&state.jobs)
        .await
        .map_err(|e| {
            error!("Collection run failed: {}", e);
            e
        })?;
    Ok(Json(TriggerResponse::success(report.summary())))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::app::create_app;
    use crate::config::CollectorSettings;
    use crate::jobs::collect_history_job::JobContext;
    use crate::services::collection_service::HistoryCollector;
    use crate::state::AppState;
    use crate::test_support::{daily_series, date, MemoryHistoryStore, ScriptedProvider};

    fn app(group_size: usize, provider: ScriptedProvider) -> axum::Router {
        let collector = HistoryCollector::new(
            Arc::new(MemoryHistoryStore::new()),
            Arc::new(provider),
            CollectorSettings {
                group_size,
                ..CollectorSettings::default()
            },
        );
        create_app(AppState {
            jobs: JobContext::new(Arc::new(collector), &["PETR4", "XXXX3"]),
        })
    }

    async fn post_trigger(app: axum::Router) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/jobs/collect-history")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_trigger_reports_success_despite_symbol_failure() {
        let provider = ScriptedProvider::new()
            .with_series("PETR4", daily_series(date(2024, 1, 1), 3))
            .with_vendor_error("XXXX3", "No data found, symbol may be delisted");

        let (status, body) = post_trigger(app(3, provider)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("1 of 2 symbols updated, 1 failed"));
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn test_trigger_run_level_failure_is_500() {
        let (status, body) = post_trigger(app(0, ScriptedProvider::new())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("group size"));
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(3, ScriptedProvider::new())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
