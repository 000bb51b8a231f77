//! `/mask` endpoint handler

use crate::types::{IngressError, IngressResult};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use piiscrub_core::{MaskPipeline, MaskRequest, MaskResponse, Mode};
use piiscrub_observability::Metrics;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinError;
use tracing::{debug, error, warn};

#[derive(Clone)]
pub struct MaskState {
    pub pipeline: Arc<MaskPipeline>,
    pub metrics: Arc<Metrics>,
    /// Wall-clock budget for one pipeline run
    pub budget: Duration,
}

impl MaskState {
    pub fn new(pipeline: Arc<MaskPipeline>, metrics: Arc<Metrics>) -> Self {
        let budget = Duration::from_millis(pipeline.config().limits.max_processing_time_ms);
        Self {
            pipeline,
            metrics,
            budget,
        }
    }
}

/// Metric label for the requested mode; unknown values collapse to one label
fn mode_label(request: &MaskRequest) -> &'static str {
    match request.mode.as_deref() {
        None => Mode::default().as_str(),
        Some(mode) => mode.parse::<Mode>().map(|m| m.as_str()).unwrap_or("invalid"),
    }
}

/// Detect or mask PII in the submitted text
pub async fn mask_handler(
    State(state): State<MaskState>,
    payload: Result<Json<MaskRequest>, JsonRejection>,
) -> IngressResult<Json<MaskResponse>> {
    let started = Instant::now();

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let err = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                IngressError::RequestTooLarge {
                    max: state.pipeline.config().limits.max_request_body_bytes,
                }
            } else {
                IngressError::MalformedBody
            };
            debug!(status = %rejection.status(), "Rejected request body");
            state.metrics.record_request(
                "invalid",
                err.status().as_u16(),
                started.elapsed().as_secs_f64(),
            );
            return Err(err);
        }
    };

    let mode = mode_label(&request);
    let result = run_pipeline(&state, request).await;
    let elapsed = started.elapsed().as_secs_f64();

    match result {
        Ok(response) => {
            state.metrics.record_request(mode, StatusCode::OK.as_u16(), elapsed);
            state.metrics.record_entities(
                response
                    .entities_found
                    .iter()
                    .map(|entity| entity.entity_type.as_str()),
            );
            Ok(Json(response))
        }
        Err(err) => {
            let status = err.status();
            if status.is_server_error() {
                error!(status = status.as_u16(), "Mask request failed: {}", err);
            } else {
                debug!(status = status.as_u16(), "Mask request rejected");
            }
            state.metrics.record_request(mode, status.as_u16(), elapsed);
            Err(err)
        }
    }
}

/// Run the pipeline on a blocking thread under the configured budget
///
/// On timeout the blocking task is detached and finishes in the background;
/// its result is dropped.
async fn run_pipeline(state: &MaskState, request: MaskRequest) -> IngressResult<MaskResponse> {
    let pipeline = state.pipeline.clone();
    let task = tokio::task::spawn_blocking(move || pipeline.run(request));

    match tokio::time::timeout(state.budget, task).await {
        Ok(Ok(result)) => result.map_err(IngressError::from),
        Ok(Err(join_err)) => Err(join_failure(&join_err)),
        Err(_) => {
            warn!(
                budget_ms = state.budget.as_millis() as u64,
                "Mask request exceeded processing budget"
            );
            Err(IngressError::Timeout)
        }
    }
}

/// The join error's message can quote the panic payload, so only its kind is kept
fn join_failure(err: &JoinError) -> IngressError {
    let kind = if err.is_panic() {
        "panicked"
    } else if err.is_cancelled() {
        "cancelled"
    } else {
        "failed"
    };
    IngressError::Internal(format!("pipeline task {}", kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_join_failure_drops_panic_payload() {
        let join_err = tokio::task::spawn_blocking(|| panic!("analyzer exploded on John Doe"))
            .await
            .unwrap_err();

        let err = join_failure(&join_err);
        let message = err.to_string();
        assert_eq!(message, "Internal error: pipeline task panicked");
        assert!(!message.contains("John Doe"));
    }

    #[test]
    fn test_mode_label() {
        assert_eq!(mode_label(&MaskRequest::default()), "mask");

        let mut request = MaskRequest::new("x");
        request.mode = Some("detect".to_string());
        assert_eq!(mode_label(&request), "detect");

        request.mode = Some("scramble".to_string());
        assert_eq!(mode_label(&request), "invalid");
    }
}
