//! Job submission endpoint.

use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{FromRequest, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::dispatch::{Job, JobDispatch, TempInput};
use crate::http::request::{is_json_content_type, CountRequest};
use crate::http::response::{bad_request, request_timeout, UNSUPPORTED};
use crate::http::server::AppState;
use crate::net::ActorKind;
use crate::observability::metrics;
use crate::registry::JobId;

/// Path of the job submission endpoint.
pub const JOB_PATH: &str = "/api/count";

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub request_id: JobId,
}

/// `POST /api/count`: validate, persist the payload, start the job, and
/// answer with its ID without waiting for the worker.
///
/// The body must arrive within the idle timeout; a stalled upload gets 408
/// and the connection is closed.
pub async fn submit(State(state): State<AppState>, request: Request) -> Response {
    if !is_json_content_type(request.headers()) {
        return bad_request(UNSUPPORTED);
    }

    let deadline = Duration::from_secs(state.config.http.idle_timeout_secs);
    let body = match tokio::time::timeout(deadline, Bytes::from_request(request, &state)).await {
        Ok(Ok(body)) => body,
        Ok(Err(rejection)) => return rejection.into_response(),
        Err(_) => {
            tracing::debug!(timeout_secs = deadline.as_secs(), "Request body timed out");
            return request_timeout();
        }
    };

    let request = match CountRequest::parse(&body, state.config.worker.default_operation) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected job submission");
            return bad_request(e.to_string());
        }
    };

    if !state.registry.contains(&request.id) {
        return bad_request("Unknown id");
    }

    let job_id = state.registry.mint();
    let input = match TempInput::create(
        state.registry.tmp_storage(),
        &job_id,
        request.data.as_bytes(),
    )
    .await
    {
        Ok(input) => input,
        Err(e) => {
            tracing::error!(job_id = %job_id, error = %e, "Cannot create tmp file");
            return bad_request("Cannot create tmp file");
        }
    };

    tracing::info!(
        job_id = %job_id,
        channel_id = %request.id,
        operation = %request.operation,
        bytes = request.data.len(),
        "Job accepted"
    );
    metrics::record_job_submitted();

    let job = Job {
        id: job_id,
        owner: request.id,
        operation: request.operation,
        input,
    };
    JobDispatch::new(job, state.registry.clone(), state.config.worker.clone())
        .spawn(state.tracker.track(ActorKind::Job));

    (StatusCode::OK, Json(SubmitResponse { request_id: job_id })).into_response()
}
