//! Request handlers: thin adapters translating HTTP requests into
//! scheduler operations and scheduler errors into responses.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Local, Utc};
use tracing::{debug, error, info};

use super::error::ApiError;
use super::models::{HealthBody, HttpStatusBody, JobView, UrlQuery, WorkTimeBody};
use super::state::AppState;
use super::utils::{client_ip, decode_body};
use crate::humanize::format_duration;
use crate::job::{JobUpdate, LogItem, NewJob, StateHistoryItem};
use crate::weburg::Movie;
use crate::worker::Worker;
use crate::worktime;

pub async fn health(State(state): State<AppState>) -> Json<HealthBody> {
    let uptime = (Utc::now() - state.started_at).to_std().unwrap_or_default();
    Json(HealthBody {
        uptime: format_duration(uptime),
    })
}

pub async fn version() -> Json<&'static str> {
    Json(env!("CARGO_PKG_VERSION"))
}

/// Worker poll: upsert the worker, then either hand out a job, report
/// the cap as exhausted (409), or reply not-found with an empty job.
pub async fn ping(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    debug!("Got job-next request");
    let ip = client_ip(&headers, Some(peer.ip()));
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    match state.scheduler.dispatch(ip, user_agent).await? {
        Some(job) => Ok((StatusCode::OK, Json(JobView::from(&job))).into_response()),
        None => Ok((StatusCode::NOT_FOUND, Json(JobView::empty())).into_response()),
    }
}

pub async fn worker_list(State(state): State<AppState>) -> Json<Vec<Worker>> {
    debug!("Got worker-list request");
    Json(state.scheduler.list_workers().await)
}

pub async fn job_list(State(state): State<AppState>) -> Json<Vec<JobView>> {
    debug!("Got job-list request");
    let jobs = state.scheduler.list_jobs().await;
    Json(jobs.iter().map(JobView::from).collect())
}

pub async fn job_new(
    State(state): State<AppState>,
    body: String,
) -> Result<impl IntoResponse, ApiError> {
    debug!("Got job-new request");
    let new: NewJob = decode_body(&body)?;
    let job = state.scheduler.add_job(new).await.map_err(|err| {
        error!("{}", err);
        ApiError::Conflict(format!("Error with saving job: {}", err))
    })?;
    info!("Job '{}' created", job.id);
    Ok((StatusCode::CREATED, Json(JobView::from(&job))))
}

pub async fn job_info(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobView>, ApiError> {
    debug!("Got job-info request");
    let job = state.scheduler.get_job(&id).await?;
    Ok(Json(JobView::from(&job)))
}

pub async fn job_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: String,
) -> Result<Json<JobView>, ApiError> {
    debug!("Got job-update request");
    let update: JobUpdate = decode_body(&body)?;
    let job = state.scheduler.update_job(&id, update).await?;
    info!("Job '{}' updated", job.id);
    Ok(Json(JobView::from(&job)))
}

pub async fn job_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    debug!("Got job-delete request");
    state.scheduler.delete_job(&id).await?;
    info!("Job '{}' deleted", id);
    Ok(StatusCode::OK)
}

pub async fn job_log(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<LogItem>>, ApiError> {
    Ok(Json(state.scheduler.job_log(&id).await?))
}

pub async fn job_log_new(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: String,
) -> Result<impl IntoResponse, ApiError> {
    let item: LogItem = decode_body(&body)?;
    let stamped = state.scheduler.append_log(&id, item).await?;
    Ok((StatusCode::CREATED, Json(stamped)))
}

pub async fn job_log_clear(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    debug!("Got log-delete request");
    state.scheduler.clear_log(&id).await?;
    Ok(StatusCode::OK)
}

pub async fn job_state_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<StateHistoryItem>>, ApiError> {
    Ok(Json(state.scheduler.job_state_history(&id).await?))
}

pub async fn job_state_history_clear(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    debug!("Got state_history-delete request");
    state.scheduler.clear_state_history(&id).await?;
    Ok(StatusCode::OK)
}

/// DND status. With DND disabled it is always work time.
pub async fn work_time(State(state): State<AppState>) -> Json<WorkTimeBody> {
    let now = Local::now();
    let mut is_work_time = true;
    if state.config.dnd_enable {
        is_work_time = worktime::is_available(
            now.naive_local(),
            state.config.dnd_starts_at,
            state.config.dnd_ends_at,
        );
    }
    Json(WorkTimeBody {
        local_time: now,
        local_time_utc: Utc::now(),
        dnd_starts_at: state.config.dnd_starts_at,
        dnd_ends_at: state.config.dnd_ends_at,
        is_work_time,
        dnd_enable: state.config.dnd_enable,
    })
}

/// HEAD-probe an arbitrary URL and report its status and size.
pub async fn http_status(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Result<Json<HttpStatusBody>, ApiError> {
    if query.url.is_empty() {
        error!("Empty url parameter");
        return Err(ApiError::BadRequest("Empty url parameter".to_string()));
    }
    let response = state.probe.head(&query.url).send().await.map_err(|err| {
        error!("HTTP request error: {}", err);
        ApiError::BadRequest(format!("HTTP request error: {}", err))
    })?;

    let status = response.status();
    Ok(Json(HttpStatusBody {
        status_code: status.as_u16(),
        status: format!("{} {}", status.as_u16(), status.canonical_reason().unwrap_or("")),
        content_length: response
            .content_length()
            .map(|length| length as i64)
            .unwrap_or(-1),
    }))
}

pub async fn weburg_movie_info(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Result<Json<Vec<Movie>>, ApiError> {
    if query.url.is_empty() {
        error!("Empty url parameter");
        return Err(ApiError::BadRequest("Empty url parameter".to_string()));
    }
    let movies = state.movies.info(&query.url).await.map_err(|err| {
        error!("Error with getting info from Weburg: {}", err);
        ApiError::BadRequest(format!("Error with getting info from Weburg: {}", err))
    })?;
    Ok(Json(movies))
}

pub async fn not_found() -> ApiError {
    error!("Page not found");
    ApiError::NotFound("Page not found".to_string())
}
