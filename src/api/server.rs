use std::net::SocketAddr;

use axum::{
    middleware,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::{cors, services, state::AppState, AnyError};

/// Build the full route table. Endpoints live under `/v1` and, for
/// clients predating the prefix, at the root as well.
pub fn build_router(state: AppState) -> Router {
    let v1 = Router::new()
        .route("/work_time/", get(services::work_time))
        .route("/http_status/", get(services::http_status))
        .route("/weburg_movie_info/", get(services::weburg_movie_info))
        .route("/version/", get(services::version))
        .route("/health/", get(services::health))
        .route("/ping/", get(services::ping))
        .route("/worker/", get(services::worker_list))
        .route(
            "/job/",
            get(services::job_list).post(services::job_new),
        )
        .route(
            "/job/{id}/",
            get(services::job_info)
                .put(services::job_update)
                .delete(services::job_delete),
        )
        .route(
            "/job/{id}/log/",
            get(services::job_log)
                .post(services::job_log_new)
                .delete(services::job_log_clear),
        )
        .route(
            "/job/{id}/state_history/",
            get(services::job_state_history).delete(services::job_state_history_clear),
        );

    Router::new()
        .nest("/v1", v1.clone())
        .merge(v1)
        .fallback(services::not_found)
        .layer(middleware::from_fn(cors::with_cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until the token is cancelled, then finish in-flight requests.
pub async fn serve(
    state: AppState,
    addr: &str,
    token: CancellationToken,
) -> Result<(), AnyError> {
    let app = build_router(state);
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(token.cancelled_owned())
    .await?;

    Ok(())
}
