use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{self, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use entity::{CreateEmployeeRequest, Employee};
use platform_upstream::EmployeeGateway;
use products_hr::EmployeeService;
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::config::AppConfig;

pub struct AppState<G> {
    pub employees: Arc<EmployeeService<G>>,
    pub config: Arc<AppConfig>,
}

impl<G> AppState<G> {
    pub fn new(employees: EmployeeService<G>, config: Arc<AppConfig>) -> Self {
        Self {
            employees: Arc::new(employees),
            config,
        }
    }
}

impl<G> Clone for AppState<G> {
    fn clone(&self) -> Self {
        Self {
            employees: self.employees.clone(),
            config: self.config.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServeConfig {
    addr: SocketAddr,
}

impl ServeConfig {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::from((host, port)),
        }
    }
}

pub async fn serve<G>(config: ServeConfig, state: AppState<G>) -> anyhow::Result<()>
where
    G: EmployeeGateway + 'static,
{
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(%config.addr, "employee api listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    let allow_origin = if allowed.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed)
    };
    CorsLayer::new()
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_origin(allow_origin)
}

pub fn build_router<G>(state: AppState<G>) -> Router
where
    G: EmployeeGateway + 'static,
{
    let request_id = MakeRequestUuid;
    let header_name = HeaderName::from_static("x-request-id");
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/v1/employee",
            get(list_handler::<G>).post(create_handler::<G>),
        )
        .route("/api/v1/employee/search", get(search_query_handler::<G>))
        .route(
            "/api/v1/employee/search/{search_string}",
            get(search_path_handler::<G>),
        )
        .route(
            "/api/v1/employee/highestSalary",
            get(highest_salary_handler::<G>),
        )
        .route(
            "/api/v1/employee/topTenHighestEarningEmployeeNames",
            get(top_ten_handler::<G>),
        )
        .route(
            "/api/v1/employee/{id}",
            get(get_handler::<G>).delete(delete_handler::<G>),
        )
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), request_id))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.cors_allowed_origins)),
        )
        .with_state(state)
}

#[derive(Deserialize)]
struct SearchQuery {
    name: String,
}

async fn list_handler<G: EmployeeGateway>(State(state): State<AppState<G>>) -> Response {
    non_empty(state.employees.list_all().await, StatusCode::NO_CONTENT)
}

async fn search_query_handler<G: EmployeeGateway>(
    State(state): State<AppState<G>>,
    Query(query): Query<SearchQuery>,
) -> Response {
    non_empty(
        state.employees.search_by_name(&query.name).await,
        StatusCode::NOT_FOUND,
    )
}

async fn search_path_handler<G: EmployeeGateway>(
    State(state): State<AppState<G>>,
    Path(search_string): Path<String>,
) -> Response {
    non_empty(
        state.employees.search_by_name(&search_string).await,
        StatusCode::NOT_FOUND,
    )
}

async fn get_handler<G: EmployeeGateway>(
    State(state): State<AppState<G>>,
    Path(id): Path<String>,
) -> HttpResult<Json<Employee>> {
    state
        .employees
        .get_by_id(&id)
        .await
        .map(Json)
        .ok_or_else(|| HttpError::new(StatusCode::NOT_FOUND, "employee not found"))
}

async fn highest_salary_handler<G: EmployeeGateway>(State(state): State<AppState<G>>) -> Response {
    match state.employees.highest_salary().await {
        0 => StatusCode::NO_CONTENT.into_response(),
        salary => Json(salary).into_response(),
    }
}

async fn top_ten_handler<G: EmployeeGateway>(State(state): State<AppState<G>>) -> Response {
    non_empty(
        state.employees.top_ten_earners().await,
        StatusCode::NO_CONTENT,
    )
}

async fn create_handler<G: EmployeeGateway>(
    State(state): State<AppState<G>>,
    Json(request): Json<CreateEmployeeRequest>,
) -> HttpResult<Json<Employee>> {
    state
        .employees
        .create(&request)
        .await
        .map(Json)
        .ok_or_else(|| HttpError::new(StatusCode::BAD_REQUEST, "employee was not created"))
}

/// Every outcome is a 200; clients read the message to tell them apart.
async fn delete_handler<G: EmployeeGateway>(
    State(state): State<AppState<G>>,
    Path(id): Path<String>,
) -> String {
    let outcome = state.employees.delete_by_id(&id).await;
    info!(id = outcome.id(), deleted = outcome.is_success(), "delete handled");
    outcome.to_string()
}

fn non_empty<T: Serialize>(items: Vec<T>, empty_status: StatusCode) -> Response {
    if items.is_empty() {
        empty_status.into_response()
    } else {
        Json(items).into_response()
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    version: &'static str,
}

type HttpResult<T> = Result<T, HttpError>;

#[derive(Debug)]
struct HttpError {
    status: StatusCode,
    message: String,
}

impl HttpError {
    fn new(status: StatusCode, msg: &str) -> Self {
        Self {
            status,
            message: msg.to_string(),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    ctrl_c.await;

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    };
}
