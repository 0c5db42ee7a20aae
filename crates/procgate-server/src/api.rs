//! HTTP API handlers using axum.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use procgate_common::Error;
use procgate_exec::CommandExecutor;
use procgate_manager::ManagerClient;
use procgate_ops::{dispatch, update, Resolution, UpdateError};
use std::sync::Arc;
use tracing::{error, info};

use crate::config::GatewayConfig;
use crate::types::{
    ErrorResponse, LogsQuery, ProcessListResponse, RestartResponse, StartBody, StartResponse,
    StopResponse, UpdateResponse,
};

/// Shared state handed to every handler.
///
/// No mutable state lives here: both collaborators are connectionless
/// handles, and every request acquires its own manager session.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<dyn ManagerClient>,
    pub executor: Arc<dyn CommandExecutor>,
    pub settings: Arc<GatewayConfig>,
}

/// Creates the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/status/:id", get(status_handler))
        .route("/describe/:id", get(describe_handler))
        .route("/restart/:id", post(restart_handler))
        .route("/stop/:id", post(stop_handler))
        .route("/start/:id", post(start_handler))
        .route("/logs/:id", get(logs_handler))
        .route("/update/:id", post(update_handler))
        .with_state(state)
}

async fn status_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    info!("Status query for '{}'", id);
    match dispatch::status(state.manager.as_ref(), &id).await? {
        Resolution::All(processes) => Ok(Json(ProcessListResponse {
            count: processes.len(),
            processes,
        })
        .into_response()),
        Resolution::One(summary) => Ok(Json(summary).into_response()),
    }
}

async fn describe_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    info!("Describe query for '{}'", id);
    let process = dispatch::describe(state.manager.as_ref(), &id).await?;
    Ok(Json(process).into_response())
}

async fn restart_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RestartResponse>, ApiError> {
    info!("Restart requested for '{}'", id);
    let receipt = dispatch::restart(state.manager.as_ref(), &id).await?;
    Ok(Json(RestartResponse {
        message: format!("Restarted '{}'", receipt.name),
        id: receipt.id,
        name: receipt.name,
    }))
}

async fn stop_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StopResponse>, ApiError> {
    info!("Stop requested for '{}'", id);
    dispatch::stop(state.manager.as_ref(), &id).await?;
    Ok(Json(StopResponse {
        message: format!("Stopped '{}'", id),
    }))
}

async fn start_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<StartBody>>,
) -> Result<Json<StartResponse>, ApiError> {
    info!("Start requested for '{}'", id);
    let request = body.map(|Json(b)| b).unwrap_or_default().into_request(id);
    let process = dispatch::start(state.manager.as_ref(), &request).await?;
    Ok(Json(StartResponse {
        message: format!("Started '{}'", process.name),
        proc: process,
    }))
}

async fn logs_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<LogsQuery>,
) -> Result<String, ApiError> {
    let lines = dispatch::parse_lines(query.lines.as_deref(), state.settings.default_log_lines);
    info!("Log tail requested for '{}' ({} lines)", id, lines);
    let text = dispatch::logs(
        state.executor.as_ref(),
        &state.settings.pm2_bin,
        &id,
        lines,
    )
    .await?;
    Ok(text)
}

async fn update_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UpdateResponse>, ApiError> {
    info!("Update requested for '{}'", id);
    let outcome = update::update(
        state.manager.as_ref(),
        state.executor.as_ref(),
        &state.settings.pm2_bin,
        &id,
        state.settings.update_log_lines,
    )
    .await?;
    Ok(Json(UpdateResponse {
        message: format!("Updated and restarted '{}'", outcome.process_name),
        cwd: outcome.working_directory,
        git_output: outcome.git_output,
        logs: outcome.logs_tail,
    }))
}

/// API error type: the orchestration taxonomy rendered as HTTP.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let (status, body) = match &err {
            Error::ProcessNotFound { .. } => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: err.to_string(),
                    details: None,
                    git_output: None,
                },
            ),
            Error::Validation { message, details } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: message.clone(),
                    details: details.clone(),
                    git_output: None,
                },
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: err.display_detail(),
                    details: None,
                    git_output: None,
                },
            ),
        };
        Self { status, body }
    }
}

impl From<UpdateError> for ApiError {
    fn from(err: UpdateError) -> Self {
        let mut api: ApiError = err.error.into();
        api.body.git_output = err.git_output;
        api
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("API error: {} - {}", self.status, self.body.error);
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use procgate_common::{ManagedProcess, ProcessStatus};
    use procgate_exec::mock::MockExecutor;
    use procgate_manager::mock::MockManager;
    use tower::util::ServiceExt; // for `oneshot`

    fn api_process() -> ManagedProcess {
        ManagedProcess {
            id: 0,
            name: "api".to_string(),
            pid: Some(4321),
            status: ProcessStatus::Online,
            working_directory: Some("/srv/api".into()),
            uptime_start_millis: Some(0),
            restart_count: 2,
        }
    }

    fn app(manager: MockManager, executor: MockExecutor) -> Router {
        create_router(AppState {
            manager: Arc::new(manager),
            executor: Arc::new(executor),
            settings: Arc::new(GatewayConfig::default()),
        })
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn status_all_lists_processes_with_count() {
        let app = app(MockManager::new(vec![api_process()]), MockExecutor::new());
        let response = app
            .oneshot(Request::get("/status/all").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["count"], 1);
        assert_eq!(json["processes"][0]["name"], "api");
    }

    #[tokio::test]
    async fn status_unknown_token_is_404() {
        let app = app(MockManager::new(vec![api_process()]), MockExecutor::new());
        let response = app
            .oneshot(Request::get("/status/ghost").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json = body_json(response).await;
        assert_eq!(json["error"], "Process not found: ghost");
    }

    #[tokio::test]
    async fn restart_returns_name_and_manager_id() {
        let app = app(MockManager::new(vec![api_process()]), MockExecutor::new());
        let response = app
            .oneshot(Request::post("/restart/api").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["message"], "Restarted 'api'");
        assert_eq!(json["id"], 0);
        assert_eq!(json["name"], "api");
    }

    #[tokio::test]
    async fn start_without_script_or_definition_is_400_with_details() {
        let app = app(MockManager::new(vec![]), MockExecutor::new());
        let response = app
            .oneshot(
                Request::post("/start/ghost")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("ghost"));
        assert!(json["details"].as_str().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn logs_default_to_thirty_lines_on_garbage_query() {
        let executor = Arc::new(MockExecutor::new().succeed("pm2 logs", "tail text\n"));
        let app = create_router(AppState {
            manager: Arc::new(MockManager::new(vec![])),
            executor: executor.clone(),
            settings: Arc::new(GatewayConfig::default()),
        });

        let response = app
            .oneshot(
                Request::get("/logs/api?lines=abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"tail text\n");

        // The executor saw the fallback default, not an error.
        let spec = &executor.invocations()[0];
        assert!(spec.args.contains(&"30".to_string()));
    }

    #[tokio::test]
    async fn update_success_bundles_git_output_and_logs() {
        let executor = MockExecutor::new()
            .succeed("git stash", "")
            .succeed("git pull", "Already up to date.\n")
            .succeed("pm2 logs", "server started\n");
        let app = app(MockManager::new(vec![api_process()]), executor);

        let response = app
            .oneshot(Request::post("/update/api").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["message"], "Updated and restarted 'api'");
        assert_eq!(json["cwd"], "/srv/api");
        assert_eq!(json["git_output"], "Already up to date.");
        assert_eq!(json["logs"], "server started");
    }

    #[tokio::test]
    async fn update_tails_the_configured_line_count() {
        let executor = Arc::new(
            MockExecutor::new()
                .succeed("git stash", "")
                .succeed("git pull", "Already up to date.\n")
                .succeed("pm2 logs", "server started\n"),
        );
        let settings = GatewayConfig {
            update_log_lines: 4,
            ..GatewayConfig::default()
        };
        let app = create_router(AppState {
            manager: Arc::new(MockManager::new(vec![api_process()])),
            executor: executor.clone(),
            settings: Arc::new(settings),
        });

        let response = app
            .oneshot(Request::post("/update/api").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let tail = executor
            .invocations()
            .into_iter()
            .find(|s| s.args.first().map(String::as_str) == Some("logs"))
            .unwrap();
        assert!(tail.args.contains(&"4".to_string()));
    }

    #[tokio::test]
    async fn update_restart_failure_is_500_but_keeps_git_output() {
        let executor = MockExecutor::new()
            .succeed("git stash", "")
            .succeed("git pull", "Already up to date.\n");
        let manager = MockManager::new(vec![api_process()]).fail_restart("spawn error");
        let app = app(manager, executor);

        let response = app
            .oneshot(Request::post("/update/api").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["error"], "spawn error");
        assert_eq!(json["git_output"], "Already up to date.");
    }
}
