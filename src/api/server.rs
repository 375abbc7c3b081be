use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::AppError;
use crate::models::{Credentials, SemesterSelection};
use crate::orchestrator::SessionController;

/// 路由共享状态
#[derive(Clone)]
pub struct ApiState {
    controller: Arc<SessionController>,
    shutdown: CancellationToken,
}

impl ApiState {
    pub fn new(controller: Arc<SessionController>, shutdown: CancellationToken) -> Self {
        Self {
            controller,
            shutdown,
        }
    }
}

/// `/vtopdata` 的查询参数
#[derive(Debug, Deserialize)]
pub struct DataQuery {
    pub username: String,
    pub password: String,
    #[serde(rename = "semIndex")]
    pub sem_index: Option<usize>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}

pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/vtopdata", get(get_vtop_data))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn get_vtop_data(State(state): State<ApiState>, Query(query): Query<DataQuery>) -> Response {
    let credentials = Credentials::new(query.username, query.password);
    let selection = SemesterSelection::new(query.sem_index.unwrap_or(0));

    match state
        .controller
        .fetch(&credentials, selection, state.shutdown.child_token())
        .await
    {
        Ok(data) => (
            StatusCode::OK,
            Json(json!({ "status": "success", "data": data })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// 启动 HTTP 服务，`shutdown` 被取消时优雅退出并中断进行中的请求
pub async fn serve(controller: Arc<SessionController>, shutdown: CancellationToken) -> anyhow::Result<()> {
    let addr = controller.config().listen_addr.clone();
    let app = router(ApiState::new(controller, shutdown.clone()));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🌐 服务已启动: http://{}/vtopdata", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("服务已停止");
    Ok(())
}
