//! HTTP server: the task endpoint plus the browser UI.
//!
//! Page and fragment routes translate htmx requests into controller
//! operations; the controller reaches the task endpoint through the API
//! client, over HTTP, like any other client would.

use axum::{
    Router,
    extract::{Form, Path, Query, State},
    http::{HeaderName, Method, StatusCode, header},
    response::{Html, IntoResponse, Json, Response},
    routing::{delete, get, post},
};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::templates;
use crate::api::{self, API_PATH, ApiState};
use crate::client::{ApiClient, TaskApi};
use crate::config::Config;
use crate::db::Database;
use crate::types::{Filter, TaskStatus};
use crate::ui::view::{
    panel_collapsed, render_task_section, render_user_selector, toggle_panel,
};
use crate::ui::{Confirmed, HtmlView, LocalStorage, TaskController};

/// State shared by the UI routes.
#[derive(Clone)]
pub struct WebState {
    db: Arc<Database>,
    controller: Arc<Mutex<TaskController>>,
    storage: Arc<StdMutex<LocalStorage>>,
}

impl WebState {
    pub fn new(db: Arc<Database>, controller: TaskController, storage: LocalStorage) -> Self {
        Self {
            db,
            controller: Arc::new(Mutex::new(controller)),
            storage: Arc::new(StdMutex::new(storage)),
        }
    }

    fn panel_collapsed(&self) -> bool {
        let storage = self.storage.lock().unwrap_or_else(|p| p.into_inner());
        panel_collapsed(&storage)
    }
}

/// Health check response.
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint.
async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Root endpoint - the full page. The task list itself loads as a fragment.
async fn root(State(state): State<WebState>) -> Html<String> {
    let users = state.db.list_users().unwrap_or_else(|e| {
        warn!("Failed to load users: {}", e);
        Vec::new()
    });
    let current_user = state.controller.lock().await.state().user.clone();
    let collapsed = state.panel_collapsed();

    Html(templates::render_index(
        &render_user_selector(&users, &current_user),
        &render_task_section(collapsed),
    ))
}

/// Turn a view into a fragment response. When nothing was rendered the page
/// keeps its current content.
fn fragment(view: HtmlView) -> Response {
    match view.into_html() {
        Some(html) => Html(html).into_response(),
        None => ([("hx-reswap", "none")], Html(String::new())).into_response(),
    }
}

async fn ui_load(State(state): State<WebState>) -> Response {
    let controller = state.controller.lock().await;
    let mut view = HtmlView::new();
    controller.load(&mut view).await;
    fragment(view)
}

#[derive(Debug, Deserialize)]
struct AddForm {
    #[serde(default)]
    title: String,
}

async fn ui_add(State(state): State<WebState>, Form(form): Form<AddForm>) -> Response {
    let controller = state.controller.lock().await;
    let mut view = HtmlView::new();
    controller.add(&form.title, &mut view).await;
    fragment(view)
}

#[derive(Debug, Deserialize)]
struct StatusForm {
    status: String,
}

async fn ui_set_status(
    State(state): State<WebState>,
    Path(task_id): Path<i64>,
    Form(form): Form<StatusForm>,
) -> Response {
    let status = match form.status.parse::<TaskStatus>() {
        Ok(status) => status,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let controller = state.controller.lock().await;
    let mut view = HtmlView::new();
    controller.set_status(task_id, status, &mut view).await;
    fragment(view)
}

#[derive(Debug, Default, Deserialize)]
struct RemoveParams {
    #[serde(default)]
    confirmed: bool,
}

async fn ui_remove(
    State(state): State<WebState>,
    Path(task_id): Path<i64>,
    Query(params): Query<RemoveParams>,
) -> Response {
    let controller = state.controller.lock().await;
    let mut view = HtmlView::new();
    controller
        .remove(task_id, &Confirmed(params.confirmed), &mut view)
        .await;
    fragment(view)
}

#[derive(Debug, Deserialize)]
struct FilterForm {
    filter: String,
}

async fn ui_filter(State(state): State<WebState>, Form(form): Form<FilterForm>) -> Response {
    let filter = match form.filter.parse::<Filter>() {
        Ok(filter) => filter,
        Err(e) => return (StatusCode::BAD_REQUEST, e).into_response(),
    };

    let mut controller = state.controller.lock().await;
    let mut view = HtmlView::new();
    controller.change_filter(filter, &mut view).await;
    fragment(view)
}

#[derive(Debug, Deserialize)]
struct UserForm {
    #[serde(default)]
    user: String,
}

async fn ui_user(State(state): State<WebState>, Form(form): Form<UserForm>) -> Response {
    let mut controller = state.controller.lock().await;
    let mut view = HtmlView::new();
    controller.change_user(&form.user, &mut view).await;
    fragment(view)
}

/// Flip the persisted panel state and re-render the panel.
async fn ui_panel_toggle(State(state): State<WebState>) -> Html<String> {
    let collapsed = {
        let mut storage = state.storage.lock().unwrap_or_else(|p| p.into_inner());
        match toggle_panel(&mut storage) {
            Ok(collapsed) => collapsed,
            Err(e) => {
                warn!("Failed to persist panel state: {}", e);
                panel_collapsed(&storage)
            }
        }
    };
    Html(render_task_section(collapsed))
}

/// Build the router with all routes.
pub fn build_router(web: WebState, api_state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
        ]);

    Router::new()
        // Page
        .route("/", get(root))
        // htmx fragment routes
        .route("/ui/tasks", get(ui_load).post(ui_add))
        .route("/ui/tasks/{task_id}/status", post(ui_set_status))
        .route("/ui/tasks/{task_id}", delete(ui_remove))
        .route("/ui/filter", post(ui_filter))
        .route("/ui/user", post(ui_user))
        .route("/ui/panel/toggle", post(ui_panel_toggle))
        .with_state(web)
        // Task endpoint
        .merge(api::router(api_state))
        .route("/api/health", get(health))
        // Add middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Handle for a running server.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Address the server is bound to.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL of the server, e.g. `http://127.0.0.1:8080`.
    pub fn base_url(&self) -> String {
        format!("http://{}", loopback(self.addr))
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = self.task.await {
            warn!("Server task ended abnormally: {}", e);
        }
    }
}

/// Address to reach a server bound to `addr` from this machine.
fn loopback(addr: SocketAddr) -> SocketAddr {
    let ip = match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    SocketAddr::new(ip, addr.port())
}

/// Bind the configured address and start serving in the background.
///
/// The UI's API client targets `client.api_url` when configured, otherwise
/// this server's own task endpoint.
pub async fn start_server(db: Arc<Database>, config: &Config) -> anyhow::Result<ServerHandle> {
    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    let addr = listener.local_addr()?;

    let api_url = config
        .client
        .api_url
        .clone()
        .unwrap_or_else(|| format!("http://{}{}", loopback(addr), API_PATH));
    let api: Arc<dyn TaskApi> = Arc::new(ApiClient::new(api_url.clone()));
    let controller = TaskController::new(api).with_user(config.client.user.clone());
    let storage = LocalStorage::open(&config.client.storage_path);

    let web = WebState::new(Arc::clone(&db), controller, storage);
    let api_state = ApiState::new(db, config.server.owner.clone());
    let app = build_router(web, api_state);

    info!("Server listening on http://{}", addr);
    info!(api_url = %api_url, owner = %config.server.owner, "Task endpoint ready");

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("Server shutting down");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok(ServerHandle {
        addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "healthy",
            version: "0.1.0",
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("0.1.0"));
    }

    #[test]
    fn unspecified_addresses_map_to_loopback() {
        let addr: SocketAddr = "0.0.0.0:8080".parse().unwrap();
        assert_eq!(loopback(addr).to_string(), "127.0.0.1:8080");

        let addr: SocketAddr = "[::]:9000".parse().unwrap();
        assert_eq!(loopback(addr).to_string(), "[::1]:9000");

        let addr: SocketAddr = "192.168.1.5:80".parse().unwrap();
        assert_eq!(loopback(addr), addr);
    }
}
