//! The task endpoint.
//!
//! One path, one handler: the request method selects the operation, the input
//! is validated, one statement runs against the store and the outcome goes
//! back as an [`Envelope`]. Every error is converted at this boundary.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State, rejection::QueryRejection},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::db::Database;
use crate::error::{ApiError, ApiResult};
use crate::types::{Envelope, Task, TaskStatus};

/// Path of the task endpoint.
pub const API_PATH: &str = "/api/tasks";

pub const TITLE_REQUIRED: &str = "Task title is required";
pub const ID_REQUIRED: &str = "Task ID is required";
pub const ID_NOT_INTEGER: &str = "Task ID must be an integer";
pub const STATUS_REQUIRED: &str = "Task status is required";
pub const TASK_DELETED: &str = "Task deleted successfully";

/// State shared by endpoint requests.
#[derive(Clone)]
pub struct ApiState {
    db: Arc<Database>,
    /// Owner used for every request, whatever the client claims.
    owner: Arc<str>,
}

impl ApiState {
    pub fn new(db: Arc<Database>, owner: impl Into<Arc<str>>) -> Self {
        Self {
            db,
            owner: owner.into(),
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }
}

/// Query string accepted on every method.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub user: Option<String>,
    pub id: Option<String>,
}

impl TaskQuery {
    /// Collect the known keys from decoded pairs. A repeated key keeps its
    /// last value; unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "user" => query.user = Some(value),
                "id" => query.id = Some(value),
                _ => {}
            }
        }
        query
    }
}

/// Build the router serving [`API_PATH`].
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route(API_PATH, any(tasks_endpoint))
        .with_state(state)
}

/// Dispatch on the request method.
pub async fn tasks_endpoint(
    State(state): State<ApiState>,
    method: Method,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
    body: Bytes,
) -> Response {
    let query = match query {
        Ok(Query(pairs)) => TaskQuery::from_pairs(pairs),
        Err(rejection) => {
            let err = ApiError::invalid_value("query", rejection.body_text());
            warn!(method = %method, "Rejected task request: {}", err);
            return err.into_response();
        }
    };

    if let Some(user) = query.user.as_deref() {
        debug!(requested_user = %user, owner = %state.owner(), "Client-supplied user ignored");
    }

    let result = match method {
        Method::OPTIONS => return StatusCode::OK.into_response(),
        Method::GET => list_tasks(&state).map(respond),
        Method::POST => create_task(&state, &body).map(respond),
        Method::PUT => update_task(&state, &body).map(respond),
        Method::DELETE => delete_task(&state, query.id.as_deref()).map(respond),
        _ => Err(ApiError::method_not_allowed()),
    };

    match result {
        Ok(response) => response,
        Err(err) => {
            if err.is_validation() {
                warn!(method = %method, field = ?err.field, "Rejected task request: {}", err);
            } else {
                error!(method = %method, "Task request failed: {}", err);
            }
            err.into_response()
        }
    }
}

fn respond<T: Serialize>(envelope: Envelope<T>) -> Response {
    Json(envelope).into_response()
}

/// GET: every task of the server owner.
pub fn list_tasks(state: &ApiState) -> ApiResult<Envelope<Vec<Task>>> {
    let tasks = state.db().list_tasks(state.owner())?;
    Ok(Envelope::ok(tasks))
}

/// POST: body `{title, status?}`.
pub fn create_task(state: &ApiState, body: &[u8]) -> ApiResult<Envelope<Option<Task>>> {
    let body = json_object(body);

    let title = match body.get("title") {
        Some(Value::String(title)) if !title.trim().is_empty() => title.trim(),
        _ => return Err(ApiError::missing_field("title", TITLE_REQUIRED)),
    };
    let status = parse_status(body.get("status"), false)?.unwrap_or_default();

    let task = state.db().create_task(state.owner(), title, status)?;
    if let Some(ref task) = task {
        debug!(task_id = task.id, "Task created");
    }
    Ok(Envelope::ok(task))
}

/// PUT: body `{id, status}`. A missing row yields `data: null`.
pub fn update_task(state: &ApiState, body: &[u8]) -> ApiResult<Envelope<Option<Task>>> {
    let body = json_object(body);

    let id = parse_id_value(body.get("id"))?;
    let status = parse_status(body.get("status"), true)?.unwrap_or_default();

    let task = state.db().update_task_status(state.owner(), id, status)?;
    if task.is_none() {
        debug!(task_id = id, "Status update for unknown task");
    }
    Ok(Envelope::ok(task))
}

/// DELETE: `?id=`. Reports success whether or not a row went away.
pub fn delete_task(state: &ApiState, id: Option<&str>) -> ApiResult<Envelope<()>> {
    let id = match id.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw
            .parse::<i64>()
            .map_err(|_| ApiError::invalid_value("id", ID_NOT_INTEGER))?,
        _ => return Err(ApiError::missing_field("id", ID_REQUIRED)),
    };

    let removed = state.db().delete_task(state.owner(), id)?;
    debug!(task_id = id, removed, "Task delete");
    Ok(Envelope::acknowledged(TASK_DELETED))
}

/// Decode a JSON object body. Anything else reads as an empty object, so the
/// usual missing-field errors apply.
fn json_object(body: &[u8]) -> Map<String, Value> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn parse_id_value(value: Option<&Value>) -> ApiResult<i64> {
    match value {
        None | Some(Value::Null) => Err(ApiError::missing_field("id", ID_REQUIRED)),
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| ApiError::invalid_value("id", ID_NOT_INTEGER)),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| ApiError::invalid_value("id", ID_NOT_INTEGER)),
        Some(_) => Err(ApiError::invalid_value("id", ID_NOT_INTEGER)),
    }
}

fn parse_status(value: Option<&Value>, required: bool) -> ApiResult<Option<TaskStatus>> {
    match value {
        None | Some(Value::Null) if required => {
            Err(ApiError::missing_field("status", STATUS_REQUIRED))
        }
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => s
            .parse::<TaskStatus>()
            .map(Some)
            .map_err(|e| ApiError::invalid_value("status", e.to_string())),
        Some(other) => Err(ApiError::invalid_value(
            "status",
            format!("Invalid task status: {}", other),
        )),
    }
}
