use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Memo {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(skip)]
    pub owner: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: String,
    pub content: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    pub title: String,
    pub messages: Vec<Message>,
    #[serde(skip)]
    pub owner: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Register {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Deserialize)]
pub struct Login {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

#[derive(Deserialize)]
pub struct MemoInput {
    pub title: String,
    pub content: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatInput {
    pub messages: Vec<Message>,
    pub model: String,
    pub session_id: Option<String>,
}

#[derive(Deserialize)]
pub struct TitleInput {
    pub title: String,
}

#[derive(Default)]
pub struct Backend {
    users: Vec<(String, String)>,
    tokens: Vec<(String, String)>,
    memos: Vec<Memo>,
    sessions: Vec<Session>,
}

impl Backend {
    fn user_for(&self, headers: &HeaderMap) -> Option<String> {
        let token = headers
            .get(header::AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?;
        self.tokens
            .iter()
            .find(|(t, _)| t == token)
            .map(|(_, user)| user.clone())
    }
}

pub type Db = Arc<RwLock<Backend>>;

/// Envelope used by the account and memo service.
fn coded(code: u16, data: Value, message: &str) -> Response {
    Json(json!({"code": code, "data": data, "message": message})).into_response()
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({"message": "unauthorized"}))).into_response()
}

fn chat_unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({"error": "unauthorized"}))).into_response()
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Backend::default()));
    let api = Router::new()
        .route("/user/register", post(register))
        .route("/user/login", post(login))
        .route("/memo/list", get(list_memos))
        .route("/memo/detail/{id}", get(get_memo))
        .route("/memo/create", post(create_memo))
        .route("/memo/update/{id}", put(update_memo))
        .route("/memo/delete/{id}", delete(delete_memo))
        .route("/chat", post(chat))
        .route("/chat/sessions", get(list_sessions))
        .route(
            "/chat/sessions/{id}",
            get(get_session).put(rename_session).delete(delete_session),
        )
        .with_state(db);
    Router::new().nest("/api", api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock backend listening");
    }
    axum::serve(listener, app()).await
}

async fn register(State(db): State<Db>, Json(input): Json<Register>) -> Response {
    if input.username.is_empty() || input.password.is_empty() {
        return coded(400, Value::Null, "username and password are required");
    }
    if input.password != input.confirm_password {
        return coded(400, Value::Null, "passwords do not match");
    }
    let mut db = db.write().await;
    if db.users.iter().any(|(u, _)| *u == input.username) {
        return coded(409, Value::Null, "username already exists");
    }
    db.users.push((input.username.clone(), input.password));
    coded(201, json!({"username": input.username}), "registered")
}

async fn login(State(db): State<Db>, Json(input): Json<Login>) -> Response {
    let mut db = db.write().await;
    let known = db
        .users
        .iter()
        .any(|(u, p)| *u == input.username && *p == input.password);
    if !known {
        return coded(401, Value::Null, "invalid username or password");
    }
    let token = Uuid::new_v4().to_string();
    db.tokens.push((token.clone(), input.username.clone()));
    coded(
        200,
        json!({"token": token, "username": input.username, "remember": input.remember}),
        "ok",
    )
}

async fn list_memos(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Response {
    let db = db.read().await;
    let Some(user) = db.user_for(&headers) else {
        return unauthorized();
    };
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params.page_size.unwrap_or(10).max(1);
    let owned: Vec<&Memo> = db.memos.iter().filter(|m| m.owner == user).collect();
    let list: Vec<&Memo> = owned
        .iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .copied()
        .collect();
    coded(
        200,
        json!({"list": list, "total": owned.len(), "page": page, "pageSize": page_size}),
        "ok",
    )
}

async fn get_memo(State(db): State<Db>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    let db = db.read().await;
    let Some(user) = db.user_for(&headers) else {
        return unauthorized();
    };
    match db.memos.iter().find(|m| m.id == id && m.owner == user) {
        Some(memo) => coded(200, json!(memo), "ok"),
        None => coded(404, Value::Null, "memo not found"),
    }
}

async fn create_memo(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<MemoInput>,
) -> Response {
    let mut db = db.write().await;
    let Some(user) = db.user_for(&headers) else {
        return unauthorized();
    };
    if input.title.trim().is_empty() {
        return coded(400, Value::Null, "title is required");
    }
    let memo = Memo {
        id: Uuid::new_v4().to_string(),
        title: input.title,
        content: input.content,
        owner: user,
    };
    db.memos.push(memo.clone());
    coded(201, json!(memo), "created")
}

async fn update_memo(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<MemoInput>,
) -> Response {
    let mut db = db.write().await;
    let Some(user) = db.user_for(&headers) else {
        return unauthorized();
    };
    match db.memos.iter_mut().find(|m| m.id == id && m.owner == user) {
        Some(memo) => {
            memo.title = input.title;
            memo.content = input.content;
            coded(200, json!(memo), "updated")
        }
        None => coded(404, Value::Null, "memo not found"),
    }
}

async fn delete_memo(State(db): State<Db>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    let mut db = db.write().await;
    let Some(user) = db.user_for(&headers) else {
        return unauthorized();
    };
    let before = db.memos.len();
    db.memos.retain(|m| !(m.id == id && m.owner == user));
    if db.memos.len() == before {
        return coded(404, Value::Null, "memo not found");
    }
    coded(200, Value::Null, "deleted")
}

async fn chat(State(db): State<Db>, headers: HeaderMap, Json(input): Json<ChatInput>) -> Response {
    let mut db = db.write().await;
    let Some(user) = db.user_for(&headers) else {
        return chat_unauthorized();
    };
    let Some(last) = input.messages.last().cloned() else {
        return Json(json!({"error": "messages must not be empty"})).into_response();
    };
    let reply = Message {
        role: "assistant".to_string(),
        content: format!("echo: {}", last.content),
    };

    let existing = input
        .session_id
        .as_deref()
        .and_then(|id| db.sessions.iter().position(|s| s.session_id == id && s.owner == user));
    let session_id = match existing {
        Some(idx) => {
            let session = &mut db.sessions[idx];
            session.messages.push(last);
            session.messages.push(reply.clone());
            session.session_id.clone()
        }
        None => {
            let session = Session {
                session_id: Uuid::new_v4().to_string(),
                title: last.content.chars().take(20).collect(),
                messages: vec![last, reply.clone()],
                owner: user,
            };
            let id = session.session_id.clone();
            db.sessions.push(session);
            id
        }
    };

    Json(json!({
        "sessionId": session_id,
        "model": input.model,
        "choices": [{"index": 0, "message": reply}],
    }))
    .into_response()
}

async fn list_sessions(State(db): State<Db>, headers: HeaderMap) -> Response {
    let db = db.read().await;
    let Some(user) = db.user_for(&headers) else {
        return chat_unauthorized();
    };
    let sessions: Vec<Value> = db
        .sessions
        .iter()
        .filter(|s| s.owner == user)
        .map(|s| json!({"sessionId": s.session_id, "title": s.title}))
        .collect();
    Json(sessions).into_response()
}

async fn get_session(State(db): State<Db>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    let db = db.read().await;
    let Some(user) = db.user_for(&headers) else {
        return chat_unauthorized();
    };
    match db.sessions.iter().find(|s| s.session_id == id && s.owner == user) {
        Some(session) => Json(json!(session)).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"error": "session not found"}))).into_response(),
    }
}

async fn rename_session(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<TitleInput>,
) -> Response {
    let mut db = db.write().await;
    let Some(user) = db.user_for(&headers) else {
        return chat_unauthorized();
    };
    match db
        .sessions
        .iter_mut()
        .find(|s| s.session_id == id && s.owner == user)
    {
        Some(session) => {
            session.title = input.title;
            Json(json!({"success": true, "sessionId": session.session_id, "title": session.title}))
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, Json(json!({"error": "session not found"}))).into_response(),
    }
}

async fn delete_session(State(db): State<Db>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    let mut db = db.write().await;
    let Some(user) = db.user_for(&headers) else {
        return chat_unauthorized();
    };
    let before = db.sessions.len();
    db.sessions.retain(|s| !(s.session_id == id && s.owner == user));
    if db.sessions.len() == before {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "session not found"}))).into_response();
    }
    Json(json!({"success": true})).into_response()
}
