//! End-to-end tests against the live mock backend.
//!
//! # Design
//! Starts the mock server on a random port. The blocking test drives the
//! I/O-free `build` / `parse` pair with ureq standing in for the host's
//! request primitive; the async tests go through `ApiClient` and the reqwest
//! transport.

use std::sync::Arc;
use std::time::Duration;

use memo_api_core::endpoints::{memo, user};
use memo_api_core::{
    ApiClient, ApiError, ChatMessage, ChatOptions, ClientConfig, HttpMethod, HttpRequest, HttpResponse,
    MemoryStore, Pagination, ReqwestTransport, RequestClient, TOKEN_KEY,
};
use serde_json::{json, Value};

fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, headers: &[(String, String)]) -> ureq::RequestBuilder<B> {
    for (key, value) in headers {
        builder = builder.header(key.as_str(), value.as_str());
    }
    builder
}

/// Execute an `HttpRequest` using ureq and return an `HttpResponse`.
///
/// Status codes are returned as data, never as `Err`, so the core does all
/// status interpretation.
fn execute(req: HttpRequest) -> HttpResponse {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let body = req.body.clone().unwrap_or_default();
    let mut response = match req.method {
        HttpMethod::Get => with_headers(agent.get(&req.url), &req.headers).call(),
        HttpMethod::Delete => with_headers(agent.delete(&req.url), &req.headers)
            .force_send_body()
            .send(body.as_bytes()),
        HttpMethod::Post => with_headers(agent.post(&req.url), &req.headers).send(body.as_bytes()),
        HttpMethod::Put => with_headers(agent.put(&req.url), &req.headers).send(body.as_bytes()),
    }
    .expect("HTTP transport error");

    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string().unwrap_or_default();
    HttpResponse::new(status, body)
}

fn spawn_blocking_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}/api")
}

async fn spawn_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run(listener));
    format!("http://{addr}/api")
}

#[test]
fn host_driven_memo_lifecycle() {
    let base_url = spawn_blocking_server();
    let store = Arc::new(MemoryStore::new());
    let config = ClientConfig::new(&base_url).unwrap();
    let client = RequestClient::new(&config, Arc::clone(&store));

    // Step 1: register and log in.
    let req = client.build(&user::register("ann", "pw", "pw").unwrap()).unwrap();
    let registered = client.parse(execute(req)).unwrap();
    assert_eq!(registered["username"], "ann");

    let req = client.build(&user::login("ann", "pw", false).unwrap()).unwrap();
    assert!(req.header("Authorization").is_none());
    let session = client.parse(execute(req)).unwrap();
    store.set(TOKEN_KEY, session["token"].as_str().unwrap());

    // Step 2: create, then fetch by id.
    let req = client.build(&memo::create("T", "C").unwrap()).unwrap();
    assert!(req.header("Authorization").unwrap().starts_with("Bearer "));
    let created = client.parse(execute(req)).unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    let req = client.build(&memo::detail(&id)).unwrap();
    assert!(req.url.contains(&format!("/memo/detail/{id}?_t=")));
    assert!(req.body.is_none());
    let fetched = client.parse(execute(req)).unwrap();
    assert_eq!(fetched, json!({"id": id, "title": "T", "content": "C"}));

    // Step 3: delete, then detail is a server logic error.
    let req = client.build(&memo::delete(&id)).unwrap();
    assert_eq!(client.parse(execute(req)).unwrap(), Value::Null);

    let req = client.build(&memo::detail(&id)).unwrap();
    let err = client.parse(execute(req)).unwrap_err();
    assert!(matches!(err, ApiError::Server { .. }));
    assert_eq!(err.code(), Some(json!(404)));
    assert_eq!(err.message(), "memo not found");
}

#[tokio::test(flavor = "multi_thread")]
async fn memo_endpoints_over_reqwest() {
    let base_url = spawn_server().await;
    let store = Arc::new(MemoryStore::new());
    let config = ClientConfig::new(&base_url).unwrap();
    let api = ApiClient::from_config(&config, Arc::clone(&store)).unwrap();

    let err = api.users().register("ann", "pw", "other").await.unwrap_err();
    assert_eq!(err.code(), Some(json!(400)));
    assert_eq!(err.message(), "passwords do not match");

    api.users().register("ann", "pw", "pw").await.unwrap();
    let err = api.users().login("ann", "wrong", false).await.unwrap_err();
    assert_eq!(err.code(), Some(json!(401)));
    let session = api.users().login("ann", "pw", true).await.unwrap();

    // Without a token the memo service answers with an HTTP 401.
    let err = api.memos().list(Pagination::default()).await.unwrap_err();
    assert!(matches!(err, ApiError::Http { status: 401, .. }));
    assert_eq!(err.message(), "unauthorized");

    store.set(TOKEN_KEY, session["token"].as_str().unwrap());

    let created = api.memos().create("first", "body").await.unwrap();
    let id = created["id"].as_str().unwrap().to_string();
    api.memos().create("second", "body").await.unwrap();

    let page = api.memos().list(Pagination { page: 1, page_size: 1 }).await.unwrap();
    assert_eq!(page["total"], 2);
    assert_eq!(page["list"][0]["title"], "first");

    let updated = api.memos().update(&id, "renamed", "new body").await.unwrap();
    assert_eq!(updated["title"], "renamed");
    assert_eq!(api.memos().detail(&id).await.unwrap()["content"], "new body");

    api.memos().delete(&id).await.unwrap();
    let err = api.memos().delete(&id).await.unwrap_err();
    assert_eq!(err.code(), Some(json!(404)));
}

#[tokio::test(flavor = "multi_thread")]
async fn chat_endpoints_over_reqwest() {
    let base_url = spawn_server().await;
    let store = Arc::new(MemoryStore::new());
    let config = ClientConfig::new(&base_url).unwrap();
    let api = ApiClient::from_config(&config, Arc::clone(&store)).unwrap();

    api.users().register("bo", "pw", "pw").await.unwrap();
    let session = api.users().login("bo", "pw", false).await.unwrap();
    store.set(TOKEN_KEY, session["token"].as_str().unwrap());

    let err = api.chat().chat_with_ai(Vec::new(), &ChatOptions::default()).await.unwrap_err();
    assert!(matches!(err, ApiError::Chat { status: 200, .. }));
    assert_eq!(err.message(), "messages must not be empty");

    let answer = api
        .chat()
        .chat_with_ai(vec![ChatMessage::user("hello")], &ChatOptions::default())
        .await
        .unwrap();
    assert_eq!(answer["model"], "x1");
    assert_eq!(answer["choices"][0]["message"]["content"], "echo: hello");
    let session_id = answer["sessionId"].as_str().unwrap().to_string();

    let options = ChatOptions {
        model: None,
        session_id: Some(session_id.clone()),
    };
    let history = vec![
        ChatMessage::user("hello"),
        ChatMessage::assistant("echo: hello"),
        ChatMessage::user("again"),
    ];
    let answer = api.chat().chat_with_ai(history, &options).await.unwrap();
    assert_eq!(answer["sessionId"], session_id.as_str());
    assert_eq!(answer["choices"][0]["message"]["content"], "echo: again");

    let sessions = api.chat().get_history().await.unwrap();
    assert_eq!(sessions, json!([{"sessionId": session_id, "title": "hello"}]));

    let detail = api.chat().get_messages(&session_id).await.unwrap();
    assert_eq!(detail["messages"].as_array().unwrap().len(), 4);

    let renamed = api.chat().update_session_title(&session_id, "greetings").await.unwrap();
    assert_eq!(renamed["title"], "greetings");

    api.chat().delete_session(&session_id).await.unwrap();
    let err = api.chat().get_messages(&session_id).await.unwrap_err();
    assert!(matches!(err, ApiError::Http { status: 404, .. }));
    assert_eq!(err.message(), memo_api_core::DEFAULT_FAILURE_MESSAGE);

    store.remove(TOKEN_KEY);
    let err = api
        .chat()
        .chat_with_ai(vec![ChatMessage::user("hi")], &ChatOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Chat { status: 401, .. }));
    assert_eq!(err.message(), "unauthorized");
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ClientConfig::new(&format!("http://{addr}/api")).unwrap();
    let transport = ReqwestTransport::new(Duration::from_secs(2)).unwrap();
    let api = ApiClient::new(RequestClient::new(&config, MemoryStore::new()), transport);

    let err = api.chat().get_history().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
    assert!(err.code().is_none());
}
