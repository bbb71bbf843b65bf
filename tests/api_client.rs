use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use serde_json::{json, Value};
use trash_mboa_client::api::{auth, collectes, dechets, signalements, users};
use trash_mboa_client::{
    ApiClient, ApiError, MemoryTokenStore, Notification, ReqwestTransport, SessionEvents,
    TokenPair, TokenStore, DEFAULT_LOGIN_ROUTE,
};

const PASSWORD: &str = "secret123";

struct Issued {
    generation: u32,
    access: String,
    refresh: String,
}

/// Backend double: accepts only the latest access token and rotates the pair on refresh
struct Backend {
    issued: Mutex<Issued>,
    refresh_calls: AtomicUsize,
    refresh_delay: Duration,
}

impl Backend {
    fn new(refresh_delay: Duration) -> Self {
        Self {
            issued: Mutex::new(Issued {
                generation: 1,
                access: "access-1".to_string(),
                refresh: "refresh-1".to_string(),
            }),
            refresh_calls: AtomicUsize::new(0),
            refresh_delay,
        }
    }

    fn authorized(&self, req: &HttpRequest) -> bool {
        let bearer = req
            .headers()
            .get(actix_web::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));
        let issued = self.issued.lock().unwrap();
        bearer == Some(issued.access.as_str())
    }

    fn pair(issued: &Issued) -> Value {
        json!({ "accessToken": issued.access, "refreshToken": issued.refresh })
    }
}

fn unauthorized(message: &str) -> HttpResponse {
    HttpResponse::Unauthorized().json(json!({ "message": message }))
}

async fn login(body: web::Json<Value>, backend: web::Data<Backend>) -> HttpResponse {
    if body.get("password").and_then(Value::as_str) != Some(PASSWORD) {
        return unauthorized("Email ou mot de passe incorrect");
    }
    let issued = backend.issued.lock().unwrap();
    let mut session = Backend::pair(&issued);
    session["user"] = json!({ "id": 1, "email": body["email"], "nom": "Ada", "role": "USER" });
    HttpResponse::Ok().json(session)
}

async fn refresh(body: web::Json<Value>, backend: web::Data<Backend>) -> HttpResponse {
    backend.refresh_calls.fetch_add(1, Ordering::SeqCst);
    actix_web::rt::time::sleep(backend.refresh_delay).await;

    let presented = body.get("refreshToken").and_then(Value::as_str).unwrap_or_default();
    let mut issued = backend.issued.lock().unwrap();
    if presented != issued.refresh {
        return unauthorized("Invalid refresh token");
    }
    issued.generation += 1;
    issued.access = format!("access-{}", issued.generation);
    issued.refresh = format!("refresh-{}", issued.generation);
    HttpResponse::Ok().json(Backend::pair(&issued))
}

async fn logout(req: HttpRequest, backend: web::Data<Backend>) -> HttpResponse {
    if !backend.authorized(&req) {
        return unauthorized("Token expired");
    }
    HttpResponse::Ok().json(json!({ "message": "Déconnecté" }))
}

async fn me(req: HttpRequest, backend: web::Data<Backend>) -> HttpResponse {
    if !backend.authorized(&req) {
        return unauthorized("Token expired");
    }
    HttpResponse::Ok().json(json!({ "id": 1, "email": "ada@example.com", "nom": "Ada", "role": "USER" }))
}

async fn list_dechets(req: HttpRequest, backend: web::Data<Backend>) -> HttpResponse {
    if !backend.authorized(&req) {
        return unauthorized("Token expired");
    }
    HttpResponse::Ok().json(json!([{ "id": 7, "type": "PLASTIQUE", "quantite": 3, "statut": "EN_ATTENTE" }]))
}

async fn list_signalements(req: HttpRequest, backend: web::Data<Backend>) -> HttpResponse {
    if !backend.authorized(&req) {
        return unauthorized("Token expired");
    }
    HttpResponse::Ok().json(json!([{ "id": 2, "type": "DEPOT_SAUVAGE", "statut": "EN_COURS" }]))
}

// Collector-only endpoint: an ordinary user is refused even with a fresh token
async fn pending_collectes() -> HttpResponse {
    unauthorized("Accès réservé aux collecteurs")
}

#[derive(Default)]
struct RecordingEvents {
    notifications: Mutex<Vec<Notification>>,
    navigations: Mutex<Vec<String>>,
}

impl SessionEvents for RecordingEvents {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }

    fn navigate(&self, route: &str) {
        self.navigations.lock().unwrap().push(route.to_string());
    }
}

pub struct TestApp {
    pub address: String,
    backend: web::Data<Backend>,
}

impl TestApp {
    fn refresh_calls(&self) -> usize {
        self.backend.refresh_calls.load(Ordering::SeqCst)
    }
}

async fn spawn_app(refresh_delay: Duration) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let backend = web::Data::new(Backend::new(refresh_delay));
    let state = backend.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .route("/api/auth/login", web::post().to(login))
            .route("/api/auth/refresh", web::post().to(refresh))
            .route("/api/auth/logout", web::post().to(logout))
            .route("/api/users/me", web::get().to(me))
            .route("/api/dechets", web::get().to(list_dechets))
            .route("/api/signalements", web::get().to(list_signalements))
            .route("/api/collectes/en-attente", web::get().to(pending_collectes))
    })
    .workers(1)
    .listen(listener)
    .expect("Failed to bind address")
    .run();
    let _ = tokio::spawn(server);

    TestApp { address, backend }
}

fn client_for(
    app: &TestApp,
    store: Arc<MemoryTokenStore>,
    events: Arc<RecordingEvents>,
) -> ApiClient {
    let transport = ReqwestTransport::new(app.address.clone(), Duration::from_secs(5))
        .expect("Failed to build transport");
    ApiClient::new(Arc::new(transport), store, events, DEFAULT_LOGIN_ROUTE)
}

#[tokio::test]
async fn login_stores_the_issued_tokens() {
    let app = spawn_app(Duration::ZERO).await;
    let store = Arc::new(MemoryTokenStore::new());
    let client = client_for(&app, store.clone(), Arc::new(RecordingEvents::default()));

    let session = auth::login(&client, "ada@example.com", PASSWORD)
        .await
        .expect("login succeeds");

    assert_eq!(session.user.id, "1");
    assert_eq!(
        store.load().await.unwrap(),
        Some(TokenPair::new("access-1", "refresh-1"))
    );
    let me = users::current_user(&client).await.expect("authenticated request");
    assert_eq!(me.display_name(), "Ada");
}

#[tokio::test]
async fn wrong_password_is_not_treated_as_expired_session() {
    let app = spawn_app(Duration::ZERO).await;
    let store = Arc::new(MemoryTokenStore::new());
    let events = Arc::new(RecordingEvents::default());
    let client = client_for(&app, store.clone(), events.clone());

    let error = auth::login(&client, "ada@example.com", "wrong-password")
        .await
        .unwrap_err();

    assert_eq!(error.status().map(|s| s.as_u16()), Some(401));
    assert_eq!(error.backend_message(), Some("Email ou mot de passe incorrect"));
    assert_eq!(app.refresh_calls(), 0);
    assert!(store.load().await.unwrap().is_none());
    assert!(events.navigations.lock().unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_expired_requests_share_one_refresh() {
    let app = spawn_app(Duration::from_millis(200)).await;
    let store = Arc::new(MemoryTokenStore::with_tokens(TokenPair::new("expired", "refresh-1")));
    let events = Arc::new(RecordingEvents::default());
    let client = client_for(&app, store.clone(), events.clone());

    let (me, dechets, signalements) = tokio::join!(
        users::current_user(&client),
        dechets::list(&client),
        signalements::list(&client)
    );

    assert_eq!(me.expect("profile replayed").email, "ada@example.com");
    assert_eq!(dechets.expect("dechets replayed").len(), 1);
    assert_eq!(signalements.expect("signalements replayed").len(), 1);
    assert_eq!(app.refresh_calls(), 1);
    assert_eq!(
        store.load().await.unwrap(),
        Some(TokenPair::new("access-2", "refresh-2"))
    );
    assert!(events.notifications.lock().unwrap().is_empty());
    assert!(!client.is_refreshing());
    assert_eq!(client.pending_requests(), 0);
}

#[tokio::test]
async fn rejected_refresh_ends_the_session_once() {
    let app = spawn_app(Duration::from_millis(100)).await;
    let store = Arc::new(MemoryTokenStore::with_tokens(TokenPair::new("expired", "revoked")));
    let events = Arc::new(RecordingEvents::default());
    let client = client_for(&app, store.clone(), events.clone());

    let (me, dechets, signalements) = tokio::join!(
        users::current_user(&client),
        dechets::list(&client),
        signalements::list(&client)
    );

    assert!(me.unwrap_err().is_session_expired());
    assert!(dechets.unwrap_err().is_session_expired());
    assert!(signalements.unwrap_err().is_session_expired());
    assert_eq!(app.refresh_calls(), 1);
    assert!(store.load().await.unwrap().is_none());
    assert_eq!(
        *events.notifications.lock().unwrap(),
        vec![Notification::session_expired()]
    );
    assert_eq!(*events.navigations.lock().unwrap(), vec!["/login".to_string()]);
}

#[tokio::test]
async fn second_401_after_refresh_reaches_the_caller() {
    let app = spawn_app(Duration::ZERO).await;
    let store = Arc::new(MemoryTokenStore::with_tokens(TokenPair::new("expired", "refresh-1")));
    let events = Arc::new(RecordingEvents::default());
    let client = client_for(&app, store.clone(), events.clone());

    let error = collectes::pending(&client).await.unwrap_err();

    match &error {
        ApiError::Status { status, .. } => assert_eq!(status.as_u16(), 401),
        other => panic!("expected a 401 status error, got {:?}", other),
    }
    assert!(!error.is_session_expired());
    assert_eq!(app.refresh_calls(), 1);
    // The refreshed session survives; only this request failed
    assert_eq!(
        store.load().await.unwrap(),
        Some(TokenPair::new("access-2", "refresh-2"))
    );
    assert!(events.navigations.lock().unwrap().is_empty());
}

#[tokio::test]
async fn logout_clears_tokens_and_notifies() {
    let app = spawn_app(Duration::ZERO).await;
    let store = Arc::new(MemoryTokenStore::with_tokens(TokenPair::new("access-1", "refresh-1")));
    let events = Arc::new(RecordingEvents::default());
    let client = client_for(&app, store.clone(), events.clone());

    auth::logout(&client).await.expect("logout succeeds");

    assert!(store.load().await.unwrap().is_none());
    assert_eq!(
        *events.notifications.lock().unwrap(),
        vec![Notification::logged_out()]
    );
}
