use std::str::FromStr;

use axum::{Router, routing::get};
use guildhall::{AppState, auth, events, guilds, home, profiles};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::SameSite};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(30)));

    let connect_options =
        SqliteConnectOptions::from_str(dotenv::var("DATABASE_URL").unwrap().as_str())
            .unwrap()
            .create_if_missing(true)
            .foreign_keys(true);
    let db_pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect_with(connect_options)
        .await
        .unwrap();

    sqlx::migrate!().run(&db_pool).await.unwrap();

    let secret_path =
        dotenv::var("CLIENT_SECRET_PATH").unwrap_or_else(|_| "client_secret.json".to_owned());
    let base_url = dotenv::var("BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_owned());
    let secrets = serde_json::Value::from_str(&std::fs::read_to_string(&secret_path).unwrap()).unwrap();
    let clients = auth::Clients::from_json(secrets, &base_url).unwrap();

    let app_state = AppState { db_pool, clients };

    let app = Router::new()
        .route("/", get(home::home))
        .route("/about", get(home::about))
        .merge(auth::router())
        .nest("/g", guilds::router())
        .nest("/p", profiles::router())
        .nest("/e", events::router())
        .with_state(app_state)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http());

    let bind_addr = dotenv::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_owned());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await.unwrap();
    tracing::info!("listening on {bind_addr}");
    axum::serve(listener, app).await.unwrap();
}
