mod auth;
mod classes;
mod context;
mod docs;
mod errors;
mod schemas;
mod serialized;
mod sets;

pub mod logging;

use std::{
    env,
    net::{Ipv6Addr, SocketAddr},
};

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

pub use context::{ClassroomInstance, ServerContext};

/// The default port the server will listen on.
pub const DEFAULT_PORT: u16 = 9350;

/// Starts the studydeck server
pub async fn run_server(classroom: ClassroomInstance) {
    let port = env::var("STUDYDECK_SERVER_PORT")
        .map(|x| x.parse::<u16>().expect("Port must be a number"))
        .unwrap_or(DEFAULT_PORT);

    let addr: SocketAddr = (Ipv6Addr::UNSPECIFIED, port).into();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let context = ServerContext { classroom };

    let version_one_router = Router::new()
        .nest("/auth", auth::router())
        .nest("/classes", classes::router())
        .nest("/sets", sets::router());

    let root_router = Router::new()
        .nest("/v1", version_one_router)
        .route("/api.json", get(docs::docs))
        .layer(cors)
        .with_state(context);

    let listener = TcpListener::bind(&addr).await.expect("listens on address");

    axum::serve(listener, root_router.into_make_service())
        .await
        .expect("server runs");
}
