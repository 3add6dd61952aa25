use log::info;
use std::{
    env,
    net::{Ipv6Addr, SocketAddr},
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

mod concerts;
mod context;
mod errors;
mod schemas;
mod serialized;
mod sse;

pub use context::ServerContext;
pub use errors::{ServerError, ServerResult};
pub use sse::ServerEvent;

/// The default port the server will listen on.
pub const DEFAULT_PORT: u16 = 9070;

pub type Router = axum::Router<ServerContext>;

/// Starts the turnstile server
pub async fn run_server(context: ServerContext) {
    let port = env::var("TURNSTILE_SERVER_PORT")
        .map(|x| x.parse::<u16>().expect("Port must be a number"))
        .unwrap_or(DEFAULT_PORT);

    let addr: SocketAddr = (Ipv6Addr::UNSPECIFIED, port).into();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let version_one_router = Router::new().nest("/concerts", concerts::router());

    let root_router = Router::new()
        .nest("/v1", version_one_router)
        .layer(cors)
        .with_state(context);

    let listener = TcpListener::bind(&addr).await.expect("listens on address");

    info!("Listening on {}", addr);

    axum::serve(listener, root_router.into_make_service())
        .await
        .unwrap();
}
