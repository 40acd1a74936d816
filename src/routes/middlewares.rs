use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Method, Request},
    middleware::Next,
    response::IntoResponse,
};

use crate::session::RequestContext;

/// Records who is calling. Writes are logged at info, reads at debug.
pub async fn log_request(
    connect_info: Option<ConnectInfo<SocketAddr>>,
    context: RequestContext,
    request: Request<Body>,
    next: Next<Body>,
) -> impl IntoResponse {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let remote = connect_info
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| String::from("-"));
    let user = context.user_id.as_deref().unwrap_or("anonymous");

    if method == Method::GET {
        tracing::debug!(%method, %path, %remote, user, admin = context.is_admin, "request");
    } else {
        tracing::info!(%method, %path, %remote, user, admin = context.is_admin, "request");
    }

    next.run(request).await
}
