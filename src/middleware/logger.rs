// src/middleware/logger.rs

use std::time::Instant;

use axum::{extract::Request, http::header::USER_AGENT, middleware::Next, response::Response};

use super::rate_limit::{client_ip, peer_addr, ClientIp};

// Uma linha por requisição, depois que a resposta existe
pub async fn request_logger(request: Request, next: Next) -> Response {
    let started = Instant::now();

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let client = match request.extensions().get::<ClientIp>() {
        Some(ClientIp(ip)) => ip.clone(),
        None => client_ip(request.headers(), peer_addr(&request)),
    };
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        duration_ms = started.elapsed().as_millis() as u64,
        client_ip = %client,
        user_agent = %user_agent,
        "Requisição processada"
    );

    response
}
