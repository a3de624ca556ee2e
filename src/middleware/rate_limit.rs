// src/middleware/rate_limit.rs

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

// ---
// Token bucket por endereço
// ---

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

pub struct TokenBucket {
    state: Mutex<BucketState>,
    refill_per_sec: f64,
    capacity: f64,
}

impl TokenBucket {
    fn new(per_minute: u32, burst: u32, now: Instant) -> Self {
        let capacity = f64::from(burst.max(1));
        Self {
            state: Mutex::new(BucketState { tokens: capacity, last_refill: now }),
            refill_per_sec: f64::from(per_minute) / 60.0,
            capacity,
        }
    }

    /// Consome um token se houver. O balde começa cheio (`burst`).
    pub fn try_acquire_at(&self, now: Instant) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let elapsed = now.saturating_duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        state.last_refill = now;

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    // Um balde que já teria recarregado por completo equivale a um novo
    fn is_full_at(&self, now: Instant) -> bool {
        let state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let elapsed = now.saturating_duration_since(state.last_refill).as_secs_f64();
        state.tokens + elapsed * self.refill_per_sec >= self.capacity
    }
}

struct Registry {
    buckets: HashMap<String, Arc<TokenBucket>>,
    last_sweep: Instant,
}

/// Registro de baldes por IP. O lock do mapa só cobre a busca/criação
/// e a varredura; cada balde tem o próprio lock.
pub struct IpRateLimiter {
    registry: Mutex<Registry>,
    per_minute: u32,
    burst: u32,
    trust_proxy_headers: bool,
    sweep_every: Duration,
}

impl IpRateLimiter {
    pub fn new(per_minute: u32, burst: u32) -> Self {
        // Tempo para um balde vazio voltar a ficar cheio
        let refill_secs = f64::from(burst.max(1)) * 60.0 / f64::from(per_minute.max(1));

        Self {
            registry: Mutex::new(Registry {
                buckets: HashMap::new(),
                last_sweep: Instant::now(),
            }),
            per_minute,
            burst,
            trust_proxy_headers: false,
            sweep_every: Duration::from_secs_f64(refill_secs.max(1.0)),
        }
    }

    /// Passa a usar `X-Forwarded-For`/`X-Real-IP` como chave. Só faz sentido
    /// atrás de um proxy que sobrescreve esses cabeçalhos.
    pub fn trusting_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }

    pub fn client_key(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
        if self.trust_proxy_headers {
            client_ip(headers, peer)
        } else {
            peer.map(|addr| addr.ip().to_string())
                .unwrap_or_else(|| "unknown".to_string())
        }
    }

    fn bucket_for(&self, client: &str, now: Instant) -> Arc<TokenBucket> {
        let mut registry = self.registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if now.saturating_duration_since(registry.last_sweep) >= self.sweep_every {
            let before = registry.buckets.len();
            registry.buckets.retain(|_, bucket| !bucket.is_full_at(now));
            registry.last_sweep = now;
            tracing::debug!(
                evicted = before - registry.buckets.len(),
                remaining = registry.buckets.len(),
                "Baldes ociosos removidos"
            );
        }

        registry
            .buckets
            .entry(client.to_string())
            .or_insert_with(|| Arc::new(TokenBucket::new(self.per_minute, self.burst, now)))
            .clone()
    }

    pub fn check_at(&self, client: &str, now: Instant) -> bool {
        self.bucket_for(client, now).try_acquire_at(now)
    }

    pub fn check(&self, client: &str) -> bool {
        self.check_at(client, Instant::now())
    }

    pub fn tracked_clients(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .buckets
            .len()
    }
}

/// Chave usada pelo limitador, repassada ao logger pelas extensões.
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

/// Endereço do cliente visto pelos cabeçalhos: primeiro salto do `X-Forwarded-For`,
/// depois `X-Real-IP`, depois o socket.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or(real_ip)
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

pub(crate) fn peer_addr(request: &Request) -> Option<SocketAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}

// Roda antes da autenticação: pedido barrado aqui nunca chega ao guard
pub async fn rate_limit(
    State(limiter): State<Arc<IpRateLimiter>>,
    mut request: Request,
    next: Next,
) -> Response {
    let client = limiter.client_key(request.headers(), peer_addr(&request));

    if !limiter.check(&client) {
        tracing::warn!(client_ip = %client, path = %request.uri().path(), "Rate limit excedido");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": "Too many requests" })),
        )
            .into_response();
    }

    request.extensions_mut().insert(ClientIp(client));
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn burst_then_throttle() {
        let limiter = IpRateLimiter::new(60, 5);
        let now = Instant::now();

        for _ in 0..5 {
            assert!(limiter.check_at("10.0.0.1", now));
        }
        assert!(!limiter.check_at("10.0.0.1", now));
    }

    #[test]
    fn tokens_refill_over_time() {
        let limiter = IpRateLimiter::new(60, 1);
        let now = Instant::now();

        assert!(limiter.check_at("10.0.0.1", now));
        assert!(!limiter.check_at("10.0.0.1", now + Duration::from_millis(500)));
        assert!(limiter.check_at("10.0.0.1", now + Duration::from_millis(1100)));
    }

    #[test]
    fn clients_are_independent() {
        let limiter = IpRateLimiter::new(60, 1);
        let now = Instant::now();

        assert!(limiter.check_at("10.0.0.1", now));
        assert!(!limiter.check_at("10.0.0.1", now));
        assert!(limiter.check_at("10.0.0.2", now));
    }

    #[test]
    fn idle_buckets_are_swept() {
        // 60/min com burst 1: um balde vazio enche de novo em 1s
        let limiter = IpRateLimiter::new(60, 1);
        let now = Instant::now() + Duration::from_secs(1);

        for i in 0..1000 {
            assert!(limiter.check_at(&format!("10.1.{}.{}", i / 256, i % 256), now));
        }
        assert_eq!(limiter.tracked_clients(), 1000);

        assert!(limiter.check_at("10.0.0.1", now + Duration::from_secs(2)));
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn draining_buckets_survive_the_sweep() {
        // burst 2 a 60/min: 2s para encher
        let limiter = IpRateLimiter::new(60, 2);
        let start = Instant::now() + Duration::from_secs(2);

        assert!(limiter.check_at("10.0.0.1", start));
        assert!(limiter.check_at("10.0.0.1", start));
        assert!(limiter.check_at("10.0.0.1", start + Duration::from_millis(1500)));

        assert!(limiter.check_at("10.0.0.2", start + Duration::from_secs(2)));
        assert_eq!(limiter.tracked_clients(), 2);

        // Recarregou só 1 dos 2 tokens desde o último uso
        assert!(limiter.check_at("10.0.0.1", start + Duration::from_secs(2)));
        assert!(!limiter.check_at("10.0.0.1", start + Duration::from_secs(2)));
    }

    #[test]
    fn forwarded_headers_are_ignored_unless_trusted() {
        let peer: SocketAddr = "192.168.1.9:4000".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7"));
        headers.insert("x-real-ip", HeaderValue::from_static("172.16.0.4"));

        let direct = IpRateLimiter::new(60, 1);
        assert_eq!(direct.client_key(&headers, Some(peer)), "192.168.1.9");
        assert_eq!(direct.client_key(&headers, None), "unknown");

        let proxied = IpRateLimiter::new(60, 1).trusting_proxy_headers(true);
        assert_eq!(proxied.client_key(&headers, Some(peer)), "203.0.113.7");
    }

    #[test]
    fn client_ip_prefers_forwarded_headers() {
        let peer: SocketAddr = "192.168.1.9:4000".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, Some(peer)), "192.168.1.9");
        assert_eq!(client_ip(&headers, None), "unknown");

        headers.insert("x-real-ip", HeaderValue::from_static("172.16.0.4"));
        assert_eq!(client_ip(&headers, Some(peer)), "172.16.0.4");

        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        assert_eq!(client_ip(&headers, Some(peer)), "203.0.113.7");
    }
}
