mod health;
mod metrics;
mod contact;
mod limits;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::state::AppState;

use health::health_handler;
use metrics::metrics_handler;
use contact::contact_handler;
use limits::remaining_handler;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/contact", post(contact_handler))
        .route("/api/rate-limit", get(remaining_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ForwardJob;
    use crate::rate_limit::{RateLimitConfig, RateLimiter};
    use axum::{
        body::Body,
        extract::ConnectInfo,
        http::{Request, StatusCode, header},
    };
    use std::net::SocketAddr;
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    const BODY: &str = r#"{"name":"Ada","email":"ada@example.com","subject":"Logo","message":"Need a logo"}"#;

    // Router behind a trusted proxy plus the receiving end of its forward queue
    fn test_app(max_requests: u32) -> (Router, Arc<RateLimiter>, mpsc::Receiver<ForwardJob>) {
        app_with_proxy(max_requests, true)
    }

    fn app_with_proxy(
        max_requests: u32,
        trust_proxy_headers: bool,
    ) -> (Router, Arc<RateLimiter>, mpsc::Receiver<ForwardJob>) {
        let limiter = Arc::new(RateLimiter::new(RateLimitConfig {
            max_requests,
            window: Duration::from_secs(60),
            block_duration: Duration::from_secs(3600),
        }));
        let (forward_tx, forward_rx) = mpsc::channel(16);
        let state = Arc::new(AppState {
            rate_limiter: Arc::clone(&limiter),
            forward_tx,
            trust_proxy_headers,
        });
        (router(state), limiter, forward_rx)
    }

    fn accept_all(mut rx: mpsc::Receiver<ForwardJob>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                assert_eq!(job.row.name, "Ada");
                let _ = job.response_tx.send(Ok(()));
            }
        })
    }

    fn contact(body: &str, ip: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/contact")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-real-ip", ip)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json(res: axum::response::Response) -> serde_json::Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let (app, _, _rx) = test_app(10);
        let res = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json(res).await["status"], "healthy");
    }

    #[tokio::test]
    async fn accepted_submission_is_forwarded() {
        let (app, limiter, rx) = test_app(3);
        let worker = accept_all(rx);

        let res = app.oneshot(contact(BODY, "198.51.100.4")).await.unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body = json(res).await;
        assert_eq!(body["status"], "received");
        assert_eq!(body["remaining"], 2);
        assert_eq!(limiter.remaining("198.51.100.4"), 2);

        worker.abort();
    }

    #[tokio::test]
    async fn over_limit_gets_429_and_stays_blocked() {
        let (app, limiter, rx) = test_app(2);
        let worker = accept_all(rx);
        let ip = "203.0.113.9";

        for _ in 0..2 {
            let res = app.clone().oneshot(contact(BODY, ip)).await.unwrap();
            assert_eq!(res.status(), StatusCode::CREATED);
        }

        let res = app.clone().oneshot(contact(BODY, ip)).await.unwrap();
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(res.headers()[header::RETRY_AFTER], "3600");
        assert_eq!(json(res).await["remaining"], 0);

        let res = app.clone().oneshot(contact(BODY, ip)).await.unwrap();
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);

        // another client is unaffected
        let res = app.oneshot(contact(BODY, "203.0.113.10")).await.unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(limiter.remaining(ip), 0);

        worker.abort();
    }

    #[tokio::test]
    async fn invalid_body_counts_against_limit() {
        let (app, limiter, _rx) = test_app(5);
        let bad = r#"{"name":"","email":"ada@example.com","message":"hi"}"#;

        let res = app.oneshot(contact(bad, "192.0.2.1")).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(limiter.remaining("192.0.2.1"), 4);
    }

    #[tokio::test]
    async fn upstream_failure_maps_to_bad_gateway() {
        let (app, _, mut rx) = test_app(5);
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                let _ = job
                    .response_tx
                    .send(Err(crate::error::GatewayError::Upstream("500".into())));
            }
        });

        let res = app.oneshot(contact(BODY, "192.0.2.2")).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn closed_queue_is_service_unavailable() {
        let (app, _, rx) = test_app(5);
        drop(rx);

        let res = app.oneshot(contact(BODY, "192.0.2.3")).await.unwrap();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn remaining_endpoint_does_not_consume() {
        let (app, limiter, _rx) = test_app(10);
        limiter.check("192.0.2.4");

        for _ in 0..3 {
            let req = Request::get("/api/rate-limit")
                .header("x-forwarded-for", "10.0.0.1, 192.0.2.4")
                .body(Body::empty())
                .unwrap();
            let res = app.clone().oneshot(req).await.unwrap();
            assert_eq!(res.status(), StatusCode::OK);
            let body = json(res).await;
            assert_eq!(body["client"], "192.0.2.4");
            assert_eq!(body["remaining"], 9);
            assert_eq!(body["limit"], 10);
        }
    }

    #[tokio::test]
    async fn rotating_headers_do_not_bypass_limit_without_trusted_proxy() {
        let (app, limiter, rx) = app_with_proxy(2, false);
        let worker = accept_all(rx);
        let peer: SocketAddr = "192.0.2.50:40000".parse().unwrap();

        let mut statuses = Vec::new();
        for i in 0..5 {
            let mut req = contact(BODY, &format!("198.51.100.{}", i));
            req.headers_mut().insert(
                "x-forwarded-for",
                format!("203.0.113.{}", i).parse().unwrap(),
            );
            req.extensions_mut().insert(ConnectInfo(peer));
            statuses.push(app.clone().oneshot(req).await.unwrap().status());
        }

        assert_eq!(statuses[..2], [StatusCode::CREATED, StatusCode::CREATED]);
        assert!(statuses[2..].iter().all(|s| *s == StatusCode::TOO_MANY_REQUESTS));
        assert_eq!(limiter.len(), 1);
        assert_eq!(limiter.remaining("192.0.2.50"), 0);

        worker.abort();
    }

    #[tokio::test]
    async fn retry_after_counts_down_from_block_start() {
        let (app, _, rx) = test_app(1);
        let worker = accept_all(rx);
        let ip = "203.0.113.20";

        assert_eq!(app.clone().oneshot(contact(BODY, ip)).await.unwrap().status(), StatusCode::CREATED);
        let res = app.clone().oneshot(contact(BODY, ip)).await.unwrap();
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        let first: u64 = res.headers()[header::RETRY_AFTER].to_str().unwrap().parse().unwrap();
        assert!((3599..=3600).contains(&first));

        tokio::time::sleep(Duration::from_millis(1100)).await;
        let res = app.oneshot(contact(BODY, ip)).await.unwrap();
        let later: u64 = res.headers()[header::RETRY_AFTER].to_str().unwrap().parse().unwrap();
        assert!(later < first);

        worker.abort();
    }

    #[tokio::test]
    async fn missing_content_type_keeps_415() {
        let (app, limiter, _rx) = test_app(5);
        let req = Request::builder()
            .method("POST")
            .uri("/api/contact")
            .header("x-real-ip", "192.0.2.60")
            .body(Body::from(BODY))
            .unwrap();

        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(limiter.remaining("192.0.2.60"), 4);
    }
}
