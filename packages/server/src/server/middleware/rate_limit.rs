// Per-IP rate limiting for public routes using tower-governor
//
// The client IP comes from X-Forwarded-For / X-Real-IP / Forwarded when
// present, else the peer address. The server must be started with
// `into_make_service_with_connect_info::<SocketAddr>()`.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub struct RateLimit {
    pub per_second: u64,
    pub burst: u32,
}

impl RateLimit {
    /// `None` when either value is zero, which turns limiting off
    pub fn new(per_second: u64, burst: u32) -> Option<Self> {
        (per_second > 0 && burst > 0).then_some(Self { per_second, burst })
    }

    /// Time for one request of allowance to come back.
    ///
    /// The governor builder takes an interval, not a rate.
    pub fn replenish_interval(&self) -> Duration {
        Duration::from_nanos((1_000_000_000 / self.per_second).max(1))
    }
}

/// Wrap `router` in a per-IP limiter
pub fn rate_limited(router: Router, limit: RateLimit) -> Router {
    let Some(config) = GovernorConfigBuilder::default()
        .period(limit.replenish_interval())
        .burst_size(limit.burst)
        .key_extractor(SmartIpKeyExtractor)
        .use_headers()
        .finish()
    else {
        warn!(?limit, "Invalid rate limit configuration, public routes are unlimited");
        return router;
    };

    router.layer(GovernorLayer {
        config: Arc::new(config),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_disables_limiting() {
        assert!(RateLimit::new(0, 20).is_none());
        assert!(RateLimit::new(10, 0).is_none());
        assert!(RateLimit::new(10, 20).is_some());
    }

    #[test]
    fn interval_is_the_inverse_of_the_rate() {
        let limit = RateLimit::new(10, 20).unwrap();
        assert_eq!(limit.replenish_interval(), Duration::from_millis(100));

        let limit = RateLimit::new(1, 1).unwrap();
        assert_eq!(limit.replenish_interval(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn allowance_refills_at_the_configured_rate() {
        use axum::body::Body;
        use axum::http::{Request, StatusCode};
        use axum::routing::get;
        use tower::ServiceExt;

        let app = rate_limited(
            Router::new().route("/", get(|| async { "ok" })),
            RateLimit::new(10, 20).unwrap(),
        );

        async fn admitted(app: Router, count: usize) -> usize {
            let mut ok = 0;
            for _ in 0..count {
                let request = Request::get("/")
                    .header("x-forwarded-for", "1.2.3.4")
                    .body(Body::empty())
                    .unwrap();
                let response = app.clone().oneshot(request).await.unwrap();
                if response.status() == StatusCode::OK {
                    ok += 1;
                }
            }
            ok
        }

        assert_eq!(admitted(app.clone(), 20).await, 20);
        assert_eq!(admitted(app.clone(), 1).await, 0);

        // 10/s gives back roughly five requests in half a second
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(admitted(app, 5).await >= 3);
    }
}
