//! Test harness with testcontainers for integration testing.
//!
//! One Postgres container is shared across all tests in a binary. It starts,
//! and migrations run, on the first test; later tests reuse it.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use kin_core::common::AdminUserId;
use kin_core::domains::auth::JwtService;
use kin_core::kernel::ServerDeps;
use kin_core::server::{build_app, AppOptions};
use sqlx::PgPool;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

pub const TEST_JWT_SECRET: &str = "test_secret_key";
pub const TEST_JWT_ISSUER: &str = "test_issuer";
pub const TEST_BASE_URL: &str = "https://kin.test";

/// Shared test infrastructure that persists across all tests.
struct SharedTestInfra {
    /// Connection URL without a database name
    server_url: String,
    db_url: String,
    // Keep the container alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
}

static SHARED_INFRA: OnceCell<SharedTestInfra> = OnceCell::const_new();

impl SharedTestInfra {
    async fn init() -> Result<Self> {
        // Run tests with: RUST_LOG=debug cargo test -- --ignored --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let postgres = Postgres::default()
            .with_tag("16")
            .with_cmd(["-c", "max_connections=200"])
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let pg_host = postgres.get_host().await?;
        let pg_port = postgres.get_host_port_ipv4(5432).await?;
        let server_url = format!("postgresql://postgres:postgres@{}:{}", pg_host, pg_port);
        let db_url = format!("{}/postgres", server_url);

        let pool = PgPool::connect(&db_url)
            .await
            .context("Failed to connect to Postgres for migrations")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;

        Ok(Self {
            server_url,
            db_url,
            _postgres: postgres,
        })
    }

    async fn get() -> &'static Self {
        SHARED_INFRA
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared test infrastructure")
            })
            .await
    }
}

/// Per-test context: a fresh pool over the shared database.
///
/// Tests share one database, so fixtures use unique slugs and emails
/// rather than relying on an empty table.
///
/// ```ignore
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// #[ignore] // Requires Docker
/// async fn my_test(ctx: &TestHarness) {
///     let admin = fixtures::create_admin(&ctx.db_pool, GlobalRole::Admin).await;
/// }
/// ```
pub struct TestHarness {
    pub db_pool: PgPool,
    pub deps: ServerDeps,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create test harness")
    }

    async fn teardown(self) {
        // Pool is dropped with the harness
    }
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        let infra = SharedTestInfra::get().await;
        Self::connect(&infra.db_url).await
    }

    /// Harness over a freshly migrated database of its own, for tests that
    /// count rows across the whole table (e.g. super admins).
    pub async fn isolated() -> Result<Self> {
        let infra = SharedTestInfra::get().await;
        let name = format!("kin_{}", uuid::Uuid::new_v4().simple());

        let admin_pool = PgPool::connect(&infra.db_url).await?;
        sqlx::query(&format!("CREATE DATABASE {}", name))
            .execute(&admin_pool)
            .await
            .context("Failed to create isolated database")?;
        admin_pool.close().await;

        let harness = Self::connect(&format!("{}/{}", infra.server_url, name)).await?;
        sqlx::migrate!("./migrations")
            .run(&harness.db_pool)
            .await
            .context("Failed to migrate isolated database")?;
        Ok(harness)
    }

    async fn connect(db_url: &str) -> Result<Self> {
        let db_pool = PgPool::connect(db_url)
            .await
            .context("Failed to connect to test database")?;

        let jwt_service = Arc::new(JwtService::new(TEST_JWT_SECRET, TEST_JWT_ISSUER.to_string()));
        let deps = ServerDeps::new(db_pool.clone(), jwt_service, TEST_BASE_URL.to_string());

        Ok(Self { db_pool, deps })
    }

    /// Full router without rate limiting
    pub fn app(&self) -> Router {
        build_app(self.deps.clone(), AppOptions::default())
    }

    /// Bearer header value for an admin user
    pub fn bearer(&self, user_id: AdminUserId, email: &str) -> String {
        let token = self
            .deps
            .jwt_service
            .create_token(user_id, email, chrono::Duration::hours(1))
            .expect("Failed to create token");
        format!("Bearer {}", token)
    }
}
