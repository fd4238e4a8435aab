//! Shared test utilities for studyweek integration tests.
//!
//! - [`TestDb`]: a freshly migrated database per test, created on one
//!   PostgreSQL server shared by the whole test binary. Set
//!   `STUDYWEEK_TEST_PG_URL` to use a running server; otherwise a container is
//!   started through testcontainers on first use.
//! - [`ScriptedProposer`], a deterministic plan proposer with per-date
//!   failure injection.
//! - [`fixtures`] for students, routines and day plans.

pub mod fixtures;
pub mod scripted;

pub use scripted::{ProposerCall, ScriptedProposer};

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

use studyweek_db::pool;

const TEST_PG_URL_ENV: &str = "STUDYWEEK_TEST_PG_URL";

/// Where test databases live.
enum PgServer {
    External(String),
    /// The handle keeps the container running for the life of the binary.
    Container {
        root_url: String,
        _handle: ContainerAsync<Postgres>,
    },
}

impl PgServer {
    async fn start() -> Self {
        if let Ok(url) = std::env::var(TEST_PG_URL_ENV) {
            return Self::External(url.trim_end_matches('/').to_owned());
        }

        let handle = Postgres::default()
            .with_tag("18")
            .start()
            .await
            .expect("failed to start PostgreSQL container");
        let host = handle.get_host().await.expect("container host");
        let port = handle
            .get_host_port_ipv4(5432)
            .await
            .expect("container port");

        Self::Container {
            root_url: format!("postgresql://postgres:postgres@{host}:{port}"),
            _handle: handle,
        }
    }

    fn root_url(&self) -> &str {
        match self {
            Self::External(url) => url,
            Self::Container { root_url, .. } => root_url,
        }
    }

    async fn connect(&self, database: &str, max_connections: u32) -> PgPool {
        let url = format!("{}/{database}", self.root_url());
        PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&url)
            .await
            .unwrap_or_else(|e| panic!("failed to connect to {database}: {e}"))
    }

    /// Run one administrative statement against the `postgres` database.
    async fn admin(&self, statement: &str) -> Result<(), sqlx::Error> {
        let admin = self.connect("postgres", 1).await;
        let result = admin.execute(statement).await.map(|_| ());
        admin.close().await;
        result
    }
}

static SERVER: OnceCell<PgServer> = OnceCell::const_new();

async fn server() -> &'static PgServer {
    SERVER.get_or_init(PgServer::start).await
}

/// A migrated database private to one test.
///
/// ```ignore
/// let db = TestDb::create().await;
/// let pool = db.pool().clone();
/// // ...
/// db.teardown().await;
/// ```
pub struct TestDb {
    pool: PgPool,
    name: String,
}

impl TestDb {
    /// Create `studyweek_test_<uuid>` and apply every engine migration.
    pub async fn create() -> Self {
        let server = server().await;
        let name = format!("studyweek_test_{}", Uuid::new_v4().simple());

        server
            .admin(&format!("CREATE DATABASE {name}"))
            .await
            .unwrap_or_else(|e| panic!("failed to create {name}: {e}"));

        let pool = server.connect(&name, 5).await;
        pool::run_migrations(&pool)
            .await
            .expect("engine migrations should apply to an empty database");

        Self { pool, name }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close every connection handed out by this database's pool and drop it.
    pub async fn teardown(self) {
        self.pool.close().await;
        let server = server().await;
        let _ = server
            .admin(&format!(
                "SELECT pg_terminate_backend(pid) FROM pg_stat_activity \
                 WHERE datname = '{}' AND pid <> pg_backend_pid()",
                self.name
            ))
            .await;
        let _ = server
            .admin(&format!("DROP DATABASE IF EXISTS {}", self.name))
            .await;
    }
}
