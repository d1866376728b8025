#![allow(dead_code)]
use ctor::dtor;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{
    env,
    sync::{Mutex, OnceLock},
    time::Duration,
};
use telemetry_sink::{config::DatabaseConfig, db::DriverKind};
use testcontainers::{clients::Cli, core::WaitFor, Container, GenericImage, RunnableImage};
use uuid::Uuid;

const SCHEMA: &str = include_str!("../fixtures/schema.sql");
const TEST_USER: &str = "sink_test";
const TEST_PASSWORD: &str = "sink_test";

static TESTCONTAINERS_DOCKER: OnceLock<&'static Cli> = OnceLock::new();
static TESTCONTAINERS_PG: OnceLock<Mutex<Option<Container<'static, GenericImage>>>> =
    OnceLock::new();
static TESTCONTAINERS_PORT: OnceLock<u16> = OnceLock::new();

#[dtor]
fn shutdown_testcontainer_postgres() {
    if let Some(holder) = TESTCONTAINERS_PG.get() {
        if let Ok(mut guard) = holder.lock() {
            guard.take();
        }
    }
}

fn postgres_port() -> u16 {
    *TESTCONTAINERS_PORT.get_or_init(|| {
        let docker = TESTCONTAINERS_DOCKER.get_or_init(|| Box::leak(Box::new(Cli::default())));
        let image_ref = env::var("TESTCONTAINERS_POSTGRES_IMAGE")
            .unwrap_or_else(|_| "postgres:15-alpine".to_string());
        let (image_name, image_tag) = image_ref
            .split_once(':')
            .unwrap_or((image_ref.as_str(), "latest"));
        let image = GenericImage::new(image_name, image_tag)
            .with_env_var("POSTGRES_USER", TEST_USER)
            .with_env_var("POSTGRES_PASSWORD", TEST_PASSWORD)
            .with_env_var("POSTGRES_DB", "postgres")
            .with_wait_for(WaitFor::message_on_stderr(
                "database system is ready to accept connections",
            ));
        let container = docker.run(RunnableImage::from(image));
        let port = container.get_host_port_ipv4(5432);
        let holder = TESTCONTAINERS_PG.get_or_init(|| Mutex::new(None));
        *holder.lock().expect("lock testcontainers postgres") = Some(container);
        eprintln!("--- Testcontainers Postgres started on port {} ---", port);
        port
    })
}

async fn connect_with_retry(url: &str) -> PgPool {
    let mut last_error = None;
    for _ in 0..30 {
        match PgPoolOptions::new().max_connections(5).connect(url).await {
            Ok(pool) => return pool,
            Err(err) => {
                last_error = Some(err);
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }
    }
    panic!("postgres did not become ready: {:?}", last_error);
}

/// A freshly created database holding the three telemetry tables.
pub struct TestDatabase {
    pub config: DatabaseConfig,
    pub pool: PgPool,
}

pub async fn fresh_database() -> TestDatabase {
    let port = postgres_port();
    let admin_url = format!(
        "postgres://{}:{}@127.0.0.1:{}/postgres",
        TEST_USER, TEST_PASSWORD, port
    );
    let admin = connect_with_retry(&admin_url).await;

    let name = format!("sink_{}", Uuid::new_v4().simple());
    sqlx::query(&format!("CREATE DATABASE \"{}\"", name))
        .execute(&admin)
        .await
        .expect("create test database");
    admin.close().await;

    let url = format!(
        "postgres://{}:{}@127.0.0.1:{}/{}",
        TEST_USER, TEST_PASSWORD, port, name
    );
    let pool = connect_with_retry(&url).await;
    sqlx::raw_sql(SCHEMA)
        .execute(&pool)
        .await
        .expect("apply schema");

    TestDatabase {
        config: DatabaseConfig {
            host: "127.0.0.1".into(),
            port,
            username: TEST_USER.into(),
            password: TEST_PASSWORD.into(),
            database: name,
            driver: DriverKind::Pooled,
            max_connections: 5,
            connect_timeout_secs: 10,
        },
        pool,
    }
}

pub async fn count_rows(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .expect("count rows")
}
