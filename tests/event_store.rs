//! End-to-end tests against a real PostgreSQL database.
//!
//! Set `AUDIT_TEST_DATABASE_URL` to run them; otherwise every test returns
//! immediately. Each test migrates and uses its own throwaway schema.

#![allow(clippy::panic, missing_docs)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use chrono::{DateTime, TimeZone, Utc};
use rand::Rng;
use sqlx::{Connection, PgConnection};
use tempfile::NamedTempFile;
use tower::util::ServiceExt;

use audit_svc::api::build_router;
use audit_svc::app_state::AppState;
use audit_svc::config::PostgresSettings;
use audit_svc::domain::{EventId, NewAuditEvent, NoFaults, ResourceBundle, SharedState};
use audit_svc::persistence::postgres::INSERT_CHUNK;
use audit_svc::persistence::{DatabasePool, migrations};
use audit_svc::service::{EventService, PageRequest, ReloadService};
use audit_svc::telemetry::MetricsHandle;

struct TestDb {
    base_dsn: String,
    schema: String,
    settings: PostgresSettings,
}

impl TestDb {
    async fn setup() -> Option<Self> {
        let base_dsn = std::env::var("AUDIT_TEST_DATABASE_URL").ok()?;
        let schema = format!("audit_test_{}", rand::rng().random::<u32>());
        let separator = if base_dsn.contains('?') { '&' } else { '?' };
        let dsn = format!("{base_dsn}{separator}options=-c%20search_path%3D{schema}");

        let Ok(mut admin) = PgConnection::connect(&base_dsn).await else {
            panic!("cannot connect to AUDIT_TEST_DATABASE_URL");
        };
        let Ok(_) = sqlx::raw_sql(&format!("CREATE SCHEMA {schema}"))
            .execute(&mut admin)
            .await
        else {
            panic!("create schema");
        };

        let Ok(available) = migrations::load_migrations(Path::new("migrations")).await else {
            panic!("load migrations");
        };
        let Ok(mut conn) = PgConnection::connect(&dsn).await else {
            panic!("connect to test schema");
        };
        let Ok(applied) = migrations::run(&mut conn, &available).await else {
            panic!("run migrations");
        };
        assert_eq!(applied, available.len());

        let Ok(again) = migrations::run(&mut conn, &available).await else {
            panic!("rerun migrations");
        };
        assert_eq!(again, 0, "migrations must not be applied twice");

        Some(Self {
            base_dsn,
            schema,
            settings: PostgresSettings {
                dsn,
                max_connections: 4,
                ..PostgresSettings::default()
            },
        })
    }

    async fn service(&self) -> (EventService, Arc<SharedState>) {
        let Ok(pool) = DatabasePool::open(&self.settings).await else {
            panic!("open pool");
        };
        let shared = Arc::new(SharedState::new(ResourceBundle::new(pool)));
        (
            EventService::new(Arc::clone(&shared), Arc::new(NoFaults)),
            shared,
        )
    }

    async fn execute(&self, sql: &str) {
        let Ok(mut conn) = PgConnection::connect(&self.settings.dsn).await else {
            panic!("connect to test schema");
        };
        let Ok(_) = sqlx::raw_sql(sql).execute(&mut conn).await else {
            panic!("execute: {sql}");
        };
    }

    fn config_file(&self) -> NamedTempFile {
        let Ok(mut file) = NamedTempFile::new() else {
            panic!("tempfile");
        };
        let yaml = format!(
            "postgres:\n  dsn: '{}'\n  max_connections: 4\n  min_connections: 1\n",
            self.settings.dsn
        );
        let Ok(()) = file.write_all(yaml.as_bytes()) else {
            panic!("write config");
        };
        file
    }

    async fn teardown(self) {
        if let Ok(mut admin) = PgConnection::connect(&self.base_dsn).await {
            let _ = sqlx::raw_sql(&format!("DROP SCHEMA {} CASCADE", self.schema))
                .execute(&mut admin)
                .await;
        }
    }
}

fn ts(secs: i64) -> DateTime<Utc> {
    match Utc.timestamp_opt(secs, 0).single() {
        Some(t) => t,
        None => panic!("timestamp"),
    }
}

fn event(secs: i64, app: &str, kind: &str) -> NewAuditEvent {
    NewAuditEvent {
        event_ts: ts(secs),
        application_name: app.to_string(),
        event_kind: kind.to_string(),
        payload: serde_json::json!({ "u": "x" }),
    }
}

fn first_page(page_size: i64) -> PageRequest {
    PageRequest {
        page_size,
        page_token: None,
    }
}

#[tokio::test]
async fn append_then_list_returns_reverse_insertion_order() {
    let Some(db) = TestDb::setup().await else {
        return;
    };
    let (svc, shared) = db.service().await;

    let batch: Vec<NewAuditEvent> = (0..5)
        .map(|i| event(1_700_000_000 + i, "a", &format!("Kind{i}")))
        .collect();
    let Ok(inserted) = svc.append(batch.clone()).await else {
        panic!("append");
    };
    assert_eq!(inserted, 5);

    let Ok(page) = svc.list(first_page(10)).await else {
        panic!("list");
    };
    let kinds: Vec<&str> = page.events.iter().map(|e| e.event_kind.as_str()).collect();
    assert_eq!(kinds, vec!["Kind4", "Kind3", "Kind2", "Kind1", "Kind0"]);
    assert!(page.events.windows(2).all(|w| match w {
        [a, b] => a.event_id > b.event_id,
        _ => true,
    }));
    assert_eq!(
        page.events.first().map(|e| e.payload.clone()),
        Some(serde_json::json!({ "u": "x" }))
    );
    assert_eq!(page.next_page, page.events.last().map(|e| e.event_id));

    shared.close().await;
    db.teardown().await;
}

#[tokio::test]
async fn keyset_pages_are_disjoint_and_below_cursor() {
    let Some(db) = TestDb::setup().await else {
        return;
    };
    let (svc, shared) = db.service().await;

    let batch: Vec<NewAuditEvent> = (0..6).map(|i| event(i, "a", "UserLogin")).collect();
    let Ok(_) = svc.append(batch).await else {
        panic!("append");
    };

    let Ok(first) = svc.list(first_page(2)).await else {
        panic!("first page");
    };
    let Some(token) = first.next_page else {
        panic!("missing cursor");
    };

    // Inserts between pages must not shift the cursor.
    let Ok(_) = svc.append(vec![event(99, "a", "UserLogout")]).await else {
        panic!("append between pages");
    };

    let Ok(second) = svc
        .list(PageRequest {
            page_size: 2,
            page_token: Some(token),
        })
        .await
    else {
        panic!("second page");
    };

    assert_eq!(second.events.len(), 2);
    assert!(second.events.iter().all(|e| e.event_id < token));
    assert!(
        second
            .events
            .iter()
            .all(|e| first.events.iter().all(|f| f.event_id != e.event_id))
    );

    shared.close().await;
    db.teardown().await;
}

#[tokio::test]
async fn login_logout_walkthrough() {
    let Some(db) = TestDb::setup().await else {
        return;
    };
    let (svc, shared) = db.service().await;

    let batch = vec![
        event(1_000, "a", "UserLogin"),
        event(2_000, "a", "UserLogout"),
    ];
    let Ok(_) = svc.append(batch).await else {
        panic!("append");
    };

    let Ok(page) = svc.list(first_page(1)).await else {
        panic!("first page");
    };
    let Some(logout) = page.events.first() else {
        panic!("empty first page");
    };
    assert_eq!(logout.event_kind, "UserLogout");
    assert_eq!(page.next_page, Some(logout.event_id));

    let Ok(all) = svc.list(first_page(2)).await else {
        panic!("full listing");
    };
    let login_id = all.events.last().map(|e| e.event_id);

    let Ok(page) = svc
        .list(PageRequest {
            page_size: 1,
            page_token: login_id,
        })
        .await
    else {
        panic!("page below login");
    };
    assert!(page.events.is_empty());
    assert_eq!(page.next_page, None);

    let Ok(page) = svc
        .list(PageRequest {
            page_size: 1,
            page_token: Some(logout.event_id),
        })
        .await
    else {
        panic!("second page");
    };
    assert_eq!(
        page.events.first().map(|e| e.event_kind.as_str()),
        Some("UserLogin")
    );
    assert_eq!(page.events.first().map(|e| e.event_id), login_id);

    shared.close().await;
    db.teardown().await;
}

#[tokio::test]
async fn invalid_event_rejects_whole_batch() {
    let Some(db) = TestDb::setup().await else {
        return;
    };
    let (svc, shared) = db.service().await;

    let mut batch = vec![event(1, "a", "UserLogin")];
    batch.push(NewAuditEvent {
        application_name: "x".repeat(127),
        ..event(2, "a", "UserLogin")
    });
    assert!(svc.append(batch).await.is_err());

    let Ok(page) = svc.list(first_page(10)).await else {
        panic!("list");
    };
    assert!(page.events.is_empty());

    shared.close().await;
    db.teardown().await;
}

#[tokio::test]
async fn database_failure_rolls_back_every_chunk() {
    let Some(db) = TestDb::setup().await else {
        return;
    };
    db.execute("ALTER TABLE audit_event ADD CONSTRAINT no_bad CHECK (event_kind <> 'Bad')")
        .await;
    let (svc, shared) = db.service().await;

    let Ok(rows) = i64::try_from(INSERT_CHUNK + 500) else {
        panic!("chunk size");
    };
    let mut batch: Vec<NewAuditEvent> = (0..rows).map(|i| event(i, "a", "UserLogin")).collect();
    batch.push(event(rows, "a", "Bad"));

    let result = svc.append(batch).await;
    assert!(matches!(result, Err(audit_svc::error::AuditError::Database(_))));

    let Ok(page) = svc.list(first_page(10)).await else {
        panic!("list");
    };
    assert!(page.events.is_empty());
    assert_eq!(page.next_page, None);

    shared.close().await;
    db.teardown().await;
}

#[tokio::test]
async fn large_batch_lists_in_insertion_order() {
    let Some(db) = TestDb::setup().await else {
        return;
    };
    let (svc, shared) = db.service().await;

    let total = INSERT_CHUNK * 2 + 500;
    let batch: Vec<NewAuditEvent> = (0..total)
        .map(|i| event(0, "a", &format!("Kind{i}")))
        .collect();
    let Ok(inserted) = svc.append(batch).await else {
        panic!("append");
    };
    assert_eq!(usize::try_from(inserted).ok(), Some(total));

    let Ok(page) = svc.list(first_page(3)).await else {
        panic!("list");
    };
    let kinds: Vec<String> = page.events.iter().map(|e| e.event_kind.clone()).collect();
    let expected: Vec<String> = (1..=3).map(|n| format!("Kind{}", total - n)).collect();
    assert_eq!(kinds, expected);

    shared.close().await;
    db.teardown().await;
}

#[tokio::test]
async fn metrics_count_inserted_events_per_application() {
    let Some(db) = TestDb::setup().await else {
        return;
    };
    let Ok(metrics) = MetricsHandle::install() else {
        panic!("install recorder");
    };
    let (svc, shared) = db.service().await;

    let batch = vec![
        event(1, "alpha", "UserLogin"),
        event(2, "alpha", "UserLogout"),
        event(3, "beta", "UserCreated"),
    ];
    let Ok(_) = svc.append(batch).await else {
        panic!("append");
    };

    let rendered = metrics.render();
    assert!(
        rendered.contains(r#"events_inserted{application="alpha"} 2"#),
        "{rendered}"
    );
    assert!(
        rendered.contains(r#"events_inserted{application="beta"} 1"#),
        "{rendered}"
    );

    shared.close().await;
    db.teardown().await;
}

#[tokio::test]
async fn reload_races_appends_without_losing_them() {
    let Some(db) = TestDb::setup().await else {
        return;
    };
    let config = db.config_file();
    let (svc, shared) = db.service().await;
    let reloader = ReloadService::new(Arc::clone(&shared), config.path().to_path_buf());

    for i in 0..3 {
        let append = svc.append(vec![event(i, "a", "UserLogin")]);
        let (appended, reloaded) = tokio::join!(append, reloader.reload());
        let Ok(1) = appended else {
            panic!("append during reload: {appended:?}");
        };
        let Ok(()) = reloaded else {
            panic!("reload: {reloaded:?}");
        };
    }

    assert!(shared.read().await.pool.is_open());
    let Ok(page) = svc.list(first_page(10)).await else {
        panic!("list after reloads");
    };
    assert_eq!(page.events.len(), 3);

    shared.close().await;
    shared.close().await;
    db.teardown().await;
}

#[tokio::test]
async fn reload_endpoint_swaps_in_working_pool() {
    let Some(db) = TestDb::setup().await else {
        return;
    };
    let config = db.config_file();
    let (_, shared) = db.service().await;
    let state = AppState::new(
        Arc::clone(&shared),
        Arc::new(NoFaults),
        PathBuf::from(config.path()),
        MetricsHandle::detached(),
    );
    let router = build_router().with_state(state);

    let send = |method: Method, uri: &str, body: &str| {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from(body.to_string()));
        let router = router.clone();
        async move {
            let Ok(request) = request else {
                panic!("request build");
            };
            let Ok(response) = router.oneshot(request).await else {
                panic!("router error");
            };
            response.status()
        }
    };

    assert_eq!(send(Method::POST, "/reload", "").await, StatusCode::CREATED);
    let body = r#"[{"event_ts":"2024-05-01T10:00:00Z","application_name":"a","event_kind":"UserLogin","payload":{"u":"x"}}]"#;
    assert_eq!(
        send(Method::POST, "/api/event", body).await,
        StatusCode::CREATED
    );
    assert_eq!(
        send(Method::GET, "/api/event?page_size=1", "").await,
        StatusCode::OK
    );

    shared.close().await;
    db.teardown().await;
}

#[tokio::test]
async fn swap_during_inflight_read_keeps_both_pools_usable() {
    let Some(db) = TestDb::setup().await else {
        return;
    };
    let (svc, shared) = db.service().await;

    let scope = shared.read().await;
    let Ok(mut tx) = scope.pool.begin().await else {
        panic!("begin on old pool");
    };

    let Ok(next_pool) = DatabasePool::open(&db.settings).await else {
        panic!("open next pool");
    };
    let writer = {
        let shared = Arc::clone(&shared);
        tokio::spawn(async move { shared.write(ResourceBundle::new(next_pool)).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!writer.is_finished());

    let Ok(one) = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&mut *tx)
        .await
    else {
        panic!("old pool stopped working mid-scope");
    };
    assert_eq!(one, 1);
    let Ok(()) = tx.commit().await else {
        panic!("commit");
    };
    drop(scope);

    let Ok(()) = writer.await else {
        panic!("writer");
    };

    let Ok(_) = svc.append(vec![event(5, "b", "UserCreated")]).await else {
        panic!("append on new pool");
    };
    let Ok(page) = svc.list(first_page(1)).await else {
        panic!("list on new pool");
    };
    assert_eq!(page.events.len(), 1);
    assert!(page.next_page > Some(EventId::new(0)));

    shared.close().await;
    shared.close().await;
    db.teardown().await;
}
