#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;

use partstock_api::{
    config::AppConfig,
    db,
    entities::{inventory, location, part, partner},
    events::{self, EventSender},
    handlers::AppServices,
    services::inventory::ReceiveStock,
    services::locations::CreateLocation,
    services::partners::CreatePartner,
    services::parts::CreatePart,
    AppState,
};

/// Harness that runs the full router against a throwaway SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _db_dir: TempDir,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let db_dir = tempfile::tempdir().expect("create temp dir for test database");
        let db_path = db_dir.path().join("partstock_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task = tokio::spawn(events::process_events(event_rx, Vec::new()));

        let services = AppServices::new(db_arc.clone(), event_sender.clone(), &cfg);
        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        let router = Router::new()
            .nest("/api/v1", partstock_api::api_v1_routes())
            .with_state(state.clone());

        Self {
            router,
            state,
            _db_dir: db_dir,
            _event_task: event_task,
        }
    }

    /// Send a JSON request against the router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Seed a part with all counters at zero.
    pub async fn seed_part(&self, name: &str) -> part::Model {
        self.state
            .services
            .parts
            .create_part(CreatePart {
                name: name.to_string(),
                alternate_name: None,
                description: None,
            })
            .await
            .expect("seed part for tests")
    }

    /// Seed a rack location.
    pub async fn seed_location(&self, rack: &str) -> location::Model {
        self.state
            .services
            .locations
            .create_location(CreateLocation {
                rack: rack.to_string(),
            })
            .await
            .expect("seed location for tests")
    }

    /// Seed a partner.
    pub async fn seed_partner(&self, name: &str, email: &str) -> partner::Model {
        self.state
            .services
            .partners
            .create_partner(CreatePartner {
                name: name.to_string(),
                email: email.to_string(),
            })
            .await
            .expect("seed partner for tests")
    }

    /// Seed a part, a rack, and a received lot in one go. Returns the part
    /// and inventory rows as they stand after the receipt.
    pub async fn seed_stock(
        &self,
        part_name: &str,
        rack: &str,
        poll: &str,
        qty: i32,
    ) -> (part::Model, inventory::Model) {
        let part = self.seed_part(part_name).await;
        let location = self.seed_location(rack).await;
        let receipt = self
            .state
            .services
            .inventory
            .receive(ReceiveStock {
                part_id: part.id,
                location_id: location.id,
                poll: poll.to_string(),
                qty,
                event_no: None,
                remarks: None,
            })
            .await
            .expect("seed stock for tests");
        (receipt.part, receipt.inventory)
    }

    /// Fetch a part row directly from the database.
    pub async fn part(&self, id: i32) -> part::Model {
        use sea_orm::EntityTrait;
        part::Entity::find_by_id(id)
            .one(self.state.db.as_ref())
            .await
            .expect("query part")
            .expect("part row exists")
    }

    /// Fetch an inventory row directly from the database.
    pub async fn inventory(&self, id: i32) -> inventory::Model {
        use sea_orm::EntityTrait;
        inventory::Entity::find_by_id(id)
            .one(self.state.db.as_ref())
            .await
            .expect("query inventory")
            .expect("inventory row exists")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

/// Decode a response body as JSON.
pub async fn response_json(response: axum::response::Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("response body bytes")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json response")
}
