#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use inventory_api::{
    db::{self, DbConfig, DbPool},
    entities::device::Availability,
    events::{Event, EventSender},
    services::accounts::AccountClient,
    services::inventory::{InventoryService, NewDevice},
};
use rust_decimal::Decimal;
use serde_json::json;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Test harness: in-memory SQLite store, a wiremock stand-in for the
/// accounts service, and a wired-up inventory service.
pub struct TestHarness {
    pub db: Arc<DbPool>,
    pub service: InventoryService,
    pub accounts: MockServer,
    pub event_sender: EventSender,
    _event_rx: mpsc::Receiver<Event>,
}

impl TestHarness {
    /// Fresh database and accounts mock. With no pattern mounted, the
    /// accounts mock answers 404, i.e. "not configured".
    pub async fn new() -> Self {
        let config = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let pool = db::establish_connection_with_config(&config)
            .await
            .expect("Failed to create DB pool");
        db::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let db = Arc::new(pool);

        let accounts = MockServer::start().await;
        let client = Arc::new(
            AccountClient::new(accounts.uri(), Duration::from_secs(2))
                .expect("Failed to build accounts client"),
        );

        let (tx, rx) = mpsc::channel(64);
        let event_sender = EventSender::new(tx);

        let service = InventoryService::new(db.clone(), client, event_sender.clone());

        Self {
            db,
            service,
            accounts,
            event_sender,
            _event_rx: rx,
        }
    }

    /// Explicit "no pattern configured" answer.
    pub async fn mount_no_pattern(&self) {
        Mock::given(method("GET"))
            .and(path("/v1/id-patterns/active"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&self.accounts)
            .await;
    }

    /// Active device-id pattern for every organization the test touches.
    pub async fn mount_pattern(&self, prefix: &str, pattern_length: usize) {
        Mock::given(method("GET"))
            .and(path("/v1/id-patterns/active"))
            .and(query_param("patternType", "DEVICE_ID_PATTERN"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "prefix": prefix,
                "patternLength": pattern_length,
            })))
            .mount(&self.accounts)
            .await;
    }

    /// Accounts service falling over (hard failure, not "not configured").
    pub async fn mount_pattern_failure(&self) {
        Mock::given(method("GET"))
            .and(path("/v1/id-patterns/active"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&self.accounts)
            .await;
    }
}

/// Baseline device payload; tweak fields per test.
pub fn laptop(product_id: Option<&str>) -> NewDevice {
    NewDevice {
        device: "MacBook Pro 14".to_string(),
        provider: Some("Apple".to_string()),
        model: Some("A2779".to_string()),
        device_type: Some("laptop".to_string()),
        os: Some("macOS".to_string()),
        specifications: Some("M2 Pro, 16GB unified memory".to_string()),
        ram: Some("16GB".to_string()),
        availability: Availability::Available,
        product_id: product_id.map(str::to_string),
        price: Some(Decimal::new(199_900, 2)),
        date_of_purchase: NaiveDate::from_ymd_opt(2024, 1, 15),
        comments: None,
        accessory_type: None,
    }
}

pub fn monitor(product_id: Option<&str>) -> NewDevice {
    NewDevice {
        device: "UltraSharp 27".to_string(),
        provider: Some("Dell".to_string()),
        model: Some("U2723QE".to_string()),
        device_type: Some("monitor".to_string()),
        os: None,
        specifications: Some("27-inch 4K IPS".to_string()),
        ram: None,
        availability: Availability::Available,
        product_id: product_id.map(str::to_string),
        price: Some(Decimal::new(57_900, 2)),
        date_of_purchase: NaiveDate::from_ymd_opt(2023, 11, 2),
        comments: None,
        accessory_type: None,
    }
}
