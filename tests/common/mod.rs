#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use lafarge_api::{
    config::AppConfig,
    db,
    entities::{customer, deliveryman, invoice_item::ProductType, product, product_transaction, salesman},
    events::{self, EventSender},
    services::{
        inventory::CreateProductInput,
        invoice_items::NewInvoiceLine,
        invoicing::{CreateInvoiceInput, InvoiceDetail},
        master_data::{CreateCustomerInput, SpecialPriceInput, StaffInput},
    },
    AppState,
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

/// Application state over a fresh in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Like [`TestApp::new`] but lets the caller tweak configuration first.
    pub async fn with_config(tweak: impl FnOnce(&mut AppConfig)) -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // A single connection keeps every query on the same in-memory database.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        tweak(&mut cfg);

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(Arc::new(pool), cfg, event_sender);
        let router = lafarge_api::app_router(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
        }
    }

    pub fn db(&self) -> &db::DbPool {
        self.state.db.as_ref()
    }

    /// Send a request against the router.
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

    pub async fn seed_salesman(&self, code: &str, name: &str) -> salesman::Model {
        self.state
            .services
            .master_data
            .create_salesman(StaffInput {
                code: code.to_string(),
                name: name.to_string(),
            })
            .await
            .expect("seed salesman")
    }

    pub async fn seed_deliveryman(&self, code: &str, name: &str) -> deliveryman::Model {
        self.state
            .services
            .master_data
            .create_deliveryman(StaffInput {
                code: code.to_string(),
                name: name.to_string(),
            })
            .await
            .expect("seed deliveryman")
    }

    pub async fn seed_customer(
        &self,
        name: &str,
        salesman_id: Option<i32>,
        terms: Option<&str>,
    ) -> customer::Model {
        self.state
            .services
            .master_data
            .create_customer(CreateCustomerInput {
                name: name.to_string(),
                address: format!("{} Street", name),
                salesman_id,
                terms: terms.map(str::to_string),
                ..Default::default()
            })
            .await
            .expect("seed customer")
    }

    pub async fn seed_product(
        &self,
        name: &str,
        price: Decimal,
        quantity: Decimal,
        units_per_pack: i32,
    ) -> product::Model {
        self.state
            .services
            .inventory
            .create_product(CreateProductInput {
                name: name.to_string(),
                price,
                quantity,
                unit: Some("box".to_string()),
                units_per_pack,
                unit_per_box: 0,
                supplier: None,
                import_date: None,
                import_invoice_number: None,
                registration_code: None,
                expiry_date: None,
            })
            .await
            .expect("seed product")
    }

    pub async fn seed_special_price(&self, customer_id: i32, base_name: &str, price: Decimal) {
        self.state
            .services
            .master_data
            .set_special_price(
                customer_id,
                SpecialPriceInput {
                    product_base_name: base_name.to_string(),
                    special_price: price,
                },
            )
            .await
            .expect("seed special price");
    }

    /// Invoice with the given (product, quantity) lines, all normal.
    pub async fn seed_invoice(
        &self,
        number: &str,
        customer_id: i32,
        lines: &[(i32, Decimal)],
    ) -> InvoiceDetail {
        self.state
            .services
            .invoices
            .create_invoice(CreateInvoiceInput {
                number: Some(number.to_string()),
                customer_id,
                lines: lines
                    .iter()
                    .map(|(product_id, quantity)| line(*product_id, *quantity))
                    .collect(),
                ..Default::default()
            })
            .await
            .expect("seed invoice")
    }

    pub async fn product(&self, id: i32) -> product::Model {
        self.state
            .services
            .inventory
            .get_product(id)
            .await
            .expect("product exists")
    }

    /// Ledger entries of one product in insertion order.
    pub async fn ledger(&self, product_id: i32) -> Vec<product_transaction::Model> {
        product_transaction::Entity::find()
            .filter(product_transaction::Column::ProductId.eq(product_id))
            .order_by_asc(product_transaction::Column::Id)
            .all(self.db())
            .await
            .expect("load ledger")
    }

    /// Sum of the stock-moving ledger entries of one product.
    pub async fn ledger_sum(&self, product_id: i32) -> Decimal {
        self.ledger(product_id)
            .await
            .iter()
            .filter(|entry| !entry.is_memo)
            .map(|entry| entry.change)
            .sum()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

pub fn line(product_id: i32, quantity: Decimal) -> NewInvoiceLine {
    NewInvoiceLine {
        product_id,
        quantity,
        net_price: None,
        hide_nett: false,
        product_type: ProductType::Normal,
    }
}

pub async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("response body is json")
}
