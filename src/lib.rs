//! Lafarge API Library
//!
//! Invoicing, inventory ledger and sales reporting for a pharmaceutical
//! distributor: products and stock, customers with special prices, invoices
//! whose lines move stock, and salesman commission reports.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod services;

use axum::{
    response::Json,
    routing::{delete, get, patch, post},
    Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: events::EventSender,
    ) -> Self {
        let services = handlers::AppServices::new(db.clone(), event_sender.clone(), &config);
        Self {
            db,
            config,
            event_sender,
            services,
        }
    }
}

// Common response wrappers
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total.div_ceil(limit)
        };
        Self {
            items,
            total,
            page,
            limit,
            total_pages,
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

pub fn api_v1_routes() -> Router<AppState> {
    use handlers::{customers, health, invoices, products, reports, staff};

    let products = Router::new()
        .route(
            "/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/products/:id",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/products/:id/copy", post(products::copy_product))
        .route("/products/:id/restock", post(products::restock_product))
        .route(
            "/products/:id/transactions",
            get(products::product_transactions),
        )
        .route("/transactions", get(products::list_transactions));

    let customers = Router::new()
        .route(
            "/customers",
            get(customers::list_customers).post(customers::create_customer),
        )
        .route("/customers/search", get(customers::search_customers))
        .route(
            "/customers/:id",
            get(customers::get_customer)
                .put(customers::update_customer)
                .delete(customers::delete_customer),
        )
        .route(
            "/customers/:id/special-prices",
            get(customers::list_special_prices).post(customers::create_special_price),
        )
        .route(
            "/special-prices/base-names",
            get(customers::special_price_base_names),
        )
        .route(
            "/special-prices/:id",
            axum::routing::put(customers::update_special_price)
                .delete(customers::delete_special_price),
        );

    let staff = Router::new()
        .route(
            "/salesmen",
            get(staff::list_salesmen).post(staff::create_salesman),
        )
        .route(
            "/salesmen/:id",
            get(staff::get_salesman).put(staff::update_salesman),
        )
        .route(
            "/deliverymen",
            get(staff::list_deliverymen).post(staff::create_deliveryman),
        )
        .route(
            "/deliverymen/:id",
            get(staff::get_deliveryman).put(staff::update_deliveryman),
        );

    let invoices = Router::new()
        .route(
            "/invoices",
            get(invoices::list_invoices).post(invoices::create_invoice),
        )
        .route("/invoices/next-number", get(invoices::next_number))
        .route("/invoices/delivery", patch(invoices::update_delivery))
        .route("/invoices/payment", patch(invoices::update_payment))
        .route(
            "/invoices/by-number/:number/copy",
            post(invoices::copy_invoice),
        )
        .route(
            "/invoices/:id",
            get(invoices::get_invoice)
                .put(invoices::update_invoice)
                .delete(invoices::delete_invoice),
        )
        .route("/invoices/:id/items", post(invoices::add_line))
        .route(
            "/invoice-items/:id",
            axum::routing::put(invoices::update_line).delete(invoices::delete_line),
        )
        .route(
            "/invoices/:id/additional-items",
            post(invoices::add_additional_item),
        )
        .route(
            "/additional-items/:id",
            delete(invoices::remove_additional_item),
        );

    let reports = Router::new()
        .route(
            "/reports/salesmen/:id/months",
            get(reports::salesman_months),
        )
        .route(
            "/reports/salesmen/:id/:year/:month",
            get(reports::salesman_report),
        )
        .route(
            "/reports/commissions/:year/:month",
            get(reports::commissions),
        )
        .route(
            "/reports/products/:year/:month",
            get(reports::product_analysis),
        )
        .route("/reports/unpaid", get(reports::unpaid))
        .route("/reports/payments/:year/:month", get(reports::payments))
        .route(
            "/reports/deliverymen/:id/:year/:month",
            get(reports::deliveryman_report),
        );

    Router::new()
        .route("/health", get(health::health))
        .merge(products)
        .merge(customers)
        .merge(staff)
        .merge(invoices)
        .merge(reports)
}

/// Root router with the v1 API mounted and HTTP tracing applied.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .nest("/api/v1", api_v1_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn success_response_carries_timestamp() {
        let response = ApiResponse::success("ok");
        assert!(response.success);
        let meta = response.meta.expect("metadata expected");
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[test]
    fn error_response_has_no_data() {
        let response = ApiResponse::<()>::error("oops".into());
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.message.as_deref(), Some("oops"));
    }

    #[test]
    fn total_pages_round_up() {
        let page = PaginatedResponse::new(vec![1, 2], 41, 1, 20);
        assert_eq!(page.total_pages, 3);
        let empty: PaginatedResponse<i32> = PaginatedResponse::new(vec![], 0, 1, 20);
        assert_eq!(empty.total_pages, 0);
    }
}
