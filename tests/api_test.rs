mod common;

use std::str::FromStr;

use axum::http::{Method, StatusCode};
use common::{json_body, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("not a decimal: {other}"),
    }
}

#[tokio::test]
async fn health_reports_database_up() {
    let app = TestApp::new().await;

    for uri in ["/health", "/api/v1/health"] {
        let response = app.request(Method::GET, uri, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "up");
        assert_eq!(body["database"]["status"], "up");
    }
}

#[tokio::test]
async fn product_crud_round_trip() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "name": "Panadol 500mg",
                "price": "12.50",
                "quantity": "40",
                "unit_per_box": 12
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    let id = body["data"]["id"].as_i64().expect("product id");
    assert_eq!(body["data"]["box_amount"], 3);

    let response = app
        .request(Method::GET, &format!("/api/v1/products/{id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["name"], "Panadol 500mg");

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/products/{id}/restock"),
            Some(json!({ "quantity": "10" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/products/{id}/transactions"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["transaction_type"], "restock");

    let response = app
        .request(Method::GET, "/api/v1/products?search=Panadol", None)
        .await;
    let body = json_body(response).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["page"], 1);

    // restocked, so the ledger pins it
    let response = app
        .request(Method::DELETE, &format!("/api/v1/products/{id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let untouched = app.seed_product("Panadol Extra", dec!(20), dec!(0), 1).await;
    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/products/{}", untouched.id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn missing_resources_use_the_error_body() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/products/4242", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Not Found");
    assert!(body["message"]
        .as_str()
        .expect("message")
        .contains("Product 4242"));
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn invalid_payloads_are_bad_requests() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/products",
            Some(json!({ "name": "", "price": "1" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request(
            Method::POST,
            "/api/v1/products",
            Some(json!({ "name": "Negative", "price": "-1" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invoice_flow_over_http() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("HTTP Clinic", None, Some("C.O.D.")).await;
    let product = app.seed_product("Gauze Roll", dec!(20), dec!(10), 1).await;
    app.seed_deliveryman("D1", "Ah Keung").await;

    let response = app
        .request(Method::GET, "/api/v1/invoices/next-number", None)
        .await;
    let body = json_body(response).await;
    assert_eq!(body["data"]["number"], "1");

    let response = app
        .request(
            Method::POST,
            "/api/v1/invoices",
            Some(json!({
                "customer_id": customer.id,
                "lines": [{ "product_id": product.id, "quantity": "3" }]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    let invoice_id = body["data"]["invoice"]["id"].as_i64().expect("invoice id");
    assert_eq!(body["data"]["invoice"]["number"], "1");
    assert_eq!(body["data"]["invoice"]["terms"], "C.O.D.");
    assert_eq!(decimal(&body["data"]["invoice"]["total_price"]), dec!(60));
    let item_id = body["data"]["lines"][0]["id"].as_i64().expect("item id");
    assert_eq!(body["data"]["lines"][0]["product_name"], "Gauze Roll");

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/invoice-items/{item_id}"),
            Some(json!({ "quantity": "5" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(decimal(&body["data"]["invoice"]["total_price"]), dec!(100));

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/invoices/{invoice_id}/items"),
            Some(json!({
                "product_id": product.id,
                "quantity": "1",
                "product_type": "bonus"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request(
            Method::PATCH,
            "/api/v1/invoices/delivery",
            Some(json!({
                "number": "1",
                "delivery_date": "2024-07-01",
                "deliveryman": "Ah Keung"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["sale_posted"], true);

    let response = app.request(Method::GET, "/api/v1/reports/unpaid", None).await;
    let body = json_body(response).await;
    assert_eq!(decimal(&body["data"]["total_unpaid"]), dec!(100));

    let response = app
        .request(
            Method::PATCH,
            "/api/v1/invoices/payment",
            Some(json!({
                "number": "1",
                "payment_date": "2024-07-15",
                "cheque_detail": "BOC 778"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(Method::GET, "/api/v1/reports/payments/2024/7", None)
        .await;
    let body = json_body(response).await;
    assert_eq!(body["data"]["groups"][0]["cheque_detail"], "BOC 778");

    assert_eq!(app.product(product.id).await.quantity, dec!(4));

    let response = app
        .request(Method::DELETE, &format!("/api/v1/invoices/{invoice_id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.product(product.id).await.quantity, dec!(10));
}

#[tokio::test]
async fn customer_search_and_special_prices_over_http() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Search Clinic", None, None).await;
    app.seed_product("Amoxil (Lot: 7)", dec!(50), dec!(5), 1).await;

    let response = app
        .request(Method::GET, "/api/v1/customers/search?q=search", None)
        .await;
    let body = json_body(response).await;
    assert_eq!(body["data"][0]["id"], customer.id);

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/customers/{}/special-prices", customer.id),
            Some(json!({ "product_base_name": "Amoxil", "special_price": "45" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/customers/{}/special-prices", customer.id),
            Some(json!({ "product_base_name": "Amoxil", "special_price": "44" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .request(Method::GET, "/api/v1/special-prices/base-names", None)
        .await;
    let body = json_body(response).await;
    assert_eq!(body["data"], json!(["Amoxil"]));

    let response = app
        .request(Method::DELETE, &format!("/api/v1/customers/{}", customer.id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
