mod common;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use common::{line, TestApp};
use lafarge_api::{
    errors::ServiceError,
    services::{invoicing::CreateInvoiceInput, reports::SalesmanCommission},
};
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Dominic sells 10 000 himself; the pooled account sells 20 000.
struct Fixture {
    app: TestApp,
    dominic: i32,
    pooled: i32,
    deliveryman: i32,
}

async fn fixture() -> Fixture {
    let app = TestApp::new().await;
    let dominic = app.seed_salesman("DS", "Dominic So").await;
    let alex = app.seed_salesman("AC", "Alex Cheung").await;
    let pooled = app.seed_salesman("POOL", "DS/MM/AC").await;
    let deliveryman = app.seed_deliveryman("D1", "Ah Keung").await;
    let customer = app.seed_customer("Central Clinic", None, None).await;
    let product = app
        .seed_product("Amoxil 500mg (Lot no: A1)", dec!(10000), dec!(100), 1)
        .await;

    let invoices = &app.state.services.invoices;
    for (number, salesman, quantity, delivered) in [
        ("1001", dominic.id, dec!(1), date(2024, 3, 5)),
        ("1002", pooled.id, dec!(2), date(2024, 3, 20)),
        ("1003", alex.id, dec!(1), date(2024, 2, 10)),
    ] {
        invoices
            .create_invoice(CreateInvoiceInput {
                number: Some(number.into()),
                customer_id: customer.id,
                salesman_id: Some(salesman),
                deliveryman_id: Some(deliveryman.id),
                delivery_date: Some(delivered),
                lines: vec![line(product.id, quantity)],
                ..Default::default()
            })
            .await
            .expect("seed delivered invoice");
    }

    Fixture {
        dominic: dominic.id,
        pooled: pooled.id,
        deliveryman: deliveryman.id,
        app,
    }
}

#[tokio::test]
async fn commissions_include_the_pooled_share() {
    let f = fixture().await;

    let commissions = f
        .app
        .state
        .services
        .reports
        .all_salesmen_commissions(2024, 3)
        .await
        .expect("commissions");

    // Alex: 0.3 * 20 000 = 6 000; Dominic: 10 000 + 0.4 * 20 000 = 18 000; both at 2 % and x1.1
    assert_eq!(
        commissions,
        vec![
            SalesmanCommission {
                salesman: "Alex Cheung".into(),
                commission: dec!(132.00),
            },
            SalesmanCommission {
                salesman: "Dominic So".into(),
                commission: dec!(396.00),
            },
        ]
    );
}

#[tokio::test]
async fn monthly_report_buckets_by_week() {
    let f = fixture().await;
    let report = f
        .app
        .state
        .services
        .reports
        .salesman_monthly_report(f.dominic, 2024, 3)
        .await
        .expect("report");

    assert_eq!(report.weeks.len(), 5);
    assert_eq!(report.weeks[0].total, dec!(10000));
    assert_eq!(report.weeks[0].invoices[0].number, "1001");
    assert_eq!(
        report.weeks[0].invoices[0].items,
        vec!["Amoxil 500mg (1)".to_string()]
    );
    assert_eq!(report.monthly_total, dec!(10000));
    assert_eq!(report.monthly_total_share, dec!(20000));
    assert_eq!(report.personal_share, dec!(8000));
    assert_eq!(report.sales_monthly_total, dec!(18000));
    assert_eq!(report.incentive_rate, dec!(0.02));
    assert_eq!(report.commission, dec!(396));
    assert_eq!(report.shared_invoices.len(), 1);
}

#[tokio::test]
async fn preview_lists_months_with_sales() {
    let f = fixture().await;
    let preview = f
        .app
        .state
        .services
        .reports
        .salesman_monthly_preview(f.pooled)
        .await
        .expect("preview");

    assert_eq!(preview.salesman, "DS/MM/AC");
    assert_eq!(preview.months.len(), 1);
    assert_eq!(preview.months[0].name, "March 2024");
    assert_eq!(preview.months[0].total, dec!(20000));
}

#[tokio::test]
async fn product_analysis_groups_by_clean_name() {
    let f = fixture().await;
    let analysis = f
        .app
        .state
        .services
        .reports
        .monthly_product_analysis(2024, 3)
        .await
        .expect("analysis");

    assert_eq!(analysis.products.len(), 1);
    assert_eq!(analysis.products[0].name, "Amoxil 500mg");
    assert_eq!(analysis.products[0].revenue, dec!(30000));
    assert_eq!(analysis.products[0].quantity, dec!(3));
    assert_eq!(analysis.total_revenue, dec!(30000));
}

#[tokio::test]
async fn unpaid_summary_skips_paid_and_sample_invoices() {
    let f = fixture().await;
    let services = &f.app.state.services;
    let customer = f.app.seed_customer("Sample Taker", None, None).await;
    services
        .invoices
        .create_invoice(CreateInvoiceInput {
            number: Some("S-77".into()),
            customer_id: customer.id,
            delivery_date: Some(date(2024, 3, 1)),
            ..Default::default()
        })
        .await
        .expect("sample invoice");
    services
        .invoices
        .set_payment_date("1003".into(), Some(date(2024, 4, 2)), Some("C-1".into()))
        .await
        .expect("pay");

    let summary = services.reports.unpaid_summary().await.expect("summary");
    assert_eq!(summary.total_unpaid, dec!(30000));
    assert_eq!(summary.customers.len(), 1);
    assert_eq!(summary.customers[0].customer, "Central Clinic");
    assert_eq!(summary.customers[0].invoices.len(), 2);
    assert_eq!(summary.months.len(), 1);
    assert_eq!(summary.months[0].month, 3);
}

#[tokio::test]
async fn payment_report_groups_by_cheque() {
    let f = fixture().await;
    let invoices = &f.app.state.services.invoices;
    invoices
        .set_payment_date("1001".into(), Some(date(2024, 4, 3)), Some("C-1".into()))
        .await
        .expect("pay");
    invoices
        .set_payment_date("1002".into(), Some(date(2024, 4, 9)), Some("C-1".into()))
        .await
        .expect("pay");
    invoices
        .set_payment_date("1003".into(), Some(date(2024, 4, 9)), Some("C-2".into()))
        .await
        .expect("pay");

    let report = f
        .app
        .state
        .services
        .reports
        .monthly_payment_report(2024, 4)
        .await
        .expect("payment report");

    assert_eq!(report.groups.len(), 2);
    assert_eq!(report.groups[0].cheque_detail.as_deref(), Some("C-1"));
    assert_eq!(report.groups[0].total_price, dec!(30000));
    assert_eq!(report.groups[1].total_price, dec!(10000));
    assert_eq!(report.total, dec!(40000));
}

#[tokio::test]
async fn deliveryman_report_groups_by_day() {
    let f = fixture().await;
    let report = f
        .app
        .state
        .services
        .reports
        .deliveryman_monthly_report(f.deliveryman, 2024, 3)
        .await
        .expect("deliveryman report");

    assert_eq!(report.deliveryman, "Ah Keung");
    assert_eq!(report.total_invoices, 2);
    let days: Vec<_> = report.days.iter().map(|d| d.date).collect();
    assert_eq!(days, vec![date(2024, 3, 5), date(2024, 3, 20)]);
}

#[tokio::test]
async fn invalid_month_is_rejected() {
    let f = fixture().await;
    let result = f
        .app
        .state
        .services
        .reports
        .monthly_product_analysis(2024, 13)
        .await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));
}
