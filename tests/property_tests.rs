//! Property-based tests for the pricing rules and the invoice/ledger invariants.

mod common;

use common::{line, TestApp};
use lafarge_api::{
    entities::{invoice_item, product::box_counts},
    services::{
        invoice_items::InvoiceLinePatch,
        numbering::{extract_number, next_number_from},
        pricing::round_sum_price,
        reports::week_of_month,
    },
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

fn cents_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn rounding_never_raises_a_line_sum(raw in cents_strategy()) {
        let rounded = round_sum_price(raw);
        prop_assert!(rounded <= raw);
        prop_assert!(raw - rounded < Decimal::ONE);
        prop_assert_eq!(rounded.round_dp(2), rounded);
    }

    #[test]
    fn box_counts_recompose_quantity(quantity in 0i64..100_000, per_box in 1i32..500) {
        let quantity = Decimal::from(quantity);
        let (boxes, remain) = box_counts(quantity, per_box);
        prop_assert_eq!(Decimal::from(boxes) * Decimal::from(per_box) + remain, quantity);
        prop_assert!(remain < Decimal::from(per_box));
    }

    #[test]
    fn weeks_stay_within_the_month(day in 1u32..=31) {
        let week = week_of_month(day);
        prop_assert!((1..=5).contains(&week));
    }

    #[test]
    fn next_number_is_unused_and_larger(numbers in prop::collection::vec(1u64..1_000_000, 0..20)) {
        let existing: Vec<String> = numbers.iter().map(|n| n.to_string()).collect();
        let next = next_number_from(&existing);
        prop_assert!(!existing.contains(&next));
        let max = numbers.iter().copied().max().unwrap_or(0);
        prop_assert!(extract_number(&next).unwrap_or(0) > max);
    }
}

#[derive(Debug, Clone)]
enum Op {
    Add { product: usize, quantity: i64 },
    Edit { line: usize, quantity: i64 },
    Move { line: usize, product: usize },
    Delete { line: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..3, 1i64..20).prop_map(|(product, quantity)| Op::Add { product, quantity }),
        (0usize..8, 1i64..20).prop_map(|(line, quantity)| Op::Edit { line, quantity }),
        (0usize..8, 0usize..3).prop_map(|(line, product)| Op::Move { line, product }),
        (0usize..8).prop_map(|line| Op::Delete { line }),
    ]
}

const INITIAL_STOCK: i64 = 25;

/// Runs `ops` against a fresh database and checks the invariants after each one.
async fn check_line_sequence(ops: Vec<Op>) -> Result<(), TestCaseError> {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Property Clinic", None, None).await;
    let mut products = Vec::new();
    for (name, price, pack) in [("Alpha", 30, 1), ("Beta", 55, 10), ("Gamma", 7, 3)] {
        products.push(
            app.seed_product(
                name,
                Decimal::from(price),
                Decimal::from(INITIAL_STOCK),
                pack,
            )
            .await,
        );
    }
    let invoice = app.seed_invoice("1", customer.id, &[]).await.invoice;
    let lines_service = &app.state.services.invoice_lines;
    let mut live_lines: Vec<i32> = Vec::new();

    for op in ops {
        match op {
            Op::Add { product, quantity } => {
                let outcome = lines_service
                    .create_line(invoice.id, line(products[product].id, Decimal::from(quantity)))
                    .await
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
                if let Some(saved) = outcome.line {
                    live_lines.push(saved.id);
                }
            }
            Op::Edit { line: idx, quantity } if !live_lines.is_empty() => {
                let item_id = live_lines[idx % live_lines.len()];
                lines_service
                    .update_line(
                        item_id,
                        InvoiceLinePatch {
                            quantity: Some(Decimal::from(quantity)),
                            ..Default::default()
                        },
                    )
                    .await
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
            }
            Op::Move { line: idx, product } if !live_lines.is_empty() => {
                let item_id = live_lines[idx % live_lines.len()];
                lines_service
                    .update_line(
                        item_id,
                        InvoiceLinePatch {
                            product_id: Some(products[product].id),
                            ..Default::default()
                        },
                    )
                    .await
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
            }
            Op::Delete { line: idx } if !live_lines.is_empty() => {
                let item_id = live_lines.remove(idx % live_lines.len());
                lines_service
                    .delete_line(item_id)
                    .await
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
            }
            _ => continue,
        }

        let stored = app
            .state
            .services
            .invoices
            .get_invoice(invoice.id)
            .await
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let line_sum: Decimal = invoice_item::Entity::find()
            .filter(invoice_item::Column::InvoiceId.eq(invoice.id))
            .all(app.db())
            .await
            .map_err(|e| TestCaseError::fail(e.to_string()))?
            .iter()
            .map(|l| l.sum_price)
            .sum();
        prop_assert_eq!(stored.total_price, line_sum);

        for product in &products {
            let current = app.product(product.id).await;
            let ledger = app.ledger(product.id).await;
            prop_assert_eq!(
                Decimal::from(INITIAL_STOCK) + app.ledger_sum(product.id).await,
                current.quantity
            );
            if let Some(last) = ledger.iter().rev().find(|entry| !entry.is_memo) {
                prop_assert_eq!(last.quantity_after_transaction, current.quantity);
            }
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn totals_and_ledger_stay_consistent(ops in prop::collection::vec(op_strategy(), 1..12)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("tokio runtime");
        runtime.block_on(check_line_sequence(ops))?;
    }
}
