//! Invoice-line lifecycle.
//!
//! Every line mutation moves stock, appends ledger entries, reprices the line
//! and recomputes the invoice total inside one database transaction. Callers
//! get the whole resulting aggregate back instead of relying on save hooks.

use crate::{
    db::{self, db_err, DbPool},
    entities::{
        invoice,
        invoice_item::{self, Entity as InvoiceItem, ProductType},
        product_transaction::TransactionType,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        inventory::{apply_stock_change, find_product, publish_movements, StockMovement},
        invoicing::{find_invoice, recalculate_total},
        pricing::{price_line, PricingPolicy},
    },
};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, ModelTrait, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewInvoiceLine {
    pub product_id: i32,
    pub quantity: Decimal,
    /// Nett price override; bypasses special and list prices
    pub net_price: Option<Decimal>,
    #[serde(default)]
    pub hide_nett: bool,
    #[serde(default)]
    pub product_type: ProductType,
}

/// Fields left as `None` keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InvoiceLinePatch {
    pub product_id: Option<i32>,
    pub quantity: Option<Decimal>,
    pub net_price: Option<Decimal>,
    /// Drop an existing nett override and price from special/list again
    #[serde(default)]
    pub clear_net_price: bool,
    pub hide_nett: Option<bool>,
    pub product_type: Option<ProductType>,
}

#[derive(Debug, Clone)]
pub enum LineChange {
    Create { invoice_id: i32, line: NewInvoiceLine },
    Update { item_id: i32, patch: InvoiceLinePatch },
    Delete { item_id: i32 },
}

impl LineChange {
    fn label(&self) -> &'static str {
        match self {
            LineChange::Create { .. } => "create",
            LineChange::Update { .. } => "update",
            LineChange::Delete { .. } => "delete",
        }
    }
}

/// State after a committed line change.
#[derive(Debug, Clone, Serialize)]
pub struct LineChangeOutcome {
    /// The persisted line; `None` after a delete
    pub line: Option<invoice_item::Model>,
    /// Stock writes with their ledger entries, in the order they happened
    pub movements: Vec<StockMovement>,
    pub invoice: invoice::Model,
    #[serde(skip)]
    pub previous_total: Decimal,
}

fn ensure_positive_quantity(quantity: Decimal) -> Result<(), ServiceError> {
    if quantity <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(format!(
            "line quantity must be positive, got {}",
            quantity
        )));
    }
    Ok(())
}

/// Delivery memo entries are written once, so later line edits are not reflected in them.
fn warn_if_delivered(invoice: &invoice::Model, action: &str) {
    if invoice.sale_posted {
        warn!(
            invoice_id = invoice.id,
            number = %invoice.number,
            action,
            "Line changed after delivery; memo postings not updated"
        );
    }
}

async fn find_line<C: ConnectionTrait>(
    conn: &C,
    item_id: i32,
) -> Result<invoice_item::Model, ServiceError> {
    InvoiceItem::find_by_id(item_id)
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| ServiceError::not_found("Invoice item", item_id))
}

/// Applies one line change on `conn`. The caller owns the transaction.
pub(crate) async fn apply_line_change_in<C: ConnectionTrait>(
    conn: &C,
    policy: &PricingPolicy,
    change: LineChange,
) -> Result<LineChangeOutcome, ServiceError> {
    match change {
        LineChange::Create { invoice_id, line } => create_in(conn, policy, invoice_id, line).await,
        LineChange::Update { item_id, patch } => update_in(conn, policy, item_id, patch).await,
        LineChange::Delete { item_id } => delete_in(conn, item_id).await,
    }
}

async fn create_in<C: ConnectionTrait>(
    conn: &C,
    policy: &PricingPolicy,
    invoice_id: i32,
    line: NewInvoiceLine,
) -> Result<LineChangeOutcome, ServiceError> {
    ensure_positive_quantity(line.quantity)?;
    let invoice = find_invoice(conn, invoice_id).await?;
    warn_if_delivered(&invoice, "create");
    let product = find_product(conn, line.product_id).await?;

    let movement = apply_stock_change(
        conn,
        &product,
        -line.quantity,
        TransactionType::Sale,
        format!("Invoice {}", invoice.number),
        Some(invoice.id),
    )
    .await?;

    let pricing = price_line(
        conn,
        policy,
        invoice.customer_id,
        &movement.product,
        line.product_type,
        line.quantity,
        line.net_price,
    )
    .await?;

    let saved = invoice_item::ActiveModel {
        invoice_id: Set(invoice.id),
        product_id: Set(product.id),
        quantity: Set(line.quantity),
        price: Set(pricing.price),
        net_price: Set(line.net_price),
        hide_nett: Set(line.hide_nett),
        sum_price: Set(pricing.sum_price),
        product_type: Set(line.product_type),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(db_err)?;

    let previous_total = invoice.total_price;
    let invoice = recalculate_total(conn, invoice.id).await?;
    debug!(item_id = saved.id, invoice_id = invoice.id, "Invoice line created");

    Ok(LineChangeOutcome {
        line: Some(saved),
        movements: vec![movement],
        invoice,
        previous_total,
    })
}

async fn update_in<C: ConnectionTrait>(
    conn: &C,
    policy: &PricingPolicy,
    item_id: i32,
    patch: InvoiceLinePatch,
) -> Result<LineChangeOutcome, ServiceError> {
    let existing = find_line(conn, item_id).await?;
    let invoice = find_invoice(conn, existing.invoice_id).await?;
    warn_if_delivered(&invoice, "update");

    let product_id = patch.product_id.unwrap_or(existing.product_id);
    let quantity = patch.quantity.unwrap_or(existing.quantity);
    ensure_positive_quantity(quantity)?;

    let mut movements = Vec::new();
    let product = if product_id == existing.product_id {
        let product = find_product(conn, product_id).await?;
        // positive when the line shrank and stock comes back
        let delta = existing.quantity - quantity;
        if delta.is_zero() {
            product
        } else {
            let movement = apply_stock_change(
                conn,
                &product,
                delta,
                TransactionType::Adjustment,
                format!("Invoice {} line edited", invoice.number),
                Some(invoice.id),
            )
            .await?;
            let product = movement.product.clone();
            movements.push(movement);
            product
        }
    } else {
        let previous = find_product(conn, existing.product_id).await?;
        movements.push(
            apply_stock_change(
                conn,
                &previous,
                existing.quantity,
                TransactionType::Restock,
                format!("Invoice {} line moved to another product", invoice.number),
                Some(invoice.id),
            )
            .await?,
        );

        let replacement = find_product(conn, product_id).await?;
        let movement = apply_stock_change(
            conn,
            &replacement,
            -quantity,
            TransactionType::Sale,
            format!("Invoice {}", invoice.number),
            Some(invoice.id),
        )
        .await?;
        let product = movement.product.clone();
        movements.push(movement);
        product
    };

    let net_price = if patch.clear_net_price {
        None
    } else {
        patch.net_price.or(existing.net_price)
    };
    let product_type = patch.product_type.unwrap_or(existing.product_type);
    let pricing = price_line(
        conn,
        policy,
        invoice.customer_id,
        &product,
        product_type,
        quantity,
        net_price,
    )
    .await?;

    let hide_nett = patch.hide_nett.unwrap_or(existing.hide_nett);
    let mut am: invoice_item::ActiveModel = existing.into();
    am.product_id = Set(product.id);
    am.quantity = Set(quantity);
    am.price = Set(pricing.price);
    am.net_price = Set(net_price);
    am.hide_nett = Set(hide_nett);
    am.sum_price = Set(pricing.sum_price);
    am.product_type = Set(product_type);
    let saved = am.update(conn).await.map_err(db_err)?;

    let previous_total = invoice.total_price;
    let invoice = recalculate_total(conn, invoice.id).await?;
    debug!(item_id = saved.id, invoice_id = invoice.id, "Invoice line updated");

    Ok(LineChangeOutcome {
        line: Some(saved),
        movements,
        invoice,
        previous_total,
    })
}

async fn delete_in<C: ConnectionTrait>(
    conn: &C,
    item_id: i32,
) -> Result<LineChangeOutcome, ServiceError> {
    let existing = find_line(conn, item_id).await?;
    let invoice = find_invoice(conn, existing.invoice_id).await?;
    warn_if_delivered(&invoice, "delete");
    let product = find_product(conn, existing.product_id).await?;

    let movement = apply_stock_change(
        conn,
        &product,
        existing.quantity,
        TransactionType::Restock,
        format!("Invoice {} line removed", invoice.number),
        Some(invoice.id),
    )
    .await?;

    existing.delete(conn).await.map_err(db_err)?;

    let previous_total = invoice.total_price;
    let invoice = recalculate_total(conn, invoice.id).await?;
    debug!(item_id, invoice_id = invoice.id, "Invoice line deleted");

    Ok(LineChangeOutcome {
        line: None,
        movements: vec![movement],
        invoice,
        previous_total,
    })
}

pub(crate) async fn publish_line_outcome(sender: &EventSender, outcome: &LineChangeOutcome) {
    publish_movements(sender, &outcome.movements).await;
    if outcome.invoice.total_price != outcome.previous_total {
        sender
            .publish(Event::InvoiceTotalChanged {
                invoice_id: outcome.invoice.id,
                total_price: outcome.invoice.total_price,
            })
            .await;
    }
}

#[derive(Clone)]
pub struct InvoiceLineService {
    db: Arc<DbPool>,
    event_sender: EventSender,
    pricing: PricingPolicy,
}

impl InvoiceLineService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender, pricing: PricingPolicy) -> Self {
        Self {
            db,
            event_sender,
            pricing,
        }
    }

    /// Runs a line change atomically and publishes the resulting events.
    #[instrument(skip(self, change), fields(op = change.label()))]
    pub async fn apply_invoice_line_change(
        &self,
        change: LineChange,
    ) -> Result<LineChangeOutcome, ServiceError> {
        let label = change.label();
        let policy = self.pricing.clone();

        let result = db::transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move { apply_line_change_in(txn, &policy, change).await })
        })
        .await;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                counter!("lafarge.invoice_line.failed", 1, "op" => label);
                return Err(e);
            }
        };

        counter!("lafarge.invoice_line.applied", 1, "op" => label);
        info!(
            invoice_id = outcome.invoice.id,
            total = %outcome.invoice.total_price,
            "Invoice line {} committed",
            label
        );
        publish_line_outcome(&self.event_sender, &outcome).await;
        Ok(outcome)
    }

    pub async fn create_line(
        &self,
        invoice_id: i32,
        line: NewInvoiceLine,
    ) -> Result<LineChangeOutcome, ServiceError> {
        self.apply_invoice_line_change(LineChange::Create { invoice_id, line })
            .await
    }

    pub async fn update_line(
        &self,
        item_id: i32,
        patch: InvoiceLinePatch,
    ) -> Result<LineChangeOutcome, ServiceError> {
        self.apply_invoice_line_change(LineChange::Update { item_id, patch })
            .await
    }

    pub async fn delete_line(&self, item_id: i32) -> Result<LineChangeOutcome, ServiceError> {
        self.apply_invoice_line_change(LineChange::Delete { item_id })
            .await
    }

    pub async fn get_line(&self, item_id: i32) -> Result<invoice_item::Model, ServiceError> {
        find_line(self.db.as_ref(), item_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn non_positive_quantities_are_rejected() {
        assert!(ensure_positive_quantity(dec!(1)).is_ok());
        assert!(ensure_positive_quantity(dec!(0.5)).is_ok());
        assert!(matches!(
            ensure_positive_quantity(Decimal::ZERO),
            Err(ServiceError::ValidationError(_))
        ));
        assert!(ensure_positive_quantity(dec!(-3)).is_err());
    }

    #[test]
    fn patch_defaults_keep_everything() {
        let patch: InvoiceLinePatch = serde_json::from_str("{}").unwrap();
        assert!(patch.product_id.is_none());
        assert!(patch.quantity.is_none());
        assert!(!patch.clear_net_price);
    }

    #[test]
    fn new_line_defaults_to_normal() {
        let line: NewInvoiceLine =
            serde_json::from_str(r#"{"product_id": 4, "quantity": "2"}"#).unwrap();
        assert_eq!(line.product_type, ProductType::Normal);
        assert!(!line.hide_nett);
    }
}
