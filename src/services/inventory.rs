use crate::{
    db::{self, db_err, DbPool},
    entities::{
        invoice_item::{self, Entity as InvoiceItem},
        product::{self, Entity as Product},
        product_transaction::{self, Entity as ProductTransaction, TransactionType},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{validate_non_negative, Page},
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

pub use crate::entities::product::box_counts;

/// A stock write together with the ledger entry that records it.
#[derive(Debug, Clone, Serialize)]
pub struct StockMovement {
    pub product: product::Model,
    pub entry: product_transaction::Model,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(custom = "validate_non_negative")]
    pub price: Decimal,
    #[serde(default)]
    pub quantity: Decimal,
    pub unit: Option<String>,
    #[serde(default = "default_units_per_pack")]
    #[validate(range(min = 1))]
    pub units_per_pack: i32,
    #[serde(default)]
    pub unit_per_box: i32,
    pub supplier: Option<String>,
    pub import_date: Option<NaiveDate>,
    pub import_invoice_number: Option<String>,
    pub registration_code: Option<String>,
    pub expiry_date: Option<NaiveDate>,
}

fn default_units_per_pack() -> i32 {
    1
}

/// Partial product edit. A new `quantity` is posted to the ledger as an adjustment.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProductInput {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<Decimal>,
    pub unit: Option<String>,
    #[validate(range(min = 1))]
    pub units_per_pack: Option<i32>,
    pub unit_per_box: Option<i32>,
    pub supplier: Option<String>,
    pub import_date: Option<NaiveDate>,
    pub import_invoice_number: Option<String>,
    pub registration_code: Option<String>,
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    /// Substring of the product name
    pub search: Option<String>,
    #[serde(default)]
    pub in_stock_only: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionFilter {
    pub product_id: Option<i32>,
    pub transaction_type: Option<TransactionType>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// Include delivery memo postings (default true)
    pub include_memo: Option<bool>,
}

/// Writes `am` to `current`'s row only if nobody else bumped its version.
pub(crate) async fn guarded_update<C: ConnectionTrait>(
    conn: &C,
    current: &product::Model,
    mut am: product::ActiveModel,
) -> Result<product::Model, ServiceError> {
    am.version = Set(current.version + 1);
    am.updated_at = Set(Utc::now());

    let result = Product::update_many()
        .set(am)
        .filter(product::Column::Id.eq(current.id))
        .filter(product::Column::Version.eq(current.version))
        .exec(conn)
        .await
        .map_err(db_err)?;

    if result.rows_affected == 0 {
        warn!(product_id = current.id, "Product version moved during update");
        return Err(ServiceError::ConcurrentModification(current.id));
    }

    Product::find_by_id(current.id)
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| ServiceError::not_found("Product", current.id))
}

pub(crate) async fn find_product<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> Result<product::Model, ServiceError> {
    Product::find_by_id(id)
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| ServiceError::not_found("Product", id))
}

#[allow(clippy::too_many_arguments)]
async fn append_entry<C: ConnectionTrait>(
    conn: &C,
    product_id: i32,
    kind: TransactionType,
    change: Decimal,
    quantity_after: Decimal,
    description: String,
    invoice_id: Option<i32>,
    is_memo: bool,
    timestamp: Option<DateTime<Utc>>,
) -> Result<product_transaction::Model, ServiceError> {
    let mut entry = product_transaction::ActiveModel {
        product_id: Set(product_id),
        transaction_type: Set(kind),
        change: Set(change),
        quantity_after_transaction: Set(quantity_after),
        description: Set(description),
        invoice_id: Set(invoice_id),
        is_memo: Set(is_memo),
        ..Default::default()
    };
    if let Some(ts) = timestamp {
        entry.timestamp = Set(ts);
    }
    entry.insert(conn).await.map_err(db_err)
}

/// Moves `product`'s stock by `change` and appends the matching ledger entry.
pub(crate) async fn apply_stock_change<C: ConnectionTrait>(
    conn: &C,
    product: &product::Model,
    change: Decimal,
    kind: TransactionType,
    description: String,
    invoice_id: Option<i32>,
) -> Result<StockMovement, ServiceError> {
    let new_quantity = product.quantity + change;
    let (boxes, remain) = box_counts(new_quantity, product.unit_per_box);
    let am = product::ActiveModel {
        quantity: Set(new_quantity),
        box_amount: Set(boxes),
        box_remain: Set(remain),
        ..Default::default()
    };
    let updated = guarded_update(conn, product, am).await?;

    if change < Decimal::ZERO && updated.quantity < Decimal::ZERO {
        warn!(
            product_id = updated.id,
            product = %updated.name,
            quantity = %updated.quantity,
            "Stock deducted below zero"
        );
    }

    let entry = append_entry(
        conn,
        updated.id,
        kind,
        change,
        updated.quantity,
        description,
        invoice_id,
        false,
        None,
    )
    .await?;

    Ok(StockMovement {
        product: updated,
        entry,
    })
}

/// Ledger entry that records a shipment without touching stock.
pub(crate) async fn post_memo<C: ConnectionTrait>(
    conn: &C,
    product: &product::Model,
    change: Decimal,
    description: String,
    invoice_id: i32,
    timestamp: DateTime<Utc>,
) -> Result<product_transaction::Model, ServiceError> {
    append_entry(
        conn,
        product.id,
        TransactionType::Sale,
        change,
        product.quantity,
        description,
        Some(invoice_id),
        true,
        Some(timestamp),
    )
    .await
}

/// Publishes stock events for committed movements.
pub(crate) async fn publish_movements(sender: &EventSender, movements: &[StockMovement]) {
    for movement in movements {
        sender
            .publish(Event::StockChanged {
                product_id: movement.product.id,
                change: movement.entry.change,
                quantity_after: movement.entry.quantity_after_transaction,
                transaction_id: movement.entry.id,
            })
            .await;
        if movement.entry.change < Decimal::ZERO && movement.product.quantity < Decimal::ZERO {
            sender
                .publish(Event::StockWentNegative {
                    product_id: movement.product.id,
                    product_name: movement.product.name.clone(),
                    quantity: movement.product.quantity,
                })
                .await;
        }
    }
}

#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl InventoryService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;

        let model = product::ActiveModel {
            name: Set(input.name.trim().to_string()),
            price: Set(input.price),
            quantity: Set(input.quantity),
            unit: Set(input.unit),
            units_per_pack: Set(input.units_per_pack),
            unit_per_box: Set(input.unit_per_box),
            supplier: Set(input.supplier),
            import_date: Set(input.import_date),
            import_invoice_number: Set(input.import_invoice_number),
            registration_code: Set(input.registration_code),
            expiry_date: Set(input.expiry_date),
            version: Set(1),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .map_err(ServiceError::db_error)?;

        info!(product_id = model.id, "Product created");
        self.event_sender
            .publish(Event::ProductCreated(model.id))
            .await;
        Ok(model)
    }

    pub async fn get_product(&self, id: i32) -> Result<product::Model, ServiceError> {
        find_product(self.db.as_ref(), id).await
    }

    /// Lists products with in-stock items first, then by name.
    pub async fn list_products(
        &self,
        filter: ProductFilter,
        page: u64,
        per_page: u64,
    ) -> Result<Page<product::Model>, ServiceError> {
        let mut query = Product::find();
        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            query = query.filter(product::Column::Name.contains(search.trim()));
        }
        if filter.in_stock_only {
            query = query.filter(product::Column::Quantity.gt(Decimal::ZERO));
        }

        let paginator = query
            .order_by(product::Column::Quantity.gt(Decimal::ZERO), Order::Desc)
            .order_by_asc(product::Column::Name)
            .paginate(self.db.as_ref(), per_page.max(1));
        Page::fetch(paginator, page, per_page).await
    }

    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        id: i32,
        input: UpdateProductInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;
        if let Some(price) = input.price {
            if price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "price must not be negative".into(),
                ));
            }
        }

        let (updated, movement) = db::transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move {
                let current = find_product(txn, id).await?;

                let movement = match input.quantity {
                    Some(quantity) if quantity != current.quantity => Some(
                        apply_stock_change(
                            txn,
                            &current,
                            quantity - current.quantity,
                            TransactionType::Adjustment,
                            "Manual stock adjustment".to_string(),
                            None,
                        )
                        .await?,
                    ),
                    _ => None,
                };
                let current = movement
                    .as_ref()
                    .map(|m| m.product.clone())
                    .unwrap_or(current);

                let mut am = <product::ActiveModel as Default>::default();
                if let Some(name) = input.name {
                    am.name = Set(name.trim().to_string());
                }
                if let Some(price) = input.price {
                    am.price = Set(price);
                }
                if let Some(unit) = input.unit {
                    am.unit = Set(Some(unit));
                }
                if let Some(units_per_pack) = input.units_per_pack {
                    am.units_per_pack = Set(units_per_pack);
                }
                if let Some(unit_per_box) = input.unit_per_box {
                    let (boxes, remain) = box_counts(current.quantity, unit_per_box);
                    am.unit_per_box = Set(unit_per_box);
                    am.box_amount = Set(boxes);
                    am.box_remain = Set(remain);
                }
                if let Some(supplier) = input.supplier {
                    am.supplier = Set(Some(supplier));
                }
                if let Some(date) = input.import_date {
                    am.import_date = Set(Some(date));
                }
                if let Some(number) = input.import_invoice_number {
                    am.import_invoice_number = Set(Some(number));
                }
                if let Some(code) = input.registration_code {
                    am.registration_code = Set(Some(code));
                }
                if let Some(date) = input.expiry_date {
                    am.expiry_date = Set(Some(date));
                }

                let updated = guarded_update(txn, &current, am).await?;
                Ok((updated, movement))
            })
        })
        .await?;

        self.event_sender
            .publish(Event::ProductUpdated(updated.id))
            .await;
        if let Some(movement) = movement {
            publish_movements(&self.event_sender, &[movement]).await;
        }
        Ok(updated)
    }

    /// Deletes a product that never moved stock. Refused while invoice lines
    /// reference it or any ledger entry exists; the ledger is append-only.
    pub async fn delete_product(&self, id: i32) -> Result<(), ServiceError> {
        db::transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move {
                let product = find_product(txn, id).await?;
                let references = InvoiceItem::find()
                    .filter(invoice_item::Column::ProductId.eq(id))
                    .count(txn)
                    .await
                    .map_err(db_err)?;
                if references > 0 {
                    return Err(ServiceError::InvalidOperation(format!(
                        "Product '{}' is used by {} invoice line(s)",
                        product.name, references
                    )));
                }

                let entries = ProductTransaction::find()
                    .filter(product_transaction::Column::ProductId.eq(id))
                    .count(txn)
                    .await
                    .map_err(db_err)?;
                if entries > 0 {
                    return Err(ServiceError::InvalidOperation(format!(
                        "Product '{}' has {} ledger entries and cannot be deleted",
                        product.name, entries
                    )));
                }

                Product::delete_by_id(id).exec(txn).await.map_err(db_err)?;
                Ok(())
            })
        })
        .await?;

        info!(product_id = id, "Product deleted");
        self.event_sender.publish(Event::ProductDeleted(id)).await;
        Ok(())
    }

    /// New product carrying the source's catalogue data and no stock.
    pub async fn copy_product(
        &self,
        id: i32,
        new_name: Option<String>,
    ) -> Result<product::Model, ServiceError> {
        let source = self.get_product(id).await?;
        let name = new_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("{} (copy)", source.name));

        self.create_product(CreateProductInput {
            name,
            price: source.price,
            quantity: Decimal::ZERO,
            unit: source.unit,
            units_per_pack: source.units_per_pack,
            unit_per_box: source.unit_per_box,
            supplier: source.supplier,
            import_date: source.import_date,
            import_invoice_number: None,
            registration_code: source.registration_code,
            expiry_date: None,
        })
        .await
    }

    /// Adds received stock.
    pub async fn restock(
        &self,
        product_id: i32,
        quantity: Decimal,
        description: Option<String>,
    ) -> Result<StockMovement, ServiceError> {
        if quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "restock quantity must be positive".into(),
            ));
        }

        let movement = db::transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move {
                let product = find_product(txn, product_id).await?;
                apply_stock_change(
                    txn,
                    &product,
                    quantity,
                    TransactionType::Restock,
                    description.unwrap_or_else(|| "Stock received".to_string()),
                    None,
                )
                .await
            })
        })
        .await?;

        publish_movements(&self.event_sender, std::slice::from_ref(&movement)).await;
        Ok(movement)
    }

    /// Ledger entries, newest first.
    pub async fn list_transactions(
        &self,
        filter: TransactionFilter,
        page: u64,
        per_page: u64,
    ) -> Result<Page<product_transaction::Model>, ServiceError> {
        let mut query = ProductTransaction::find();
        if let Some(product_id) = filter.product_id {
            query = query.filter(product_transaction::Column::ProductId.eq(product_id));
        }
        if let Some(kind) = filter.transaction_type {
            query = query.filter(product_transaction::Column::TransactionType.eq(kind));
        }
        if let Some(from) = filter.from {
            query = query.filter(product_transaction::Column::Timestamp.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(product_transaction::Column::Timestamp.lt(to));
        }
        if !filter.include_memo.unwrap_or(true) {
            query = query.filter(product_transaction::Column::IsMemo.eq(false));
        }

        let paginator = query
            .order_by_desc(product_transaction::Column::Timestamp)
            .order_by_desc(product_transaction::Column::Id)
            .paginate(self.db.as_ref(), per_page.max(1));
        Page::fetch(paginator, page, per_page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{establish_connection_with_config, run_migrations, DbConfig};
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;
    use tokio::sync::mpsc;

    async fn service() -> (InventoryService, mpsc::Receiver<Event>) {
        let pool = establish_connection_with_config(&DbConfig {
            url: "sqlite::memory:".into(),
            max_connections: 1,
            ..Default::default()
        })
        .await
        .unwrap();
        run_migrations(&pool).await.unwrap();
        let (tx, rx) = mpsc::channel(16);
        (
            InventoryService::new(Arc::new(pool), EventSender::new(tx)),
            rx,
        )
    }

    fn input(name: &str, quantity: Decimal) -> CreateProductInput {
        CreateProductInput {
            name: name.to_string(),
            price: dec!(100),
            quantity,
            unit: None,
            units_per_pack: 1,
            unit_per_box: 0,
            supplier: None,
            import_date: None,
            import_invoice_number: None,
            registration_code: None,
            expiry_date: None,
        }
    }

    async fn entries(service: &InventoryService, product_id: i32) -> usize {
        ProductTransaction::find()
            .filter(product_transaction::Column::ProductId.eq(product_id))
            .all(service.db.as_ref())
            .await
            .unwrap()
            .len()
    }

    #[tokio::test]
    async fn stale_product_aborts_the_whole_transaction() {
        let (service, _rx) = service().await;
        let fresh = service.create_product(input("Paracetamol", dec!(10))).await.unwrap();
        let stale = service.create_product(input("Amoxicillin", dec!(20))).await.unwrap();

        // bumps the version so `stale` no longer matches its row
        service.restock(stale.id, dec!(5), None).await.unwrap();

        let fresh_in = fresh.clone();
        let stale_in = stale.clone();
        let result = db::transaction(service.db.as_ref(), move |txn| {
            Box::pin(async move {
                apply_stock_change(
                    txn,
                    &fresh_in,
                    dec!(-3),
                    TransactionType::Sale,
                    "first line".to_string(),
                    None,
                )
                .await?;
                apply_stock_change(
                    txn,
                    &stale_in,
                    dec!(-4),
                    TransactionType::Sale,
                    "second line".to_string(),
                    None,
                )
                .await
            })
        })
        .await;

        assert_matches!(result, Err(ServiceError::ConcurrentModification(id)) if id == stale.id);

        let fresh_now = service.get_product(fresh.id).await.unwrap();
        assert_eq!(fresh_now.quantity, dec!(10));
        assert_eq!(fresh_now.version, fresh.version);
        assert_eq!(entries(&service, fresh.id).await, 0);

        let stale_now = service.get_product(stale.id).await.unwrap();
        assert_eq!(stale_now.quantity, dec!(25));
        assert_eq!(entries(&service, stale.id).await, 1);
    }

    #[tokio::test]
    async fn guarded_update_bumps_version() {
        let (service, _rx) = service().await;
        let product = service.create_product(input("Vitamin C", dec!(1))).await.unwrap();

        let updated = guarded_update(
            service.db.as_ref(),
            &product,
            <product::ActiveModel as Default>::default(),
        )
        .await
        .unwrap();
        assert_eq!(updated.version, product.version + 1);

        let again = guarded_update(
            service.db.as_ref(),
            &product,
            <product::ActiveModel as Default>::default(),
        )
        .await;
        assert_matches!(again, Err(ServiceError::ConcurrentModification(_)));
    }
}
