use crate::{
    db::{self, db_err, DbPool},
    entities::{
        additional_item::{self, Entity as AdditionalItem},
        customer::{self, Entity as Customer},
        deliveryman::{self, Entity as Deliveryman},
        invoice::{self, Entity as Invoice},
        invoice_item::{self, Entity as InvoiceItem},
        product::Entity as Product,
        product_transaction::{self, TransactionType},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        inventory::{apply_stock_change, find_product, post_memo, publish_movements, StockMovement},
        invoice_items::{
            apply_line_change_in, publish_line_outcome, LineChange, LineChangeOutcome,
            NewInvoiceLine,
        },
        numbering::{self, SAMPLE_PREFIX},
        pricing::PricingPolicy,
        validate_non_negative, Page,
    },
};
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateInvoiceInput {
    /// Left empty, the next free number is assigned
    #[validate(length(min = 1, max = 64))]
    pub number: Option<String>,
    pub customer_id: i32,
    pub salesman_id: Option<i32>,
    pub deliveryman_id: Option<i32>,
    pub terms: Option<String>,
    pub order_number: Option<String>,
    pub sample_customer: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    #[serde(default)]
    pub lines: Vec<NewInvoiceLine>,
}

/// Header edit. `None` keeps the stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateInvoiceInput {
    #[validate(length(min = 1, max = 64))]
    pub number: Option<String>,
    pub customer_id: Option<i32>,
    pub salesman_id: Option<i32>,
    pub deliveryman_id: Option<i32>,
    pub terms: Option<String>,
    pub order_number: Option<String>,
    pub sample_customer: Option<String>,
    pub cheque_detail: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    pub payment_date: Option<NaiveDate>,
    pub deposit_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceFilter {
    /// Substring of the invoice number
    pub number: Option<String>,
    pub customer_id: Option<i32>,
    pub salesman_id: Option<i32>,
    pub deliveryman_id: Option<i32>,
    pub delivered_from: Option<NaiveDate>,
    pub delivered_to: Option<NaiveDate>,
    #[serde(default)]
    pub unpaid_only: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AdditionalItemInput {
    #[validate(length(min = 1, max = 255))]
    pub description: String,
    #[serde(default)]
    #[validate(custom = "validate_non_negative")]
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceLineDetail {
    #[serde(flatten)]
    pub item: invoice_item::Model,
    pub product_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceDetail {
    pub invoice: invoice::Model,
    pub customer: Option<customer::Model>,
    pub lines: Vec<InvoiceLineDetail>,
    pub additional_items: Vec<additional_item::Model>,
}

pub(crate) async fn find_invoice<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> Result<invoice::Model, ServiceError> {
    Invoice::find_by_id(id)
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| ServiceError::not_found("Invoice", id))
}

async fn find_invoice_by_number<C: ConnectionTrait>(
    conn: &C,
    number: &str,
) -> Result<invoice::Model, ServiceError> {
    Invoice::find()
        .filter(invoice::Column::Number.eq(number.trim()))
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| ServiceError::not_found("Invoice", number))
}

async fn find_customer<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> Result<customer::Model, ServiceError> {
    Customer::find_by_id(id)
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| ServiceError::not_found("Customer", id))
}

async fn lines_of<C: ConnectionTrait>(
    conn: &C,
    invoice_id: i32,
) -> Result<Vec<invoice_item::Model>, ServiceError> {
    InvoiceItem::find()
        .filter(invoice_item::Column::InvoiceId.eq(invoice_id))
        .order_by_asc(invoice_item::Column::Id)
        .all(conn)
        .await
        .map_err(db_err)
}

/// Recomputes `total_price` as the sum of the invoice's line sums.
pub async fn recalculate_total<C: ConnectionTrait>(
    conn: &C,
    invoice_id: i32,
) -> Result<invoice::Model, ServiceError> {
    let invoice = find_invoice(conn, invoice_id).await?;
    let total: Decimal = lines_of(conn, invoice_id)
        .await?
        .iter()
        .map(|line| line.sum_price)
        .sum();

    if total == invoice.total_price {
        return Ok(invoice);
    }

    let mut am: invoice::ActiveModel = invoice.into();
    am.total_price = Set(total);
    am.update(conn).await.map_err(db_err)
}

/// Next free invoice number given everything already stored.
pub async fn next_number<C: ConnectionTrait>(conn: &C) -> Result<String, ServiceError> {
    let existing: Vec<String> = Invoice::find()
        .select_only()
        .column(invoice::Column::Number)
        .into_tuple()
        .all(conn)
        .await
        .map_err(db_err)?;
    Ok(numbering::next_number_from(existing))
}

/// Writes the shipped-goods memo postings, one per line, dated at `date`.
async fn write_delivery_postings<C: ConnectionTrait>(
    conn: &C,
    invoice: &invoice::Model,
    date: NaiveDate,
) -> Result<Vec<product_transaction::Model>, ServiceError> {
    let timestamp = Utc.from_utc_datetime(&date.and_time(NaiveTime::default()));
    let mut postings = Vec::new();
    for line in lines_of(conn, invoice.id).await? {
        let product = find_product(conn, line.product_id).await?;
        postings.push(
            post_memo(
                conn,
                &product,
                -line.quantity,
                format!("Delivered on invoice {}", invoice.number),
                invoice.id,
                timestamp,
            )
            .await?,
        );
    }
    Ok(postings)
}

/// Stores a delivery date. The first transition from no date to a date
/// writes the delivery postings; later changes only move the date.
async fn apply_delivery_date<C: ConnectionTrait>(
    conn: &C,
    invoice: invoice::Model,
    date: Option<NaiveDate>,
    deliveryman_id: Option<i32>,
) -> Result<(invoice::Model, usize), ServiceError> {
    let postings = match date {
        Some(date) if invoice.delivery_date.is_none() && !invoice.sale_posted => {
            write_delivery_postings(conn, &invoice, date).await?.len()
        }
        _ => 0,
    };
    let first_delivery = date.is_some() && invoice.delivery_date.is_none() && !invoice.sale_posted;

    let mut am: invoice::ActiveModel = invoice.into();
    am.delivery_date = Set(date);
    if let Some(id) = deliveryman_id {
        am.deliveryman_id = Set(Some(id));
    }
    if first_delivery {
        am.sale_posted = Set(true);
    }
    let updated = am.update(conn).await.map_err(db_err)?;
    Ok((updated, postings))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct InvoiceService {
    db: Arc<DbPool>,
    event_sender: EventSender,
    pricing: PricingPolicy,
}

impl InvoiceService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender, pricing: PricingPolicy) -> Self {
        Self {
            db,
            event_sender,
            pricing,
        }
    }

    pub async fn generate_next_number(&self) -> Result<String, ServiceError> {
        next_number(self.db.as_ref()).await
    }

    /// Creates the invoice and any initial lines in one transaction.
    #[instrument(skip(self, input), fields(customer_id = input.customer_id))]
    pub async fn create_invoice(
        &self,
        input: CreateInvoiceInput,
    ) -> Result<InvoiceDetail, ServiceError> {
        input.validate()?;
        let policy = self.pricing.clone();

        let (invoice, outcomes, postings) = db::transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move {
                let customer = find_customer(txn, input.customer_id).await?;
                let number = match non_empty(input.number) {
                    Some(number) => number,
                    None => next_number(txn).await?,
                };

                let created = invoice::ActiveModel {
                    number: Set(number),
                    customer_id: Set(customer.id),
                    salesman_id: Set(input.salesman_id.or(customer.salesman_id)),
                    deliveryman_id: Set(input.deliveryman_id),
                    terms: Set(non_empty(input.terms).or(customer.terms)),
                    order_number: Set(input.order_number),
                    sample_customer: Set(input.sample_customer),
                    total_price: Set(Decimal::ZERO),
                    sale_posted: Set(false),
                    ..Default::default()
                }
                .insert(txn)
                .await
                .map_err(db_err)?;

                let mut outcomes = Vec::with_capacity(input.lines.len());
                for line in input.lines {
                    outcomes.push(
                        apply_line_change_in(
                            txn,
                            &policy,
                            LineChange::Create {
                                invoice_id: created.id,
                                line,
                            },
                        )
                        .await?,
                    );
                }

                let invoice = find_invoice(txn, created.id).await?;
                let (invoice, postings) = match input.delivery_date {
                    Some(date) => apply_delivery_date(txn, invoice, Some(date), None).await?,
                    None => (invoice, 0),
                };
                Ok((invoice, outcomes, postings))
            })
        })
        .await?;

        info!(invoice_id = invoice.id, number = %invoice.number, "Invoice created");
        self.event_sender
            .publish(Event::InvoiceCreated {
                invoice_id: invoice.id,
                number: invoice.number.clone(),
            })
            .await;
        for outcome in &outcomes {
            publish_line_outcome(&self.event_sender, outcome).await;
        }
        if postings > 0 {
            self.publish_delivered(&invoice, postings).await;
        }

        self.get_invoice_detail(invoice.id).await
    }

    pub async fn get_invoice(&self, id: i32) -> Result<invoice::Model, ServiceError> {
        find_invoice(self.db.as_ref(), id).await
    }

    pub async fn get_invoice_by_number(&self, number: &str) -> Result<invoice::Model, ServiceError> {
        find_invoice_by_number(self.db.as_ref(), number).await
    }

    /// Header with customer, lines (with product names) and additional items.
    pub async fn get_invoice_detail(&self, id: i32) -> Result<InvoiceDetail, ServiceError> {
        let conn = self.db.as_ref();
        let invoice = find_invoice(conn, id).await?;
        let customer = invoice
            .find_related(Customer)
            .one(conn)
            .await
            .map_err(ServiceError::db_error)?;
        let lines = InvoiceItem::find()
            .filter(invoice_item::Column::InvoiceId.eq(id))
            .order_by_asc(invoice_item::Column::Id)
            .find_also_related(Product)
            .all(conn)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|(item, product)| InvoiceLineDetail {
                item,
                product_name: product.map(|p| p.name),
            })
            .collect();
        let additional_items = invoice
            .find_related(AdditionalItem)
            .order_by_asc(additional_item::Column::Id)
            .all(conn)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(InvoiceDetail {
            invoice,
            customer,
            lines,
            additional_items,
        })
    }

    /// Newest invoices first.
    pub async fn list_invoices(
        &self,
        filter: InvoiceFilter,
        page: u64,
        per_page: u64,
    ) -> Result<Page<invoice::Model>, ServiceError> {
        let mut query = Invoice::find();
        if let Some(number) = filter.number.as_deref().filter(|n| !n.trim().is_empty()) {
            query = query.filter(invoice::Column::Number.contains(number.trim()));
        }
        if let Some(id) = filter.customer_id {
            query = query.filter(invoice::Column::CustomerId.eq(id));
        }
        if let Some(id) = filter.salesman_id {
            query = query.filter(invoice::Column::SalesmanId.eq(id));
        }
        if let Some(id) = filter.deliveryman_id {
            query = query.filter(invoice::Column::DeliverymanId.eq(id));
        }
        if let Some(from) = filter.delivered_from {
            query = query.filter(invoice::Column::DeliveryDate.gte(from));
        }
        if let Some(to) = filter.delivered_to {
            query = query.filter(invoice::Column::DeliveryDate.lte(to));
        }
        if filter.unpaid_only {
            query = query.filter(invoice::Column::PaymentDate.is_null());
        }

        let paginator = query
            .order_by_desc(invoice::Column::CreatedAt)
            .order_by_desc(invoice::Column::Id)
            .paginate(self.db.as_ref(), per_page.max(1));
        Page::fetch(paginator, page, per_page).await
    }

    /// Edits header fields. Salesman and terms fall back to the customer's.
    #[instrument(skip(self, input))]
    pub async fn update_invoice(
        &self,
        id: i32,
        input: UpdateInvoiceInput,
    ) -> Result<invoice::Model, ServiceError> {
        input.validate()?;

        let (invoice, postings, paid) = db::transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move {
                let current = find_invoice(txn, id).await?;
                let customer_id = input.customer_id.unwrap_or(current.customer_id);
                let customer = find_customer(txn, customer_id).await?;
                let newly_paid = input.payment_date.is_some() && current.payment_date.is_none();

                let salesman_id = input
                    .salesman_id
                    .or(current.salesman_id)
                    .or(customer.salesman_id);
                let terms = non_empty(input.terms)
                    .or_else(|| current.terms.clone())
                    .or(customer.terms);

                let mut am: invoice::ActiveModel = current.into();
                if let Some(number) = non_empty(input.number) {
                    am.number = Set(number);
                }
                am.customer_id = Set(customer.id);
                am.salesman_id = Set(salesman_id);
                am.terms = Set(terms);
                if let Some(id) = input.deliveryman_id {
                    am.deliveryman_id = Set(Some(id));
                }
                if let Some(order_number) = input.order_number {
                    am.order_number = Set(Some(order_number));
                }
                if let Some(sample_customer) = input.sample_customer {
                    am.sample_customer = Set(Some(sample_customer));
                }
                if let Some(cheque_detail) = input.cheque_detail {
                    am.cheque_detail = Set(Some(cheque_detail));
                }
                if let Some(date) = input.payment_date {
                    am.payment_date = Set(Some(date));
                }
                if let Some(date) = input.deposit_date {
                    am.deposit_date = Set(Some(date));
                }
                let updated = am.update(txn).await.map_err(db_err)?;

                let (updated, postings) = match input.delivery_date {
                    Some(date) if updated.delivery_date != Some(date) => {
                        apply_delivery_date(txn, updated, Some(date), None).await?
                    }
                    _ => (updated, 0),
                };
                Ok((updated, postings, newly_paid))
            })
        })
        .await?;

        self.event_sender
            .publish(Event::InvoiceUpdated(invoice.id))
            .await;
        if postings > 0 {
            self.publish_delivered(&invoice, postings).await;
        }
        if paid {
            self.publish_paid(&invoice).await;
        }
        Ok(invoice)
    }

    /// Sets (or clears) the delivery date of the invoice with `number`,
    /// optionally assigning the deliveryman by name.
    #[instrument(skip(self))]
    pub async fn set_delivery_date(
        &self,
        number: String,
        delivery_date: Option<NaiveDate>,
        deliveryman: Option<String>,
    ) -> Result<invoice::Model, ServiceError> {
        let (invoice, postings) = db::transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move {
                let deliveryman_id = match non_empty(deliveryman) {
                    Some(name) => Some(
                        Deliveryman::find()
                            .filter(deliveryman::Column::Name.eq(name.as_str()))
                            .one(txn)
                            .await
                            .map_err(db_err)?
                            .ok_or_else(|| ServiceError::not_found("Deliveryman", &name))?
                            .id,
                    ),
                    None => None,
                };
                let invoice = find_invoice_by_number(txn, &number).await?;
                apply_delivery_date(txn, invoice, delivery_date, deliveryman_id).await
            })
        })
        .await?;

        if postings > 0 {
            self.publish_delivered(&invoice, postings).await;
        } else {
            self.event_sender
                .publish(Event::InvoiceUpdated(invoice.id))
                .await;
        }
        Ok(invoice)
    }

    #[instrument(skip(self))]
    pub async fn set_payment_date(
        &self,
        number: String,
        payment_date: Option<NaiveDate>,
        cheque_detail: Option<String>,
    ) -> Result<invoice::Model, ServiceError> {
        let invoice = find_invoice_by_number(self.db.as_ref(), &number).await?;
        let newly_paid = payment_date.is_some() && invoice.payment_date.is_none();

        let mut am: invoice::ActiveModel = invoice.into();
        am.payment_date = Set(payment_date);
        if let Some(detail) = non_empty(cheque_detail) {
            am.cheque_detail = Set(Some(detail));
        }
        let updated = am
            .update(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        if newly_paid {
            self.publish_paid(&updated).await;
        } else {
            self.event_sender
                .publish(Event::InvoiceUpdated(updated.id))
                .await;
        }
        Ok(updated)
    }

    /// Returns every line's stock and removes the invoice with its lines and
    /// additional items. Ledger history is kept.
    #[instrument(skip(self))]
    pub async fn delete_invoice(&self, id: i32) -> Result<(), ServiceError> {
        let (number, movements) = db::transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move {
                let invoice = find_invoice(txn, id).await?;
                let mut movements: Vec<StockMovement> = Vec::new();
                for line in lines_of(txn, id).await? {
                    let product = find_product(txn, line.product_id).await?;
                    movements.push(
                        apply_stock_change(
                            txn,
                            &product,
                            line.quantity,
                            TransactionType::Restock,
                            format!("Invoice {} deleted", invoice.number),
                            Some(invoice.id),
                        )
                        .await?,
                    );
                }

                InvoiceItem::delete_many()
                    .filter(invoice_item::Column::InvoiceId.eq(id))
                    .exec(txn)
                    .await
                    .map_err(db_err)?;
                AdditionalItem::delete_many()
                    .filter(additional_item::Column::InvoiceId.eq(id))
                    .exec(txn)
                    .await
                    .map_err(db_err)?;
                let number = invoice.number.clone();
                invoice.delete(txn).await.map_err(db_err)?;
                Ok((number, movements))
            })
        })
        .await?;

        info!(invoice_id = id, number = %number, "Invoice deleted");
        publish_movements(&self.event_sender, &movements).await;
        self.event_sender
            .publish(Event::InvoiceDeleted {
                invoice_id: id,
                number,
            })
            .await;
        Ok(())
    }

    /// Repeat order: a new invoice under the next number for the same
    /// customer, carrying over only the lines current stock can cover.
    #[instrument(skip(self))]
    pub async fn copy_invoice(&self, number: String) -> Result<InvoiceDetail, ServiceError> {
        let policy = self.pricing.clone();

        let (invoice, outcomes, skipped) = db::transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move {
                let source = find_invoice_by_number(txn, &number).await?;
                let new_number = next_number(txn).await?;

                let created = invoice::ActiveModel {
                    number: Set(new_number),
                    customer_id: Set(source.customer_id),
                    salesman_id: Set(source.salesman_id),
                    deliveryman_id: Set(source.deliveryman_id),
                    terms: Set(source.terms.clone()),
                    total_price: Set(Decimal::ZERO),
                    sale_posted: Set(false),
                    ..Default::default()
                }
                .insert(txn)
                .await
                .map_err(db_err)?;

                let mut outcomes: Vec<LineChangeOutcome> = Vec::new();
                let mut skipped = 0usize;
                for line in lines_of(txn, source.id).await? {
                    let product = find_product(txn, line.product_id).await?;
                    if line.quantity <= Decimal::ZERO || line.quantity > product.quantity {
                        skipped += 1;
                        continue;
                    }
                    outcomes.push(
                        apply_line_change_in(
                            txn,
                            &policy,
                            LineChange::Create {
                                invoice_id: created.id,
                                line: NewInvoiceLine {
                                    product_id: line.product_id,
                                    quantity: line.quantity,
                                    net_price: line.net_price,
                                    hide_nett: line.hide_nett,
                                    product_type: line.product_type,
                                },
                            },
                        )
                        .await?,
                    );
                }

                let invoice = find_invoice(txn, created.id).await?;
                Ok((invoice, outcomes, skipped))
            })
        })
        .await?;

        if skipped > 0 {
            warn!(
                invoice_id = invoice.id,
                skipped, "Lines without enough stock were not copied"
            );
        }
        self.event_sender
            .publish(Event::InvoiceCreated {
                invoice_id: invoice.id,
                number: invoice.number.clone(),
            })
            .await;
        for outcome in &outcomes {
            publish_line_outcome(&self.event_sender, outcome).await;
        }

        self.get_invoice_detail(invoice.id).await
    }

    pub async fn add_additional_item(
        &self,
        invoice_id: i32,
        input: AdditionalItemInput,
    ) -> Result<additional_item::Model, ServiceError> {
        input.validate()?;
        let invoice = self.get_invoice(invoice_id).await?;

        additional_item::ActiveModel {
            invoice_id: Set(invoice.id),
            description: Set(input.description.trim().to_string()),
            price: Set(input.price),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .map_err(ServiceError::db_error)
    }

    pub async fn remove_additional_item(&self, item_id: i32) -> Result<(), ServiceError> {
        let result = AdditionalItem::delete_by_id(item_id)
            .exec(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Additional item", item_id));
        }
        Ok(())
    }

    /// Invoices delivered but not yet paid, excluding samples.
    pub async fn unpaid_invoices(&self) -> Result<Vec<invoice::Model>, ServiceError> {
        Invoice::find()
            .filter(invoice::Column::DeliveryDate.is_not_null())
            .filter(invoice::Column::PaymentDate.is_null())
            .filter(invoice::Column::Number.not_like(format!("{}%", SAMPLE_PREFIX)))
            .order_by_asc(invoice::Column::DeliveryDate)
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Number of invoices stored.
    pub async fn count(&self) -> Result<u64, ServiceError> {
        Invoice::find()
            .count(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    async fn publish_delivered(&self, invoice: &invoice::Model, postings: usize) {
        self.event_sender
            .publish(Event::InvoiceDelivered {
                invoice_id: invoice.id,
                number: invoice.number.clone(),
                postings,
            })
            .await;
    }

    async fn publish_paid(&self, invoice: &invoice::Model) {
        self.event_sender
            .publish(Event::InvoicePaid {
                invoice_id: invoice.id,
                number: invoice.number.clone(),
            })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_strings_are_treated_as_missing() {
        assert_eq!(non_empty(Some("  ".into())), None);
        assert_eq!(non_empty(Some(" 34984 ".into())), Some("34984".to_string()));
        assert_eq!(non_empty(None), None);
    }

    #[test]
    fn create_input_accepts_minimal_body() {
        let input: CreateInvoiceInput = serde_json::from_str(r#"{"customer_id": 7}"#).unwrap();
        assert_eq!(input.customer_id, 7);
        assert!(input.number.is_none());
        assert!(input.lines.is_empty());
        assert!(input.validate().is_ok());
    }

    #[test]
    fn empty_number_fails_validation() {
        let input = CreateInvoiceInput {
            number: Some(String::new()),
            customer_id: 1,
            ..Default::default()
        };
        assert!(input.validate().is_err());
    }
}
