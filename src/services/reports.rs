//! Read-only sales reporting: salesman months and commissions, product
//! analysis, unpaid and payment summaries, deliveryman runs.

use crate::{
    config::CommissionConfig,
    db::DbPool,
    entities::{
        customer::{self, Entity as Customer},
        deliveryman::Entity as Deliveryman,
        invoice::{self, Entity as Invoice},
        invoice_item::{self, Entity as InvoiceItem},
        product::Entity as Product,
        salesman::{self, Entity as Salesman},
    },
    errors::ServiceError,
    services::numbering::SAMPLE_PREFIX,
};
use chrono::{Datelike, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, instrument};

static LOT_ANNOTATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s*\(Lot\s*no\.?:?\s*[A-Za-z0-9-]+\)").expect("lot annotation pattern")
});

/// Product name without its `(Lot no: XXX)` annotation.
pub fn clean_product_name(name: &str) -> String {
    LOT_ANNOTATION.replace_all(name, "").trim().to_string()
}

/// Commission rate for a month's sales volume.
pub fn incentive_rate(sales: Decimal) -> Decimal {
    if sales < dec!(50000) {
        dec!(0.02)
    } else if sales < dec!(70000) {
        dec!(0.025)
    } else if sales < dec!(100000) {
        dec!(0.0325)
    } else if sales < dec!(130000) {
        dec!(0.04)
    } else if sales < dec!(170000) {
        dec!(0.05)
    } else {
        dec!(0.055)
    }
}

/// Week of the month a day falls into; days 29-31 join week 5.
pub fn week_of_month(day: u32) -> u8 {
    let week = (day.saturating_sub(1) / 7 + 1) as u8;
    week.min(5)
}

/// First and last day of a calendar month.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), ServiceError> {
    let invalid = || ServiceError::ValidationError(format!("invalid month {}-{:02}", year, month));
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let (next_year, next_month) = shift_month(year, month, 1);
    let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .ok_or_else(invalid)?;
    Ok((first, last))
}

/// `(year, month)` moved by `delta` months.
fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 + delta;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

fn month_name(year: i32, month: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.format("%B %Y").to_string())
        .unwrap_or_else(|| format!("{}-{:02}", year, month))
}

/// Groups lines by clean product name, keeping first-seen order:
/// `"Amoxil 500mg (2 + 3)"`.
fn summarize_items(lines: &[(invoice_item::Model, Option<String>)]) -> Vec<String> {
    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    for (line, product_name) in lines {
        let Some(name) = product_name else { continue };
        let clean = clean_product_name(name);
        let quantity = line.quantity.normalize().to_string();
        match grouped.iter_mut().find(|(n, _)| *n == clean) {
            Some((_, quantities)) => quantities.push(quantity),
            None => grouped.push((clean, vec![quantity])),
        }
    }
    grouped
        .into_iter()
        .map(|(name, quantities)| format!("{} ({})", name, quantities.join(" + ")))
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthTotal {
    pub year: i32,
    pub month: u32,
    pub name: String,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct SalesmanMonths {
    pub salesman: String,
    pub months: Vec<MonthTotal>,
}

/// Invoice as shown in report listings.
#[derive(Debug, Clone, Serialize)]
pub struct ReportInvoice {
    pub id: i32,
    pub number: String,
    pub customer: String,
    pub care_of: Option<String>,
    pub sample_customer: Option<String>,
    pub salesman: Option<String>,
    pub total_price: Decimal,
    pub delivery_date: Option<NaiveDate>,
    pub payment_date: Option<NaiveDate>,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekBucket {
    pub week: u8,
    pub invoices: Vec<ReportInvoice>,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct SalesmanMonthlyReport {
    pub salesman: String,
    pub year: i32,
    pub month: u32,
    pub weeks: Vec<WeekBucket>,
    pub monthly_total: Decimal,
    pub shared_invoices: Vec<ReportInvoice>,
    pub monthly_total_share: Decimal,
    pub share_percentage: Decimal,
    pub personal_share: Decimal,
    pub sales_monthly_total: Decimal,
    pub incentive_rate: Decimal,
    pub commission: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesmanCommission {
    pub salesman: String,
    pub commission: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductAnalysisRow {
    pub name: String,
    pub revenue: Decimal,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductAnalysis {
    pub year: i32,
    pub month: u32,
    pub name: String,
    pub products: Vec<ProductAnalysisRow>,
    pub total_revenue: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerUnpaid {
    pub customer_id: i32,
    pub customer: String,
    pub care_of: Option<String>,
    pub invoices: Vec<invoice::Model>,
    pub total_unpaid: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnpaidSummary {
    pub total_unpaid: Decimal,
    pub customers: Vec<CustomerUnpaid>,
    /// Oldest delivery month first
    pub months: Vec<MonthTotal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentGroup {
    pub cheque_detail: Option<String>,
    pub invoices: Vec<invoice::Model>,
    pub total_price: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentReport {
    pub year: i32,
    pub month: u32,
    pub groups: Vec<PaymentGroup>,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryDay {
    pub date: NaiveDate,
    pub invoices: Vec<ReportInvoice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliverymanReport {
    pub deliveryman: String,
    pub year: i32,
    pub month: u32,
    pub days: Vec<DeliveryDay>,
    pub total_invoices: usize,
}

#[derive(Clone)]
pub struct ReportService {
    db: Arc<DbPool>,
    commission: CommissionConfig,
}

impl ReportService {
    pub fn new(db: Arc<DbPool>, commission: CommissionConfig) -> Self {
        Self { db, commission }
    }

    async fn salesman(&self, id: i32) -> Result<salesman::Model, ServiceError> {
        Salesman::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found("Salesman", id))
    }

    async fn pooled_salesman_ids(&self) -> Result<Vec<i32>, ServiceError> {
        if self.commission.pooled_salesmen.is_empty() {
            return Ok(Vec::new());
        }
        let pooled = Salesman::find()
            .filter(salesman::Column::Name.is_in(self.commission.pooled_salesmen.clone()))
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;
        Ok(pooled.into_iter().map(|s| s.id).collect())
    }

    async fn delivered_between(
        &self,
        first: NaiveDate,
        last: NaiveDate,
        salesman_ids: Option<Vec<i32>>,
    ) -> Result<Vec<invoice::Model>, ServiceError> {
        let mut query = Invoice::find()
            .filter(invoice::Column::DeliveryDate.gte(first))
            .filter(invoice::Column::DeliveryDate.lte(last));
        if let Some(ids) = salesman_ids {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            query = query.filter(invoice::Column::SalesmanId.is_in(ids));
        }
        query
            .order_by_asc(invoice::Column::DeliveryDate)
            .order_by_asc(invoice::Column::Number)
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Loads customers, salesmen and lines for `invoices` and renders them.
    async fn report_invoices(
        &self,
        invoices: &[invoice::Model],
    ) -> Result<Vec<ReportInvoice>, ServiceError> {
        if invoices.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.db.as_ref();
        let invoice_ids: Vec<i32> = invoices.iter().map(|i| i.id).collect();
        let customer_ids: Vec<i32> = invoices.iter().map(|i| i.customer_id).collect();
        let salesman_ids: Vec<i32> = invoices.iter().filter_map(|i| i.salesman_id).collect();

        let customers: HashMap<i32, customer::Model> = Customer::find()
            .filter(customer::Column::Id.is_in(customer_ids))
            .all(conn)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        let salesmen: HashMap<i32, String> = Salesman::find()
            .filter(salesman::Column::Id.is_in(salesman_ids))
            .all(conn)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();

        let mut lines: HashMap<i32, Vec<(invoice_item::Model, Option<String>)>> = HashMap::new();
        for (line, product) in InvoiceItem::find()
            .filter(invoice_item::Column::InvoiceId.is_in(invoice_ids))
            .order_by_asc(invoice_item::Column::Id)
            .find_also_related(Product)
            .all(conn)
            .await
            .map_err(ServiceError::db_error)?
        {
            lines
                .entry(line.invoice_id)
                .or_default()
                .push((line, product.map(|p| p.name)));
        }

        Ok(invoices
            .iter()
            .map(|inv| {
                let customer = customers.get(&inv.customer_id);
                ReportInvoice {
                    id: inv.id,
                    number: inv.number.clone(),
                    customer: customer.map(|c| c.name.clone()).unwrap_or_default(),
                    care_of: customer.and_then(|c| c.care_of.clone()),
                    sample_customer: inv.sample_customer.clone(),
                    salesman: inv.salesman_id.and_then(|id| salesmen.get(&id).cloned()),
                    total_price: inv.total_price,
                    delivery_date: inv.delivery_date,
                    payment_date: inv.payment_date,
                    items: lines
                        .get(&inv.id)
                        .map(|l| summarize_items(l))
                        .unwrap_or_default(),
                }
            })
            .collect())
    }

    /// Delivered totals for the twelve months up to the salesman's latest
    /// delivery, skipping empty months. Newest first.
    #[instrument(skip(self))]
    pub async fn salesman_monthly_preview(
        &self,
        salesman_id: i32,
    ) -> Result<SalesmanMonths, ServiceError> {
        let salesman = self.salesman(salesman_id).await?;
        let latest = Invoice::find()
            .filter(invoice::Column::SalesmanId.eq(salesman_id))
            .filter(invoice::Column::DeliveryDate.is_not_null())
            .order_by_desc(invoice::Column::DeliveryDate)
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;
        let anchor = latest
            .and_then(|inv| inv.delivery_date)
            .unwrap_or_else(|| Utc::now().date_naive());

        let (start_year, start_month) = shift_month(anchor.year(), anchor.month(), -11);
        let (first, _) = month_bounds(start_year, start_month)?;
        let (_, last) = month_bounds(anchor.year(), anchor.month())?;
        let invoices = self
            .delivered_between(first, last, Some(vec![salesman_id]))
            .await?;

        let mut totals: BTreeMap<(i32, u32), Decimal> = BTreeMap::new();
        for inv in &invoices {
            if let Some(date) = inv.delivery_date {
                *totals.entry((date.year(), date.month())).or_default() += inv.total_price;
            }
        }

        let months = totals
            .into_iter()
            .rev()
            .filter(|(_, total)| *total > Decimal::ZERO)
            .map(|((year, month), total)| MonthTotal {
                year,
                month,
                name: month_name(year, month),
                total,
            })
            .collect();

        Ok(SalesmanMonths {
            salesman: salesman.name,
            months,
        })
    }

    /// Weekly breakdown and commission for one salesman and month.
    #[instrument(skip(self))]
    pub async fn salesman_monthly_report(
        &self,
        salesman_id: i32,
        year: i32,
        month: u32,
    ) -> Result<SalesmanMonthlyReport, ServiceError> {
        let salesman = self.salesman(salesman_id).await?;
        let (first, last) = month_bounds(year, month)?;

        let own = self
            .delivered_between(first, last, Some(vec![salesman_id]))
            .await?;
        let pooled_ids = self.pooled_salesman_ids().await?;
        let shared = self
            .delivered_between(first, last, Some(pooled_ids))
            .await?;

        let mut weeks: Vec<WeekBucket> = (1..=5)
            .map(|week| WeekBucket {
                week,
                invoices: Vec::new(),
                total: Decimal::ZERO,
            })
            .collect();
        let mut monthly_total = Decimal::ZERO;
        for report in self.report_invoices(&own).await? {
            let day = report.delivery_date.map(|d| d.day()).unwrap_or(1);
            let bucket = &mut weeks[usize::from(week_of_month(day)) - 1];
            bucket.total += report.total_price;
            monthly_total += report.total_price;
            bucket.invoices.push(report);
        }

        let monthly_total_share: Decimal = shared.iter().map(|inv| inv.total_price).sum();
        let share_percentage = self.commission.share_for(&salesman.name);
        let personal_share = monthly_total_share * share_percentage;
        let sales_monthly_total = monthly_total + personal_share;
        let rate = incentive_rate(sales_monthly_total);
        let commission = sales_monthly_total * rate * self.commission.tax_multiplier;

        Ok(SalesmanMonthlyReport {
            salesman: salesman.name,
            year,
            month,
            weeks,
            monthly_total,
            shared_invoices: self.report_invoices(&shared).await?,
            monthly_total_share,
            share_percentage,
            personal_share,
            sales_monthly_total,
            incentive_rate: rate,
            commission,
        })
    }

    /// Commission of every configured pool member for the month, in cents.
    #[instrument(skip(self))]
    pub async fn all_salesmen_commissions(
        &self,
        year: i32,
        month: u32,
    ) -> Result<Vec<SalesmanCommission>, ServiceError> {
        let (first, last) = month_bounds(year, month)?;
        let eligible = Salesman::find()
            .filter(salesman::Column::Name.is_in(self.commission.eligible_salesmen()))
            .order_by_asc(salesman::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        let pooled_ids = self.pooled_salesman_ids().await?;
        let monthly_total_share: Decimal = self
            .delivered_between(first, last, Some(pooled_ids))
            .await?
            .iter()
            .map(|inv| inv.total_price)
            .sum();

        let mut result = Vec::with_capacity(eligible.len());
        for salesman in eligible {
            let monthly_total: Decimal = self
                .delivered_between(first, last, Some(vec![salesman.id]))
                .await?
                .iter()
                .map(|inv| inv.total_price)
                .sum();
            let sales = monthly_total + monthly_total_share * self.commission.share_for(&salesman.name);
            let commission = sales * incentive_rate(sales) * self.commission.tax_multiplier;
            debug!(salesman = %salesman.name, %sales, %commission, "Commission computed");
            result.push(SalesmanCommission {
                salesman: salesman.name,
                commission: commission.round_dp(2),
            });
        }
        Ok(result)
    }

    /// Revenue and quantity per clean product name for lines on invoices
    /// delivered in the month, highest revenue first.
    pub async fn monthly_product_analysis(
        &self,
        year: i32,
        month: u32,
    ) -> Result<ProductAnalysis, ServiceError> {
        let (first, last) = month_bounds(year, month)?;
        let invoice_ids: Vec<i32> = self
            .delivered_between(first, last, None)
            .await?
            .iter()
            .map(|inv| inv.id)
            .collect();

        let mut grouped: HashMap<String, (Decimal, Decimal)> = HashMap::new();
        if !invoice_ids.is_empty() {
            for (line, product) in InvoiceItem::find()
                .filter(invoice_item::Column::InvoiceId.is_in(invoice_ids))
                .find_also_related(Product)
                .all(self.db.as_ref())
                .await
                .map_err(ServiceError::db_error)?
            {
                let Some(product) = product else { continue };
                let entry = grouped
                    .entry(clean_product_name(&product.name))
                    .or_default();
                entry.0 += line.sum_price;
                entry.1 += line.quantity;
            }
        }

        let mut products: Vec<ProductAnalysisRow> = grouped
            .into_iter()
            .map(|(name, (revenue, quantity))| ProductAnalysisRow {
                name,
                revenue,
                quantity,
            })
            .collect();
        products.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.name.cmp(&b.name)));
        let total_revenue = products.iter().map(|p| p.revenue).sum();

        Ok(ProductAnalysis {
            year,
            month,
            name: month_name(year, month),
            products,
            total_revenue,
        })
    }

    /// Delivered, unpaid, non-sample invoices: grand total, per customer and
    /// per delivery month.
    #[instrument(skip(self))]
    pub async fn unpaid_summary(&self) -> Result<UnpaidSummary, ServiceError> {
        let conn = self.db.as_ref();
        let unpaid = Invoice::find()
            .filter(invoice::Column::DeliveryDate.is_not_null())
            .filter(invoice::Column::PaymentDate.is_null())
            .filter(invoice::Column::Number.not_like(format!("{}%", SAMPLE_PREFIX)))
            .order_by_asc(invoice::Column::DeliveryDate)
            .order_by_asc(invoice::Column::Number)
            .all(conn)
            .await
            .map_err(ServiceError::db_error)?;

        let customer_ids: Vec<i32> = unpaid.iter().map(|i| i.customer_id).collect();
        let customers: HashMap<i32, customer::Model> = Customer::find()
            .filter(customer::Column::Id.is_in(customer_ids))
            .all(conn)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let total_unpaid = unpaid.iter().map(|i| i.total_price).sum();
        let mut months: BTreeMap<(i32, u32), Decimal> = BTreeMap::new();
        let mut by_customer: BTreeMap<i32, Vec<invoice::Model>> = BTreeMap::new();
        for inv in unpaid {
            if let Some(date) = inv.delivery_date {
                *months.entry((date.year(), date.month())).or_default() += inv.total_price;
            }
            by_customer.entry(inv.customer_id).or_default().push(inv);
        }

        let mut customer_rows: Vec<CustomerUnpaid> = by_customer
            .into_iter()
            .map(|(customer_id, invoices)| {
                let customer = customers.get(&customer_id);
                CustomerUnpaid {
                    customer_id,
                    customer: customer.map(|c| c.name.clone()).unwrap_or_default(),
                    care_of: customer.and_then(|c| c.care_of.clone()),
                    total_unpaid: invoices.iter().map(|i| i.total_price).sum(),
                    invoices,
                }
            })
            .collect();
        customer_rows.sort_by(|a, b| {
            a.customer
                .cmp(&b.customer)
                .then(a.customer_id.cmp(&b.customer_id))
        });

        Ok(UnpaidSummary {
            total_unpaid,
            customers: customer_rows,
            months: months
                .into_iter()
                .map(|((year, month), total)| MonthTotal {
                    year,
                    month,
                    name: month_name(year, month),
                    total,
                })
                .collect(),
        })
    }

    /// Invoices paid in the month, grouped by cheque.
    pub async fn monthly_payment_report(
        &self,
        year: i32,
        month: u32,
    ) -> Result<PaymentReport, ServiceError> {
        let (first, last) = month_bounds(year, month)?;
        let paid = Invoice::find()
            .filter(invoice::Column::PaymentDate.gte(first))
            .filter(invoice::Column::PaymentDate.lte(last))
            .order_by_asc(invoice::Column::ChequeDetail)
            .order_by_asc(invoice::Column::PaymentDate)
            .order_by_asc(invoice::Column::Number)
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        let mut groups: Vec<PaymentGroup> = Vec::new();
        for inv in paid {
            match groups
                .iter_mut()
                .find(|g| g.cheque_detail == inv.cheque_detail)
            {
                Some(group) => {
                    group.total_price += inv.total_price;
                    group.invoices.push(inv);
                }
                None => groups.push(PaymentGroup {
                    cheque_detail: inv.cheque_detail.clone(),
                    total_price: inv.total_price,
                    invoices: vec![inv],
                }),
            }
        }
        let total = groups.iter().map(|g| g.total_price).sum();

        Ok(PaymentReport {
            year,
            month,
            groups,
            total,
        })
    }

    /// A deliveryman's invoices for the month, grouped by delivery day.
    pub async fn deliveryman_monthly_report(
        &self,
        deliveryman_id: i32,
        year: i32,
        month: u32,
    ) -> Result<DeliverymanReport, ServiceError> {
        let deliveryman = Deliveryman::find_by_id(deliveryman_id)
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found("Deliveryman", deliveryman_id))?;
        let (first, last) = month_bounds(year, month)?;

        let invoices = Invoice::find()
            .filter(invoice::Column::DeliverymanId.eq(deliveryman_id))
            .filter(invoice::Column::DeliveryDate.gte(first))
            .filter(invoice::Column::DeliveryDate.lte(last))
            .order_by_asc(invoice::Column::DeliveryDate)
            .order_by_asc(invoice::Column::Number)
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;
        let total_invoices = invoices.len();

        let mut days: BTreeMap<NaiveDate, Vec<ReportInvoice>> = BTreeMap::new();
        for report in self.report_invoices(&invoices).await? {
            if let Some(date) = report.delivery_date {
                days.entry(date).or_default().push(report);
            }
        }

        Ok(DeliverymanReport {
            deliveryman: deliveryman.name,
            year,
            month,
            days: days
                .into_iter()
                .map(|(date, invoices)| DeliveryDay { date, invoices })
                .collect(),
            total_invoices,
        })
    }
}
