// Stock and ledger
pub mod inventory;

// Invoice lifecycle
pub mod invoice_items;
pub mod invoicing;
pub mod numbering;
pub mod pricing;

// Customers, salesmen, deliverymen, special prices
pub mod master_data;

// Commission and sales reporting
pub mod reports;

use crate::errors::ServiceError;
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, Paginator, SelectorTrait};
use serde::Serialize;
use validator::ValidationError;

/// One page of a listing plus the total row count.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

impl<T> Page<T> {
    /// Fetches 1-based `page` from a paginator built with `per_page`.
    pub async fn fetch<'db, C, S>(
        paginator: Paginator<'db, C, S>,
        page: u64,
        per_page: u64,
    ) -> Result<Self, ServiceError>
    where
        C: ConnectionTrait,
        S: SelectorTrait<Item = T> + 'db,
    {
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;
        Ok(Self {
            items,
            total,
            page: page.max(1),
            per_page,
        })
    }
}

pub(crate) fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("negative_amount"));
    }
    Ok(())
}
