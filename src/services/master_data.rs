use crate::{
    db::DbPool,
    entities::{
        customer::{self, Entity as Customer},
        deliveryman::{self, Entity as Deliveryman},
        invoice::{self, Entity as Invoice},
        product::{self, Entity as Product},
        salesman::{self, Entity as Salesman},
        special_price::{self, Entity as SpecialPrice},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{pricing::extract_base_name, validate_non_negative, Page},
};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateCustomerInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub care_of: Option<String>,
    #[serde(default)]
    pub address: String,
    pub telephone_number: Option<String>,
    pub salesman_id: Option<i32>,
    pub terms: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCustomerInput {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub care_of: Option<String>,
    pub address: Option<String>,
    pub telephone_number: Option<String>,
    pub salesman_id: Option<i32>,
    pub terms: Option<String>,
}

/// Salesmen and deliverymen share the same shape.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StaffInput {
    #[validate(length(min = 1, max = 32))]
    pub code: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct StaffPatch {
    #[validate(length(min = 1, max = 32))]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SpecialPriceInput {
    /// A full product name is accepted and cut to its base name
    #[validate(length(min = 1, max = 255))]
    pub product_base_name: String,
    #[validate(custom = "validate_non_negative")]
    pub special_price: Decimal,
}

/// Lower rank sorts first: name, then care of, address, telephone.
fn match_rank(customer: &customer::Model, needle: &str) -> u8 {
    let hit = |field: Option<&str>| {
        field
            .map(|value| value.to_lowercase().contains(needle))
            .unwrap_or(false)
    };
    if hit(Some(&customer.name)) {
        0
    } else if hit(customer.care_of.as_deref()) {
        1
    } else if hit(Some(&customer.address)) {
        2
    } else if hit(customer.telephone_number.as_deref()) {
        3
    } else {
        4
    }
}

fn lower_contains(column: customer::Column, needle: &str) -> sea_orm::sea_query::SimpleExpr {
    Expr::expr(Func::lower(Expr::col((Customer, column)))).like(format!("%{}%", needle))
}

#[derive(Clone)]
pub struct MasterDataService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl MasterDataService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    // ---- customers ----

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_customer(
        &self,
        input: CreateCustomerInput,
    ) -> Result<customer::Model, ServiceError> {
        input.validate()?;
        if let Some(id) = input.salesman_id {
            self.get_salesman(id).await?;
        }

        let model = customer::ActiveModel {
            name: Set(input.name.trim().to_string()),
            care_of: Set(input.care_of),
            address: Set(input.address),
            telephone_number: Set(input.telephone_number),
            salesman_id: Set(input.salesman_id),
            terms: Set(input.terms),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .map_err(ServiceError::db_error)?;

        info!(customer_id = model.id, "Customer created");
        self.event_sender
            .publish(Event::CustomerCreated(model.id))
            .await;
        Ok(model)
    }

    pub async fn get_customer(&self, id: i32) -> Result<customer::Model, ServiceError> {
        Customer::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found("Customer", id))
    }

    pub async fn list_customers(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<Page<customer::Model>, ServiceError> {
        let paginator = Customer::find()
            .order_by_asc(customer::Column::Name)
            .order_by_asc(customer::Column::Id)
            .paginate(self.db.as_ref(), per_page.max(1));
        Page::fetch(paginator, page, per_page).await
    }

    pub async fn update_customer(
        &self,
        id: i32,
        input: UpdateCustomerInput,
    ) -> Result<customer::Model, ServiceError> {
        input.validate()?;
        let current = self.get_customer(id).await?;
        if let Some(salesman_id) = input.salesman_id {
            self.get_salesman(salesman_id).await?;
        }

        let mut am = current.into_active_model();
        if let Some(name) = input.name {
            am.name = Set(name.trim().to_string());
        }
        if let Some(care_of) = input.care_of {
            am.care_of = Set(Some(care_of));
        }
        if let Some(address) = input.address {
            am.address = Set(address);
        }
        if let Some(telephone) = input.telephone_number {
            am.telephone_number = Set(Some(telephone));
        }
        if let Some(salesman_id) = input.salesman_id {
            am.salesman_id = Set(Some(salesman_id));
        }
        if let Some(terms) = input.terms {
            am.terms = Set(Some(terms));
        }
        let updated = am
            .update(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        self.event_sender
            .publish(Event::CustomerUpdated(updated.id))
            .await;
        Ok(updated)
    }

    /// Refused while invoices reference the customer. Special prices go with it.
    pub async fn delete_customer(&self, id: i32) -> Result<(), ServiceError> {
        let customer = self.get_customer(id).await?;
        let invoices = Invoice::find()
            .filter(invoice::Column::CustomerId.eq(id))
            .count(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;
        if invoices > 0 {
            return Err(ServiceError::InvalidOperation(format!(
                "Customer '{}' has {} invoice(s)",
                customer.name, invoices
            )));
        }

        SpecialPrice::delete_many()
            .filter(special_price::Column::CustomerId.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;
        Customer::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;
        info!(customer_id = id, "Customer deleted");
        Ok(())
    }

    /// Case-insensitive search over name, care of, address and telephone,
    /// ranked in that order of field.
    pub async fn search_customers(&self, term: &str) -> Result<Vec<customer::Model>, ServiceError> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let mut found = Customer::find()
            .filter(
                Condition::any()
                    .add(lower_contains(customer::Column::Name, &needle))
                    .add(lower_contains(customer::Column::CareOf, &needle))
                    .add(lower_contains(customer::Column::Address, &needle))
                    .add(lower_contains(customer::Column::TelephoneNumber, &needle)),
            )
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        found.sort_by(|a, b| {
            match_rank(a, &needle)
                .cmp(&match_rank(b, &needle))
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(found)
    }

    // ---- salesmen ----

    pub async fn create_salesman(&self, input: StaffInput) -> Result<salesman::Model, ServiceError> {
        input.validate()?;
        salesman::ActiveModel {
            code: Set(input.code.trim().to_string()),
            name: Set(input.name.trim().to_string()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .map_err(ServiceError::db_error)
    }

    pub async fn get_salesman(&self, id: i32) -> Result<salesman::Model, ServiceError> {
        Salesman::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found("Salesman", id))
    }

    pub async fn list_salesmen(&self) -> Result<Vec<salesman::Model>, ServiceError> {
        Salesman::find()
            .order_by_asc(salesman::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    pub async fn update_salesman(
        &self,
        id: i32,
        patch: StaffPatch,
    ) -> Result<salesman::Model, ServiceError> {
        patch.validate()?;
        let mut am = self.get_salesman(id).await?.into_active_model();
        if let Some(code) = patch.code {
            am.code = Set(code.trim().to_string());
        }
        if let Some(name) = patch.name {
            am.name = Set(name.trim().to_string());
        }
        am.update(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    // ---- deliverymen ----

    pub async fn create_deliveryman(
        &self,
        input: StaffInput,
    ) -> Result<deliveryman::Model, ServiceError> {
        input.validate()?;
        deliveryman::ActiveModel {
            code: Set(input.code.trim().to_string()),
            name: Set(input.name.trim().to_string()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .map_err(ServiceError::db_error)
    }

    pub async fn get_deliveryman(&self, id: i32) -> Result<deliveryman::Model, ServiceError> {
        Deliveryman::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found("Deliveryman", id))
    }

    pub async fn list_deliverymen(&self) -> Result<Vec<deliveryman::Model>, ServiceError> {
        Deliveryman::find()
            .order_by_asc(deliveryman::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    pub async fn update_deliveryman(
        &self,
        id: i32,
        patch: StaffPatch,
    ) -> Result<deliveryman::Model, ServiceError> {
        patch.validate()?;
        let mut am = self.get_deliveryman(id).await?.into_active_model();
        if let Some(code) = patch.code {
            am.code = Set(code.trim().to_string());
        }
        if let Some(name) = patch.name {
            am.name = Set(name.trim().to_string());
        }
        am.update(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    // ---- special prices ----

    /// Inserts a special price. A second price for the same customer and
    /// base name is a `Conflict`.
    #[instrument(skip(self, input))]
    pub async fn set_special_price(
        &self,
        customer_id: i32,
        input: SpecialPriceInput,
    ) -> Result<special_price::Model, ServiceError> {
        input.validate()?;
        self.get_customer(customer_id).await?;
        let base_name = extract_base_name(&input.product_base_name).to_string();
        if base_name.is_empty() {
            return Err(ServiceError::ValidationError(
                "product base name is empty".into(),
            ));
        }

        let model = special_price::ActiveModel {
            customer_id: Set(customer_id),
            product_base_name: Set(base_name),
            special_price: Set(input.special_price),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .map_err(ServiceError::db_error)?;

        self.publish_special_price(&model).await;
        Ok(model)
    }

    pub async fn update_special_price(
        &self,
        id: i32,
        price: Decimal,
    ) -> Result<special_price::Model, ServiceError> {
        validate_non_negative(&price)
            .map_err(|_| ServiceError::ValidationError("special price must not be negative".into()))?;
        let current = SpecialPrice::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found("Special price", id))?;

        let mut am = current.into_active_model();
        am.special_price = Set(price);
        let model = am
            .update(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        self.publish_special_price(&model).await;
        Ok(model)
    }

    pub async fn delete_special_price(&self, id: i32) -> Result<(), ServiceError> {
        let result = SpecialPrice::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Special price", id));
        }
        Ok(())
    }

    pub async fn list_special_prices(
        &self,
        customer_id: i32,
    ) -> Result<Vec<special_price::Model>, ServiceError> {
        self.get_customer(customer_id).await?;
        SpecialPrice::find()
            .filter(special_price::Column::CustomerId.eq(customer_id))
            .order_by_asc(special_price::Column::ProductBaseName)
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Distinct base names of all products, sorted.
    pub async fn available_base_names(&self) -> Result<Vec<String>, ServiceError> {
        let names: Vec<String> = Product::find()
            .select_only()
            .column(product::Column::Name)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        let base_names: BTreeSet<String> = names
            .iter()
            .map(|name| extract_base_name(name))
            .filter(|base| !base.is_empty())
            .map(str::to_string)
            .collect();
        Ok(base_names.into_iter().collect())
    }

    async fn publish_special_price(&self, model: &special_price::Model) {
        self.event_sender
            .publish(Event::SpecialPriceChanged {
                customer_id: model.customer_id,
                product_base_name: model.product_base_name.clone(),
            })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn customer(name: &str, care_of: Option<&str>, address: &str, tel: Option<&str>) -> customer::Model {
        customer::Model {
            id: 1,
            name: name.into(),
            care_of: care_of.map(Into::into),
            address: address.into(),
            telephone_number: tel.map(Into::into),
            salesman_id: None,
            terms: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn name_hits_outrank_other_fields() {
        let by_name = customer("Kwong Wah Clinic", None, "Nathan Road", None);
        let by_care_of = customer("Dr. Lee", Some("Kwong Wah"), "Mong Kok", None);
        let by_address = customer("Dr. Chan", None, "12 Kwong Wah St", None);
        let by_phone = customer("Dr. Ho", None, "Central", Some("2345 6789"));

        assert_eq!(match_rank(&by_name, "kwong wah"), 0);
        assert_eq!(match_rank(&by_care_of, "kwong wah"), 1);
        assert_eq!(match_rank(&by_address, "kwong wah"), 2);
        assert_eq!(match_rank(&by_phone, "6789"), 3);
        assert_eq!(match_rank(&by_phone, "nothing"), 4);
    }
}
