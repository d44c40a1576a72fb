use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Human-assigned number; sample invoices are prefixed with "S-"
    #[sea_orm(unique)]
    pub number: String,
    pub customer_id: i32,
    pub salesman_id: Option<i32>,
    pub deliveryman_id: Option<i32>,
    pub terms: Option<String>,
    pub order_number: Option<String>,
    pub sample_customer: Option<String>,
    pub cheque_detail: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    pub payment_date: Option<NaiveDate>,
    pub deposit_date: Option<NaiveDate>,
    /// Sum of line `sum_price`s, maintained by the line lifecycle
    pub total_price: Decimal,
    /// Delivery sale postings were written
    pub sale_posted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn is_sample(&self) -> bool {
        self.number.starts_with("S-")
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
    #[sea_orm(
        belongs_to = "super::salesman::Entity",
        from = "Column::SalesmanId",
        to = "super::salesman::Column::Id"
    )]
    Salesman,
    #[sea_orm(
        belongs_to = "super::deliveryman::Entity",
        from = "Column::DeliverymanId",
        to = "super::deliveryman::Column::Id"
    )]
    Deliveryman,
    #[sea_orm(has_many = "super::invoice_item::Entity")]
    Items,
    #[sea_orm(has_many = "super::additional_item::Entity")]
    AdditionalItems,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::salesman::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Salesman.def()
    }
}

impl Related<super::deliveryman::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Deliveryman.def()
    }
}

impl Related<super::invoice_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::additional_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AdditionalItems.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();
        if let ActiveValue::NotSet = active_model.created_at {
            active_model.created_at = Set(now);
        }
        active_model.updated_at = Set(now);
        Ok(active_model)
    }
}
