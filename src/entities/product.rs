use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    /// List price per pack
    pub price: Decimal,
    /// On-hand stock, may be fractional and may go negative
    pub quantity: Decimal,
    pub unit: Option<String>,
    pub units_per_pack: i32,
    pub unit_per_box: i32,
    pub box_amount: i32,
    pub box_remain: Decimal,
    pub supplier: Option<String>,
    pub import_date: Option<NaiveDate>,
    pub import_invoice_number: Option<String>,
    pub registration_code: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    /// Bumped on every stock write; guards read-modify-write races
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::invoice_item::Entity")]
    InvoiceItems,
    #[sea_orm(has_many = "super::product_transaction::Entity")]
    Transactions,
}

impl Related<super::invoice_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InvoiceItems.def()
    }
}

impl Related<super::product_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

/// Whole boxes and loose remainder for `quantity`, floor-divided by
/// `unit_per_box`. A non-positive box size yields `(0, quantity)`.
pub fn box_counts(quantity: Decimal, unit_per_box: i32) -> (i32, Decimal) {
    if unit_per_box <= 0 {
        return (0, quantity);
    }
    let per_box = Decimal::from(unit_per_box);
    let boxes = (quantity / per_box).floor();
    let remain = quantity - boxes * per_box;
    (boxes.to_i32().unwrap_or_default(), remain)
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

        if let (Some(quantity), Some(unit_per_box)) = (
            active_model.quantity.try_as_ref().copied(),
            active_model.unit_per_box.try_as_ref().copied(),
        ) {
            let (boxes, remain) = box_counts(quantity, unit_per_box);
            active_model.box_amount = Set(boxes);
            active_model.box_remain = Set(remain);
        }
        Ok(active_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn box_counts_divides_by_box_size() {
        assert_eq!(box_counts(dec!(25), 10), (2, dec!(5)));
        assert_eq!(box_counts(dec!(30), 10), (3, dec!(0)));
        assert_eq!(box_counts(dec!(7.5), 2), (3, dec!(1.5)));
    }

    #[test]
    fn box_counts_without_box_size() {
        assert_eq!(box_counts(dec!(12), 0), (0, dec!(12)));
        assert_eq!(box_counts(dec!(12), -4), (0, dec!(12)));
    }

    #[test]
    fn box_counts_floor_negative_stock() {
        assert_eq!(box_counts(dec!(-5), 10), (-1, dec!(5)));
    }
}
