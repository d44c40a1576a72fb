//! Database entities.

pub mod additional_item;
pub mod customer;
pub mod deliveryman;
pub mod invoice;
pub mod invoice_item;
pub mod product;
pub mod product_transaction;
pub mod salesman;
pub mod special_price;
