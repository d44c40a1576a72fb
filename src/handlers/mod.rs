pub mod common;
pub mod customers;
pub mod health;
pub mod invoices;
pub mod products;
pub mod reports;
pub mod staff;

use crate::{
    config::AppConfig,
    db::DbPool,
    events::EventSender,
    services::{
        inventory::InventoryService, invoice_items::InvoiceLineService,
        invoicing::InvoiceService, master_data::MasterDataService, pricing::PricingPolicy,
        reports::ReportService,
    },
};
use std::sync::Arc;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub inventory: Arc<InventoryService>,
    pub invoices: Arc<InvoiceService>,
    pub invoice_lines: Arc<InvoiceLineService>,
    pub master_data: Arc<MasterDataService>,
    pub reports: Arc<ReportService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender, config: &AppConfig) -> Self {
        let pricing = PricingPolicy::from(&config.pricing);

        Self {
            inventory: Arc::new(InventoryService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            invoices: Arc::new(InvoiceService::new(
                db_pool.clone(),
                event_sender.clone(),
                pricing.clone(),
            )),
            invoice_lines: Arc::new(InvoiceLineService::new(
                db_pool.clone(),
                event_sender.clone(),
                pricing,
            )),
            master_data: Arc::new(MasterDataService::new(db_pool.clone(), event_sender)),
            reports: Arc::new(ReportService::new(db_pool, config.commission.clone())),
        }
    }
}
