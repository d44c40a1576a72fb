use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event after a commit. The write already happened, so a closed
    /// channel is only logged.
    pub async fn publish(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("{}", e);
        }
    }
}

/// Things that happen to invoices and stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    ProductCreated(i32),
    ProductUpdated(i32),
    ProductDeleted(i32),
    StockChanged {
        product_id: i32,
        change: Decimal,
        quantity_after: Decimal,
        transaction_id: i32,
    },
    /// Stock was deducted below zero. Oversell is allowed; this is the warning hook.
    StockWentNegative {
        product_id: i32,
        product_name: String,
        quantity: Decimal,
    },

    InvoiceCreated {
        invoice_id: i32,
        number: String,
    },
    InvoiceUpdated(i32),
    InvoiceDeleted {
        invoice_id: i32,
        number: String,
    },
    InvoiceTotalChanged {
        invoice_id: i32,
        total_price: Decimal,
    },
    InvoiceDelivered {
        invoice_id: i32,
        number: String,
        postings: usize,
    },
    InvoicePaid {
        invoice_id: i32,
        number: String,
    },

    CustomerCreated(i32),
    CustomerUpdated(i32),
    SpecialPriceChanged {
        customer_id: i32,
        product_base_name: String,
    },
}

/// Drains the event channel, logging every event.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::StockWentNegative {
                product_id,
                product_name,
                quantity,
            } => {
                warn!(
                    product_id = *product_id,
                    product = %product_name,
                    quantity = %quantity,
                    "Product stock is negative"
                );
            }
            Event::InvoiceDelivered {
                invoice_id,
                number,
                postings,
            } => {
                info!(
                    invoice_id = *invoice_id,
                    number = %number,
                    postings = *postings,
                    "Invoice delivered; sale postings written"
                );
            }
            other => info!("Received event: {:?}", other),
        }
    }

    info!("Event processing loop stopped");
}
