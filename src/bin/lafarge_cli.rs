use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use lafarge_api::{
    config::{self, AppConfig},
    db::{self, DbPool},
    events::{Event, EventSender},
    handlers::AppServices,
};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Parser)]
#[command(
    name = "lafarge",
    about = "Lafarge CLI for database maintenance and reports",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON when available"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Print the next free invoice number
    NextInvoiceNumber,
    /// Commission of every eligible salesman for a month
    Commissions {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
    },
    /// Outstanding invoices grouped by customer
    Unpaid,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize().await?;

    match cli.command {
        Commands::Migrate => {
            db::run_migrations(&context.db)
                .await
                .context("failed to run migrations")?;
            println!("Migrations applied");
        }
        Commands::NextInvoiceNumber => {
            let number = context
                .services
                .invoices
                .generate_next_number()
                .await
                .context("failed to compute next invoice number")?;
            if cli.json {
                print_json(&serde_json::json!({ "number": number }))?;
            } else {
                println!("{}", number);
            }
        }
        Commands::Commissions { year, month } => {
            let commissions = context
                .services
                .reports
                .all_salesmen_commissions(year, month)
                .await
                .context("failed to compute commissions")?;
            if cli.json {
                print_json(&commissions)?;
            } else if commissions.is_empty() {
                println!("No commission-eligible salesmen configured");
            } else {
                for row in &commissions {
                    println!("- {} • {}", row.salesman, row.commission.normalize());
                }
            }
        }
        Commands::Unpaid => {
            let summary = context
                .services
                .reports
                .unpaid_summary()
                .await
                .context("failed to load unpaid invoices")?;
            if cli.json {
                print_json(&summary)?;
            } else {
                for customer in &summary.customers {
                    println!(
                        "- {} • {} invoice(s) • {}",
                        customer.customer,
                        customer.invoices.len(),
                        customer.total_unpaid.normalize()
                    );
                }
                println!("Total unpaid: {}", summary.total_unpaid.normalize());
            }
        }
    }

    Ok(())
}

struct CliContext {
    db: Arc<DbPool>,
    services: AppServices,
}

impl CliContext {
    async fn initialize() -> Result<Self> {
        let config: AppConfig =
            config::load_config().context("failed to load application config")?;
        config::init_tracing(config.log_level(), config.log_json);

        let db_pool = db::establish_connection_from_app_config(&config)
            .await
            .context("failed to connect to database")?;
        let db = Arc::new(db_pool);

        let (event_tx, mut event_rx) = mpsc::channel::<Event>(32);
        let event_sender = EventSender::new(event_tx);

        tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                debug!(target: "lafarge_cli", event = ?event, "received async event");
            }
        });

        let services = AppServices::new(db.clone(), event_sender, &config);
        Ok(Self { db, services })
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
