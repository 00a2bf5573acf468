use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{error, info};

use meal_delivery_core::{
    clock::SystemClock,
    config::{self, AppConfig},
    db::{self, DbPool},
    entities::inventory_transaction::TransactionType,
    events::{self, EventSender},
    services::{
        assignments::CreateAssignmentCommand,
        factory::{ServiceContainer, ServiceFactory},
        inventory_ledger::{ApplyInventoryTransaction, InventoryStatistics},
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize().await?;

    let result = match cli.command {
        Commands::Migrate => handle_migrate(&context).await,
        Commands::Inventory(command) => handle_inventory_command(&context, command, cli.json).await,
        Commands::Assignments(command) => {
            handle_assignments_command(&context, command, cli.json).await
        }
    };

    if let Err(e) = &result {
        error!("Command failed: {:#}", e);
    }
    db::close_pool((*context.db).clone())
        .await
        .context("failed to close database pool")?;
    result
}

#[derive(Parser)]
#[command(
    name = "meal-delivery",
    about = "Operator tool for meal-delivery scheduling and inventory",
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
    #[command(subcommand)]
    Inventory(InventoryCommands),
    #[command(subcommand)]
    Assignments(AssignmentCommands),
}

#[derive(Subcommand)]
enum InventoryCommands {
    /// Record a signed quantity change against an item
    Apply(InventoryApplyArgs),
    /// Summarize recent inventory activity
    Stats(InventoryStatsArgs),
    /// List items at or below their reorder threshold
    LowStock,
    /// Compare an item's balance with the sum of its ledger
    Verify(InventoryVerifyArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum TransactionKind {
    Receipt,
    Consumption,
    Adjustment,
}

impl From<TransactionKind> for TransactionType {
    fn from(kind: TransactionKind) -> Self {
        match kind {
            TransactionKind::Receipt => TransactionType::Receipt,
            TransactionKind::Consumption => TransactionType::Consumption,
            TransactionKind::Adjustment => TransactionType::Adjustment,
        }
    }
}

#[derive(Args)]
struct InventoryApplyArgs {
    #[arg(long, help = "Inventory item identifier")]
    item_id: i32,
    #[arg(
        long,
        allow_hyphen_values = true,
        help = "Signed quantity; negative values consume stock"
    )]
    quantity: i32,
    #[arg(long, value_enum, help = "Transaction type; inferred from the sign when omitted")]
    r#type: Option<TransactionKind>,
    #[arg(long, help = "User recording the transaction")]
    user: String,
    #[arg(long, help = "Optional free-form notes")]
    notes: Option<String>,
}

#[derive(Args)]
struct InventoryStatsArgs {
    #[arg(long, help = "Look-back window in days; defaults to the configured window")]
    window_days: Option<i64>,
}

#[derive(Args)]
struct InventoryVerifyArgs {
    #[arg(help = "Inventory item identifier")]
    item_id: i32,
}

#[derive(Subcommand)]
enum AssignmentCommands {
    /// Assign a volunteer to a route for one shift
    Create(AssignmentCreateArgs),
}

#[derive(Args)]
struct AssignmentCreateArgs {
    #[arg(long, help = "Volunteer identifier")]
    volunteer_id: i32,
    #[arg(long, help = "Route identifier")]
    route_id: i32,
    #[arg(long, help = "Scheduled start as RFC 3339, e.g. 2025-04-24T09:00:00Z")]
    date: DateTime<Utc>,
    #[arg(long, help = "Shift label, e.g. Morning")]
    shift: String,
    #[arg(long, help = "Optional free-form notes")]
    notes: Option<String>,
}

struct CliContext {
    config: Arc<AppConfig>,
    db: Arc<DbPool>,
    services: ServiceContainer,
}

impl CliContext {
    async fn initialize() -> Result<Self> {
        let config = config::load_config().context("failed to load application config")?;
        config::init_tracing(config.log_level(), config.log_json);

        let db_pool = db::establish_connection_from_app_config(&config)
            .await
            .context("failed to connect to database")?;
        db::check_connection(&db_pool)
            .await
            .context("database did not answer a ping")?;
        if config.auto_migrate {
            db::run_migrations(&db_pool)
                .await
                .context("failed running migrations")?;
        }
        let db = Arc::new(db_pool);

        let (event_sender, event_rx) = EventSender::channel(config.event_channel_capacity);
        tokio::spawn(events::process_events(event_rx));

        let config = Arc::new(config);
        let factory = ServiceFactory::new(
            db.clone(),
            event_sender,
            Arc::new(SystemClock),
            config.clone(),
        );
        let services = ServiceContainer::new(&factory);

        Ok(Self {
            config,
            db,
            services,
        })
    }
}

async fn handle_migrate(context: &CliContext) -> Result<()> {
    db::run_migrations(&context.db)
        .await
        .context("failed running migrations")?;
    info!("Migrations applied");
    println!("Migrations applied");
    Ok(())
}

async fn handle_inventory_command(
    context: &CliContext,
    command: InventoryCommands,
    json: bool,
) -> Result<()> {
    let ledger = &context.services.inventory;
    match command {
        InventoryCommands::Apply(args) => {
            let applied = ledger
                .apply_transaction(ApplyInventoryTransaction {
                    item_id: args.item_id,
                    signed_quantity: args.quantity,
                    transaction_type: args.r#type.map(Into::into),
                    user_id: args.user,
                    notes: args.notes,
                })
                .await
                .context("failed to apply inventory transaction")?;
            if json {
                print_json(&applied)?;
            } else {
                println!(
                    "Recorded {} of {} on item {} ({}); balance now {}",
                    applied.transaction.transaction_type,
                    applied.transaction.signed_quantity,
                    applied.item.id,
                    applied.item.name,
                    applied.item.current_quantity
                );
                if applied.reorder_point_reached {
                    println!(
                        "Reorder point reached; suggested reorder quantity {}",
                        applied.item.reorder_quantity
                    );
                }
            }
        }
        InventoryCommands::Stats(args) => {
            let window = args
                .window_days
                .unwrap_or(context.config.inventory_statistics_window_days);
            let stats = ledger
                .statistics(window)
                .await
                .context("failed to compute inventory statistics")?;
            if json {
                print_json(&stats)?;
            } else {
                render_statistics(&stats);
            }
        }
        InventoryCommands::LowStock => {
            let items = ledger
                .low_stock_items()
                .await
                .context("failed to list low-stock items")?;
            if json {
                print_json(&items)?;
            } else if items.is_empty() {
                println!("No items at or below their reorder threshold");
            } else {
                for item in items {
                    println!(
                        "- Item {} • {} • {} {} on hand • threshold {} • reorder {}",
                        item.id,
                        item.name,
                        item.current_quantity,
                        item.unit,
                        item.reorder_threshold,
                        item.reorder_quantity
                    );
                }
            }
        }
        InventoryCommands::Verify(args) => {
            let check = ledger
                .verify_item_balance(args.item_id)
                .await
                .context("failed to verify item balance")?;
            if json {
                print_json(&check)?;
            } else if check.consistent {
                println!(
                    "Item {} balance {} matches its ledger",
                    check.item_id, check.recorded_quantity
                );
            } else {
                println!(
                    "Item {} balance {} does NOT match ledger sum {}",
                    check.item_id, check.recorded_quantity, check.ledger_sum
                );
            }
        }
    }
    Ok(())
}

async fn handle_assignments_command(
    context: &CliContext,
    command: AssignmentCommands,
    json: bool,
) -> Result<()> {
    match command {
        AssignmentCommands::Create(args) => {
            let assignment = context
                .services
                .assignments
                .create_assignment(CreateAssignmentCommand {
                    volunteer_id: args.volunteer_id,
                    route_id: args.route_id,
                    scheduled_date: args.date,
                    shift_type: args.shift,
                    notes: args.notes,
                })
                .await
                .context("failed to create assignment")?;
            if json {
                print_json(&assignment)?;
            } else {
                println!(
                    "Assignment {} • volunteer {} • route {} • {} {} • {}",
                    assignment.id,
                    assignment.volunteer_id,
                    assignment.route_id,
                    assignment.scheduled_day,
                    assignment.shift_type,
                    assignment.status
                );
            }
        }
    }
    Ok(())
}

fn render_statistics(stats: &InventoryStatistics) {
    println!(
        "Inventory activity over the last {} days (since {}): {} transactions",
        stats.window_days, stats.since, stats.total_transactions
    );
    println!("By type:");
    for summary in &stats.by_type {
        println!(
            "- {} • {} transactions • {} units • avg {:.2}",
            summary.transaction_type,
            summary.count,
            summary.total_abs_quantity,
            summary.average_abs_quantity
        );
    }
    println!("Top users:");
    for user in &stats.top_users {
        println!("- {} • {} transactions", user.user_id, user.transaction_count);
    }
    println!("By category:");
    for category in &stats.by_category {
        println!(
            "- {} • {} transactions • {} units moved • net {}",
            category.category_name,
            category.transaction_count,
            category.total_abs_quantity,
            category.net_quantity
        );
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
