//! Garage Desk CLI - bookings, invoices and vehicles from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (the password can also come from GARAGE_PASSWORD)
//! garage login alice --password secret
//!
//! # Customer: add a vehicle and book a service
//! garage vehicles add KA01AB1234 Sedan
//! garage bookings create --vehicle 3 --service 1 --date 2026-11-02
//!
//! # Admin: work a booking through its lifecycle
//! garage bookings approve 12 --date 2026-11-03
//! garage bookings start 12
//! garage bookings complete 12
//! garage invoices generate 12 --charge 250 --description "Brake pads"
//! garage invoices mark-paid 5
//!
//! # Overview for whoever is signed in
//! garage dashboard
//! ```
//!
//! # Environment Variables
//!
//! - `GARAGE_API_URL` - Backend base URL (default `http://127.0.0.1:8000/api`)
//! - `GARAGE_TOKEN_PATH` - Where the session tokens are kept
//! - `GARAGE_LOG_JSON` - Emit logs as JSON lines when set
//! - `RUST_LOG` - Log filter (default `garage_client=info,garage_cli=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use garage_core::{BookingId, BookingStatus, CustomerId, InvoiceId, ServiceId, VehicleId};
use rust_decimal::Decimal;
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::Context;

#[derive(Parser)]
#[command(name = "garage")]
#[command(author, version, about = "Garage Desk command-line client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and keep the session on this machine
    Login {
        /// Account username
        username: String,

        /// Account password
        #[arg(short, long, env = "GARAGE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show who is signed in
    Whoami,
    /// Create a customer account
    Register {
        /// Account username
        username: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "GARAGE_PASSWORD", hide_env_values = true)]
        password: String,

        /// First name
        #[arg(long, default_value = "")]
        first_name: String,

        /// Last name
        #[arg(long, default_value = "")]
        last_name: String,
    },
    /// Work with bookings
    Bookings {
        #[command(subcommand)]
        action: BookingAction,
    },
    /// Work with invoices
    Invoices {
        #[command(subcommand)]
        action: InvoiceAction,
    },
    /// Manage customers (admin) or view your profile
    Customers {
        #[command(subcommand)]
        action: CustomerAction,
    },
    /// Manage vehicles
    Vehicles {
        #[command(subcommand)]
        action: VehicleAction,
    },
    /// Browse and manage the service catalogue
    Services {
        #[command(subcommand)]
        action: ServiceAction,
    },
    /// Show the dashboard for the signed-in role
    Dashboard,
}

#[derive(Subcommand)]
enum BookingAction {
    /// List bookings, newest first
    List {
        /// Only show bookings in this status (e.g. `PENDING`)
        #[arg(short, long)]
        status: Option<BookingStatus>,
    },
    /// Show one booking and the actions available on it
    Show { id: BookingId },
    /// Request a service for one of your vehicles
    Create {
        #[arg(long)]
        vehicle: VehicleId,

        #[arg(long)]
        service: ServiceId,

        /// Preferred date (YYYY-MM-DD), today or later
        #[arg(long)]
        date: NaiveDate,
    },
    /// Approve a pending booking for a date
    Approve {
        id: BookingId,

        /// Scheduled date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
    },
    /// Reject a pending booking
    Reject { id: BookingId },
    /// Start work on an approved booking
    Start { id: BookingId },
    /// Complete an in-progress booking
    Complete { id: BookingId },
    /// Cancel an approved booking
    Cancel { id: BookingId },
    /// Move an approved or in-progress booking to another date
    Reschedule {
        id: BookingId,

        /// New scheduled date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
    },
    /// Delete a booking
    Delete { id: BookingId },
}

#[derive(Subcommand)]
enum InvoiceAction {
    /// List invoices
    List {
        /// Only show unpaid invoices
        #[arg(long)]
        unpaid: bool,
    },
    /// Issue the invoice for a completed booking
    Generate {
        booking: BookingId,

        /// Extra charge on top of the service price
        #[arg(short, long, default_value = "0")]
        charge: Decimal,

        /// What the extra charge is for
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Mark an invoice as paid
    MarkPaid { id: InvoiceId },
    /// Replace an invoice's additional charge
    Charges {
        id: InvoiceId,

        #[arg(short, long)]
        charge: Decimal,

        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Save an invoice as a PDF
    Download {
        id: InvoiceId,

        /// Output file (default `invoice-<id>.pdf`)
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },
}

#[derive(Subcommand)]
enum CustomerAction {
    /// List customers
    List,
    /// Show your own profile
    Me,
    /// Suspend or reactivate a customer
    Toggle { id: CustomerId },
}

#[derive(Subcommand)]
enum VehicleAction {
    /// List vehicles
    List,
    /// Register a vehicle
    Add {
        /// Registration number
        number: String,

        /// Vehicle type (e.g. Sedan, SUV)
        vehicle_type: String,
    },
    /// Remove a vehicle
    Remove { id: VehicleId },
}

#[derive(Subcommand)]
enum ServiceAction {
    /// List services and prices
    List,
    /// Add a service to the catalogue
    Add {
        name: String,

        #[arg(short, long)]
        price: Decimal,

        #[arg(short, long)]
        description: Option<String>,
    },
    /// Remove a service from the catalogue
    Remove { id: ServiceId },
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("garage_client=info,garage_cli=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if std::env::var_os("GARAGE_LOG_JSON").is_some() {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::load()?;

    match cli.command {
        Commands::Login { username, password } => {
            commands::auth::login(&ctx, &username, SecretString::from(password)).await?;
        }
        Commands::Logout => commands::auth::logout(&ctx)?,
        Commands::Whoami => commands::auth::whoami(&ctx)?,
        Commands::Register {
            username,
            email,
            password,
            first_name,
            last_name,
        } => {
            commands::auth::register(
                &ctx,
                commands::auth::SignUp {
                    username,
                    email,
                    password: SecretString::from(password),
                    first_name,
                    last_name,
                },
            )
            .await?;
        }
        Commands::Bookings { action } => match action {
            BookingAction::List { status } => commands::bookings::list(&ctx, status).await?,
            BookingAction::Show { id } => commands::bookings::show(&ctx, id).await?,
            BookingAction::Create {
                vehicle,
                service,
                date,
            } => commands::bookings::create(&ctx, vehicle, service, date).await?,
            BookingAction::Approve { id, date } => {
                commands::bookings::approve(&ctx, id, date).await?;
            }
            BookingAction::Reject { id } => commands::bookings::reject(&ctx, id).await?,
            BookingAction::Start { id } => commands::bookings::start(&ctx, id).await?,
            BookingAction::Complete { id } => commands::bookings::complete(&ctx, id).await?,
            BookingAction::Cancel { id } => commands::bookings::cancel(&ctx, id).await?,
            BookingAction::Reschedule { id, date } => {
                commands::bookings::reschedule(&ctx, id, date).await?;
            }
            BookingAction::Delete { id } => commands::bookings::delete(&ctx, id).await?,
        },
        Commands::Invoices { action } => match action {
            InvoiceAction::List { unpaid } => commands::invoices::list(&ctx, unpaid).await?,
            InvoiceAction::Generate {
                booking,
                charge,
                description,
            } => commands::invoices::generate(&ctx, booking, charge, &description).await?,
            InvoiceAction::MarkPaid { id } => commands::invoices::mark_paid(&ctx, id).await?,
            InvoiceAction::Charges {
                id,
                charge,
                description,
            } => commands::invoices::charges(&ctx, id, charge, &description).await?,
            InvoiceAction::Download { id, output } => {
                commands::invoices::download(&ctx, id, output).await?;
            }
        },
        Commands::Customers { action } => match action {
            CustomerAction::List => commands::customers::list(&ctx).await?,
            CustomerAction::Me => commands::customers::me(&ctx).await?,
            CustomerAction::Toggle { id } => commands::customers::toggle(&ctx, id).await?,
        },
        Commands::Vehicles { action } => match action {
            VehicleAction::List => commands::vehicles::list(&ctx).await?,
            VehicleAction::Add {
                number,
                vehicle_type,
            } => commands::vehicles::add(&ctx, number, vehicle_type).await?,
            VehicleAction::Remove { id } => commands::vehicles::remove(&ctx, id).await?,
        },
        Commands::Services { action } => match action {
            ServiceAction::List => commands::services::list(&ctx).await?,
            ServiceAction::Add {
                name,
                price,
                description,
            } => commands::services::add(&ctx, name, price, description).await?,
            ServiceAction::Remove { id } => commands::services::remove(&ctx, id).await?,
        },
        Commands::Dashboard => commands::dashboard::show(&ctx).await?,
    }
    Ok(())
}
