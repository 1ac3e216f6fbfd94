//! Service catalogue commands.
//!
//! # Usage
//!
//! ```bash
//! garage services list
//! garage services add "Oil change" --price 1200 --description "Synthetic oil"
//! garage services remove 4
//! ```

use garage_client::ServiceInput;
use garage_core::{Role, ServiceId};
use rust_decimal::Decimal;

use super::{CommandError, Context};
use crate::output;

/// List the service catalogue.
///
/// # Errors
///
/// Returns `CommandError::Desk` if nobody is signed in or the list fails.
pub async fn list(ctx: &Context) -> Result<(), CommandError> {
    ctx.desk.require_session()?;
    let services = ctx.api().list_services().await?;
    if services.is_empty() {
        output::line("No services.");
    }
    for service in &services {
        output::line(output::service_row(service));
    }
    Ok(())
}

/// Add a service to the catalogue.
///
/// # Errors
///
/// Returns `CommandError::Invalid` for a blank name or non-positive price, or
/// `CommandError::Desk` for a non-admin session or a backend refusal.
pub async fn add(
    ctx: &Context,
    name: String,
    price: Decimal,
    description: Option<String>,
) -> Result<(), CommandError> {
    ctx.desk.require(Role::Admin)?;
    let input = ServiceInput {
        service_name: name.trim().to_string(),
        description: description.filter(|d| !d.trim().is_empty()),
        price,
    };
    input.validate().map_err(CommandError::Invalid)?;
    let service = ctx.api().create_service(&input).await?;
    output::line(format!(
        "Service #{} added: {} at {}.",
        service.id,
        service.service_name,
        service.price_label()
    ));
    Ok(())
}

/// Remove a service from the catalogue.
///
/// # Errors
///
/// Returns `CommandError::Desk` for a non-admin session or a backend refusal.
pub async fn remove(ctx: &Context, id: ServiceId) -> Result<(), CommandError> {
    ctx.desk.require(Role::Admin)?;
    ctx.api().delete_service(id).await?;
    output::line(format!("Service #{id} removed."));
    Ok(())
}
