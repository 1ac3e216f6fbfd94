//! Vehicle commands.
//!
//! # Usage
//!
//! ```bash
//! garage vehicles list
//! garage vehicles add KA01AB1234 Sedan
//! garage vehicles remove 3
//! ```

use garage_client::VehicleInput;
use garage_core::{Role, VehicleId};

use super::{CommandError, Context};
use crate::output;

/// List vehicles. Admins see every vehicle; customers see their own.
///
/// # Errors
///
/// Returns `CommandError::Desk` if nobody is signed in or the list fails.
pub async fn list(ctx: &Context) -> Result<(), CommandError> {
    ctx.desk.require_session()?;
    let vehicles = ctx.api().list_vehicles().await?;
    if vehicles.is_empty() {
        output::line("No vehicles.");
    }
    for vehicle in &vehicles {
        output::line(output::vehicle_row(vehicle));
    }
    Ok(())
}

/// Register a vehicle to the signed-in customer.
///
/// # Errors
///
/// Returns `CommandError::Invalid` for blank fields, or `CommandError::Desk`
/// for a non-customer session or a backend refusal.
pub async fn add(ctx: &Context, number: String, vehicle_type: String) -> Result<(), CommandError> {
    ctx.desk.require(Role::Customer)?;
    let input = VehicleInput {
        customer_id: None,
        vehicle_number: number.trim().to_uppercase(),
        vehicle_type: vehicle_type.trim().to_string(),
    };
    input.validate().map_err(CommandError::Invalid)?;
    let vehicle = ctx.api().create_vehicle(&input).await?;
    output::line(format!("Vehicle #{} added: {}.", vehicle.id, vehicle.label()));
    Ok(())
}

/// Remove one of the signed-in customer's vehicles.
///
/// # Errors
///
/// Returns `CommandError::Desk` for a non-customer session or a backend
/// refusal.
pub async fn remove(ctx: &Context, id: VehicleId) -> Result<(), CommandError> {
    ctx.desk.require(Role::Customer)?;
    ctx.api().delete_vehicle(id).await?;
    output::line(format!("Vehicle #{id} removed."));
    Ok(())
}
