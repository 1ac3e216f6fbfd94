//! Customer commands.
//!
//! # Usage
//!
//! ```bash
//! # Admin
//! garage customers list
//! garage customers toggle 7
//!
//! # Customer
//! garage customers me
//! ```

use garage_core::{CustomerId, Role};

use super::{CommandError, Context};
use crate::output;

/// List customer accounts.
///
/// # Errors
///
/// Returns `CommandError::Desk` for a non-admin session or a failed request.
pub async fn list(ctx: &Context) -> Result<(), CommandError> {
    ctx.desk.require(Role::Admin)?;
    let customers = ctx.api().list_customers().await?;
    if customers.is_empty() {
        output::line("No customers.");
    }
    for customer in &customers {
        output::line(output::customer_row(customer));
    }
    Ok(())
}

/// Show the signed-in customer's profile.
///
/// # Errors
///
/// Returns `CommandError::Desk` for a non-customer session or a failed
/// request.
pub async fn me(ctx: &Context) -> Result<(), CommandError> {
    ctx.desk.require(Role::Customer)?;
    let customer = ctx.api().my_profile().await?;
    output::line(output::customer_row(&customer));
    if let Some(email) = customer.user.as_ref().and_then(|u| u.email.as_deref()) {
        output::line(format!("  Email: {email}"));
    }
    Ok(())
}

/// Suspend an active customer or reactivate a suspended one.
///
/// # Errors
///
/// Returns `CommandError::Desk` for a non-admin session or a failed request.
pub async fn toggle(ctx: &Context, id: CustomerId) -> Result<(), CommandError> {
    ctx.desk.require(Role::Admin)?;
    match ctx.api().toggle_customer_status(id).await? {
        Some(true) => output::line(format!("Customer #{id} is active.")),
        Some(false) => output::line(format!("Customer #{id} is suspended.")),
        None => output::line(format!("Customer #{id} status toggled.")),
    }
    Ok(())
}
