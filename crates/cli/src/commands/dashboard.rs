//! Role dashboard.
//!
//! # Usage
//!
//! ```bash
//! garage dashboard
//! ```

use garage_core::Role;

use super::{CommandError, Context};
use crate::output;

/// Show the admin or customer overview, depending on who is signed in.
///
/// Sources that failed to load are listed after the summary.
///
/// # Errors
///
/// Returns `CommandError::Desk` if nobody is signed in or the session has
/// expired.
pub async fn show(ctx: &Context) -> Result<(), CommandError> {
    let principal = ctx.desk.require_session()?;
    let unavailable = match principal.role {
        Role::Admin => {
            let dashboard = ctx.desk.admin_dashboard().await?;
            output::line(&dashboard);
            dashboard.unavailable
        }
        Role::Customer => {
            let dashboard = ctx.desk.customer_dashboard().await?;
            output::line(&dashboard);
            dashboard.unavailable
        }
    };
    if !unavailable.is_empty() {
        output::line(format!("(Could not load: {})", unavailable.join(", ")));
    }
    Ok(())
}
