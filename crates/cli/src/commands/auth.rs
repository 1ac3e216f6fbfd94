//! Sign-in, sign-up and sign-out.
//!
//! # Usage
//!
//! ```bash
//! garage login alice --password secret
//! GARAGE_PASSWORD=secret garage register alice -e alice@example.com --first-name Alice
//! garage whoami
//! garage logout
//! ```

use garage_client::{FieldErrors, Registration};
use garage_core::Email;
use secrecy::SecretString;

use super::{CommandError, Context};
use crate::output;

/// Sign-up fields as typed on the command line.
pub struct SignUp {
    pub username: String,
    pub email: String,
    pub password: SecretString,
    pub first_name: String,
    pub last_name: String,
}

impl SignUp {
    fn into_registration(self) -> Result<Registration, FieldErrors> {
        let mut errors = FieldErrors::default();
        if self.username.trim().is_empty() {
            errors.push("username", "This field may not be blank.");
        }
        let email = match Email::parse(&self.email) {
            Ok(email) => Some(email),
            Err(e) => {
                errors.push("email", e.to_string());
                None
            }
        };
        match email {
            Some(email) if errors.is_empty() => Ok(Registration {
                username: self.username.trim().to_string(),
                password: self.password,
                first_name: self.first_name,
                last_name: self.last_name,
                email,
            }),
            _ => Err(errors),
        }
    }
}

/// Sign in and persist the session.
///
/// # Errors
///
/// Returns the login failure; an existing session is kept in that case.
pub async fn login(ctx: &Context, username: &str, password: SecretString) -> Result<(), CommandError> {
    let principal = ctx.api().login(username.trim(), &password).await?;
    tracing::info!(username = %principal.username, role = %principal.role, "Signed in");
    output::line(format!(
        "Signed in as {} ({}).",
        principal.username,
        principal.role
    ));
    Ok(())
}

/// Create a customer account. Does not sign in.
///
/// # Errors
///
/// Returns field errors for invalid input or the backend's refusal.
pub async fn register(ctx: &Context, sign_up: SignUp) -> Result<(), CommandError> {
    let registration = sign_up.into_registration().map_err(CommandError::Invalid)?;
    ctx.api().register(&registration).await?;
    output::line(format!(
        "Account {} created. Run `garage login {}` to sign in.",
        registration.username, registration.username
    ));
    Ok(())
}

/// Forget the stored session.
///
/// # Errors
///
/// Returns `CommandError::Storage` if the token file cannot be removed.
pub fn logout(ctx: &Context) -> Result<(), CommandError> {
    ctx.api().logout()?;
    output::line("Signed out.");
    Ok(())
}

/// Show the signed-in user.
///
/// # Errors
///
/// Returns `CommandError::Desk` when nobody is signed in.
pub fn whoami(ctx: &Context) -> Result<(), CommandError> {
    let principal = ctx.desk.require_session()?;
    let username = if principal.username.is_empty() {
        "(stored session)"
    } else {
        principal.username.as_str()
    };
    output::line(format!("{username} ({})", principal.role));
    Ok(())
}
