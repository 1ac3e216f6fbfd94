//! Core types for the garage desk.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod contact;
pub mod id;
pub mod price;
pub mod status;

pub use contact::{Email, EmailError, PhoneError, PhoneNumber};
pub use id::*;
pub use price::{clamp_charge, compute_total, format_money, round_money};
pub use status::*;
