//! Garage Desk Core - workflow rules and shared types.
//!
//! This crate provides the types and rules shared by every Garage Desk
//! component:
//! - `client` - REST client, session store and booking desk
//! - `cli` - Command-line front-end for admins and customers
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no clocks. Callers pass "today" in explicitly so every rule is
//! deterministic under test.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, statuses, roles, money and contact details
//! - [`booking`] - Booking lifecycle state machine
//! - [`invoice`] - Invoice derivation and payment status
//! - [`access`] - Role-based authorization gate and routes
//! - [`claims`] - Access token payload decoding

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod booking;
pub mod claims;
pub mod error;
pub mod invoice;
pub mod types;

pub use access::{AccessDecision, Principal, Route, can_access, navigate};
pub use booking::{Booking, BookingAction, NewBooking, Transition, available_actions};
pub use claims::{ClaimsError, TokenClaims, decode_claims};
pub use error::{FieldError, TransitionError};
pub use invoice::{Invoice, InvoiceDraft, InvoicePlan, plan_invoice};
pub use types::*;
