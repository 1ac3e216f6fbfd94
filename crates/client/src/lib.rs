//! Garage Desk Client - REST client, session store and booking desk.
//!
//! Talks to the garage backend over HTTP and keeps the client-side state a
//! front-end needs: who is signed in, which bookings exist, and which actions
//! are currently in flight.
//!
//! # Architecture
//!
//! - [`SessionStore`] holds the tokens and the role decoded from them
//! - [`ApiClient`] sends authenticated requests; the resource modules add
//!   typed methods per endpoint
//! - [`BookingCache`] is a read-through cache refreshed after every mutation
//! - [`BookingDesk`] gates, validates and executes booking and invoice actions
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use garage_client::{ApiClient, BookingDesk, ClientConfig, FileTokenStore, SessionStore};
//!
//! let config = ClientConfig::from_env()?;
//! let session = SessionStore::new(Arc::new(FileTokenStore::new(&config.token_path)));
//! session.restore();
//! let desk = BookingDesk::new(ApiClient::new(config, session)?);
//! for record in desk.bookings().await? {
//!     println!("#{} {}", record.id(), record.status());
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod desk;
pub mod error;
pub mod resources;
pub mod session;
pub mod token_store;

pub use api::ApiClient;
pub use auth::Registration;
pub use cache::BookingCache;
pub use config::{ClientConfig, ConfigError};
pub use dashboard::{AdminDashboard, CustomerDashboard, StatusCounts};
pub use desk::{BookingDesk, DeskError, InvoiceOutcome};
pub use error::{AuthError, ClientError, FieldErrors};
pub use resources::{
    BookingPatch, BookingRecord, Customer, CustomerInput, InvoiceRecord, Service, ServiceInput,
    User, Vehicle, VehicleInput,
};
pub use session::{Session, SessionStore};
pub use token_store::{FileTokenStore, MemoryTokenStore, StoredTokens, TokenStore, TokenStoreError};
