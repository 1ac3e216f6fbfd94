//! Typed repositories for the backend's REST resources.
//!
//! Each submodule adds methods to [`ApiClient`](crate::ApiClient) for one
//! resource, along with the resource's wire types.

pub mod bookings;
pub mod customers;
pub mod invoices;
pub mod services;
pub mod vehicles;

pub use bookings::{BookingPatch, BookingRecord};
pub use customers::{Customer, CustomerInput, User};
pub use invoices::{InvoiceRecord, PaymentUpdate};
pub use services::{Service, ServiceInput};
pub use vehicles::{Vehicle, VehicleInput};

use serde::Deserialize;

/// A resource with a typed identifier.
pub trait Resource {
    type Id: Copy;

    fn id(&self) -> Self::Id;
}

/// A related record the backend sends either as a bare id or nested in full.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(
    untagged,
    bound(deserialize = "T: Deserialize<'de>, T::Id: Deserialize<'de>")
)]
pub enum Nested<T: Resource> {
    Id(T::Id),
    Object(Box<T>),
}

impl<T: Resource> Nested<T> {
    #[must_use]
    pub fn id(&self) -> T::Id {
        match self {
            Self::Id(id) => *id,
            Self::Object(object) => object.id(),
        }
    }

    /// The nested record, if the backend sent it in full.
    #[must_use]
    pub fn into_object(self) -> Option<T> {
        match self {
            Self::Id(_) => None,
            Self::Object(object) => Some(*object),
        }
    }
}
