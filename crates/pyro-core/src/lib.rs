//! # pyro-core: Foundational Types for the Permit Portal
//!
//! Leaf crate of the workspace. Every other `pyro-*` crate depends on it;
//! it depends on nothing internal.
//!
//! ## Contents
//!
//! - **Identifiers** ([`ApplicationId`], [`UserId`]): string newtypes validated
//!   at construction and at deserialization. No bare strings for ids.
//! - **Wire tokens** ([`ApplicationType`], [`LicenseType`], [`Role`],
//!   [`Service`], [`Action`], [`ApplicantType`], [`EntityType`],
//!   [`EventType`], [`DocumentType`]): one enum per vocabulary, with the
//!   exact token the REST backend uses as its serde name.
//! - **Phone numbers** ([`PhoneNumber`], [`format_phone`], [`unformat_phone`]):
//!   digits-only on the wire, `(XXX) XXX-XXXX` for display.
//! - **Timestamps** ([`Timestamp`]): UTC, seconds precision.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `pyro-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod domain;
pub mod error;
pub mod identity;
pub mod phone;
pub mod temporal;

pub use domain::{
    Action, ApplicantType, ApplicationType, DocumentType, EntityType, EventType, LicenseType,
    Role, Service,
};
pub use error::ValidationError;
pub use identity::{ApplicationId, UserId};
pub use phone::{format_phone, unformat_phone, PhoneNumber, PHONE_DIGITS};
pub use temporal::Timestamp;
