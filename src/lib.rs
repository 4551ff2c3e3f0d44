//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
//! Azure Table Storage Rust SDK
//!
//! This is a Rust client for the
//! [Azure Table storage](https://learn.microsoft.com/azure/storage/tables/) REST
//! protocol. It signs every request with the storage account key using the
//! `SharedKeyLite` scheme and exchanges entities in the Atom/OData XML format.
//! All methods are synchronous, using the blocking [`reqwest`] client.
//!
//! The general flow for an application using this SDK is:
//! - Create a [`TableClientBuilder`] with the account, account key and table name
//! - Create a [`TableClient`] from the builder; the client is cheap to clone and
//!   can be shared across threads
//! - Derive [`types::TableRow`](macro@types::TableRow) on the structs that map
//!   to table entities, and pass them to the client's entity operations
//!
//! ## Simple Example
//! The following code creates a [`TableClient`] from values in the current
//! environment, then inserts and reads back one entity:
//! ```no_run
//! use azure_table_rust_sdk::TableClient;
//! use azure_table_rust_sdk::types::*;
//! use std::error::Error;
//!
//! #[derive(Default, Debug, TableRow)]
//! struct ContactEntity {
//!     partition_key: String,
//!     row_key: String,
//!     etag: Option<String>,
//!     #[table(column = Email)]
//!     email: String,
//!     #[table(column = PhoneNumber)]
//!     phone_number: String,
//! }
//!
//! fn main() -> Result<(), Box<dyn Error>> {
//!     let client = TableClient::builder()
//!         .from_environment()?
//!         .build()?;
//!
//!     let mut contact = ContactEntity::default();
//!     contact.set_keys("Ritchie", "Peter");
//!     contact.email = "1@2.com".to_string();
//!     contact.phone_number = "555-0123".to_string();
//!     client.insert_entity(&contact)?;
//!
//!     let found: Option<ContactEntity> = client.retrieve_entity("Ritchie", "Peter")?;
//!     println!("retrieved: {:?}", found);
//!     Ok(())
//! }
//! ```
//!
//! ## Configuring the client
//!
//! A client needs three values: the storage account name, the account key in
//! its base64 form, and the table name. They can be given in code through the
//! [`TableClientBuilder`] methods or collected from `AZURE_TABLE_*`
//! environment variables with
//! [`from_environment()`](TableClientBuilder::from_environment). The endpoint
//! defaults to `https://{account}.table.core.windows.net/` and can be
//! overridden with [`endpoint()`](TableClientBuilder::endpoint) to point at a
//! local emulator; for emulators with self-signed certificates see
//! [`add_cert_from_pemfile()`](TableClientBuilder::add_cert_from_pemfile) and
//! [`danger_accept_invalid_certs()`](TableClientBuilder::danger_accept_invalid_certs).
//!
//! ## Prerequisites
//! - Rust 1.78 or later
//! - An Azure storage account, or a local table storage emulator such as
//!   [Azurite](https://learn.microsoft.com/azure/storage/common/storage-use-azurite)
//!

pub(crate) mod client_builder;
pub use crate::client_builder::TableClientBuilder;

pub(crate) mod client;
pub use crate::client::{TableClient, WriteOutcome};

pub(crate) mod atom;
#[cfg(test)]
pub(crate) mod atom_tests;

pub(crate) mod error;
pub use crate::error::{TableError, TableErrorCode};

pub(crate) mod query;
pub use crate::query::TableQuery;

pub(crate) mod signer;

pub mod types;
pub use crate::types::TableRow;
