//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
//! Builder for creating a [`TableClient`](crate::TableClient)
//!

use std::default::Default;
use std::env;
use std::result::Result;
use std::time::Duration;

use crate::client::TableClient;
use crate::error::{ia_err, TableError};
use reqwest::Certificate;

/// Builder used to set all the parameters to create a [`TableClient`].
///
/// Every client is bound to one storage account, one account key and one
/// table. Consider calling
/// [`from_environment()`](TableClientBuilder::from_environment()) to collect
/// all parameters from the local environment by default.
///
/// ```no_run
/// # use azure_table_rust_sdk::TableClient;
/// # fn run() -> Result<(), Box<dyn std::error::Error>> {
///     let client = TableClient::builder()
///         .account("myaccount")?
///         .key("bXlhY2NvdW50a2V5")?
///         .table("contacts")?
///         .build()?;
///     // use client for all operations against the contacts table
///     // ...
/// # Ok(())
/// # }
/// ```
#[derive(Default, Debug, Clone)]
pub struct TableClientBuilder {
    pub(crate) account: String,
    pub(crate) key: String,
    pub(crate) table: String,
    pub(crate) service_host: String,
    pub(crate) endpoint: String,
    pub(crate) timeout: Option<Duration>,
    pub(crate) add_cert: Option<Certificate>,
    pub(crate) accept_invalid_certs: bool,
    // For error messaging
    pub(crate) from_environment: bool,
}

impl TableClientBuilder {
    /// Create a new TableClientBuilder struct.
    pub fn new() -> Self {
        TableClientBuilder {
            ..Default::default()
        }
    }

    /// Build a new [`TableClient`].
    ///
    /// This validates the collected parameters, decodes the account key and
    /// creates the internal [`reqwest::blocking::Client`] the table client
    /// will use for all requests.
    pub fn build(self) -> Result<TableClient, TableError> {
        TableClient::new(&self)
    }

    /// Gather configuration settings from the current environment.
    ///
    /// This method will scan the process [`standard environment`](std::env::Vars) to collect and
    /// set the configuration parameters. The values can be overridden in code if this method is
    /// called first and other methods are called afterwards.
    ///
    /// The following environment variables are used:
    ///
    /// | variable | description |
    /// | -------- | ----------- |
    /// | `AZURE_TABLE_ACCOUNT` | The storage account name. See [`TableClientBuilder::account()`]. |
    /// | `AZURE_TABLE_KEY` | The base64 account key. See [`TableClientBuilder::key()`]. |
    /// | `AZURE_TABLE_TABLE` | The table name. See [`TableClientBuilder::table()`]. |
    /// | `AZURE_TABLE_ENDPOINT` | A full endpoint URL overriding the account-derived one. See [`TableClientBuilder::endpoint()`]. |
    /// | `AZURE_TABLE_CA_CERT` | The path to a certificate file in `pem` format (see [`TableClientBuilder::add_cert_from_pemfile()`]). |
    /// | `AZURE_TABLE_ACCEPT_INVALID_CERTS` | If this is set to `1` or `true`, do not check certificates (see [`TableClientBuilder::danger_accept_invalid_certs()`]). |
    ///
    pub fn from_environment(mut self) -> Result<Self, TableError> {
        self.from_environment = true;
        if let Ok(val) = env::var("AZURE_TABLE_ACCOUNT") {
            self = self.account(&val)?;
        }
        if let Ok(val) = env::var("AZURE_TABLE_KEY") {
            self = self.key(&val)?;
        }
        if let Ok(val) = env::var("AZURE_TABLE_TABLE") {
            self = self.table(&val)?;
        }
        if let Ok(val) = env::var("AZURE_TABLE_ENDPOINT") {
            self = self.endpoint(&val)?;
        }
        if let Ok(val) = env::var("AZURE_TABLE_CA_CERT") {
            self = self.add_cert_from_pemfile(&val)?;
        }
        if let Ok(val) = env::var("AZURE_TABLE_ACCEPT_INVALID_CERTS") {
            let lv = val.to_lowercase();
            if lv == "true" || lv == "1" {
                self = self.danger_accept_invalid_certs(true)?;
            }
        }
        Ok(self)
    }

    /// Set the storage account name.
    pub fn account(mut self, account: &str) -> Result<Self, TableError> {
        self.account = account.to_string();
        Ok(self)
    }

    /// Set the account key, in its base64 form.
    ///
    /// The key is decoded when the client is built; a value that is not
    /// valid base64 fails [`build()`](TableClientBuilder::build) with
    /// [`InvalidKeyEncoding`](crate::TableErrorCode::InvalidKeyEncoding).
    pub fn key(mut self, key: &str) -> Result<Self, TableError> {
        self.key = key.to_string();
        Ok(self)
    }

    /// Set the name of the table this client operates on.
    pub fn table(mut self, table: &str) -> Result<Self, TableError> {
        self.table = table.to_string();
        Ok(self)
    }

    /// Set the service host suffix used to derive the endpoint from the
    /// account name. The default is `table.core.windows.net`, giving
    /// endpoints of the form `https://{account}.table.core.windows.net/`.
    pub fn service_host(mut self, service_host: &str) -> Result<Self, TableError> {
        self.service_host = service_host.to_string();
        Ok(self)
    }

    /// Set a specific endpoint URL to use, overriding the one derived from
    /// the account name and service host.
    ///
    /// This is typically used to point the client at a local storage
    /// emulator:
    /// ```text
    ///     http://127.0.0.1:10002/devstoreaccount1
    /// ```
    pub fn endpoint(mut self, endpoint: &str) -> Result<Self, TableError> {
        if !endpoint.starts_with("https://") && !endpoint.starts_with("http://") {
            return ia_err!("endpoint '{}' must start with http:// or https://", endpoint);
        }
        self.endpoint = endpoint.to_string();
        Ok(self)
    }

    /// Set the request timeout. The default is 90 seconds.
    ///
    /// The same value is sent to the service as the `timeout=N` URI
    /// parameter on entity operations, so the server gives up on a request
    /// at the same point the client does.
    pub fn timeout(mut self, t: Duration) -> Result<Self, TableError> {
        self.timeout = Some(t);
        Ok(self)
    }

    /// Add a certificate to use for https connections from a file.
    ///
    /// The file must contain an x509 certificate in `PEM` file format.
    pub fn add_cert_from_pemfile(self, pemfile: &str) -> Result<Self, TableError> {
        let buf = file_to_string(pemfile)?.into_bytes();
        match Certificate::from_pem(&buf) {
            Ok(cert) => self.add_cert(cert),
            Err(e) => {
                ia_err!("error getting certificate from pemfile {}: {}", pemfile, e)
            }
        }
    }

    /// Add a certificate to use for https connections.
    pub fn add_cert(mut self, cert: Certificate) -> Result<Self, TableError> {
        self.add_cert = Some(cert);
        Ok(self)
    }

    /// Allow https connection without validating certificates.
    ///
    /// **Warning:** This is only recommended for local testing purposes. Its use is insecure. See [`reqwest::blocking::ClientBuilder::danger_accept_invalid_certs()`] for details.
    pub fn danger_accept_invalid_certs(
        mut self,
        accept_invalid_certs: bool,
    ) -> Result<Self, TableError> {
        self.accept_invalid_certs = accept_invalid_certs;
        Ok(self)
    }
}

pub(crate) fn file_to_string(filename: &str) -> Result<String, TableError> {
    match std::fs::read_to_string(filename) {
        Ok(s) => Ok(s),
        Err(e) => ia_err!("error reading file {}: {}", filename, e),
    }
}
