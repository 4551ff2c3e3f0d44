//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
use crate::atom::{entity_entry, parse_entry, parse_feed, table_entry};
use crate::client_builder::TableClientBuilder;
use crate::error::{ia_err, ia_error, user_agent, TableError, TableErrorCode};
use crate::query::TableQuery;
use crate::signer::sign_request;
use crate::types::TableRow;
use base64::prelude::{Engine as _, BASE64_STANDARD};
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use std::result::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

const DEFAULT_SERVICE_HOST: &str = "table.core.windows.net";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);

// protocol constants: the storage service version this client speaks
const STORAGE_VERSION: &str = "2012-02-12";
const MAX_DATA_SERVICE_VERSION: &str = "2.0;NetFx";
const ACCEPT_TYPES: &str = "application/atom+xml,application/xml";
const CONTENT_TYPE_ATOM: &str = "application/atom+xml";

/// The result of a write against an entity or table that may not exist.
///
/// Update, merge and delete operations against a missing target are not
/// errors in this protocol; the outcome reports whether the write was
/// applied or the target was absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The write reached an existing target and was applied.
    Applied,
    /// The target entity or table did not exist; nothing was changed.
    NotFound,
}

#[derive(Debug)]
pub(crate) struct TableClientRef {
    pub(crate) client: Client,
    pub(crate) account: String,
    // the decoded account key
    pub(crate) key: Vec<u8>,
    pub(crate) table: String,
    pub(crate) endpoint: Url,
    pub(crate) timeout: Duration,
}

/// Client for one table in one Azure Table storage account.
///
/// A client is created from a [`TableClientBuilder`] and is cheap to clone;
/// clones share the same connection pool and configuration. All operations
/// are synchronous and every request is individually signed with the
/// account key using the SharedKeyLite scheme.
#[derive(Debug, Clone)]
pub struct TableClient {
    pub(crate) inner: Arc<TableClientRef>,
}

impl TableClient {
    /// Create a new [`TableClientBuilder`] to set parameters for a TableClient.
    pub fn builder() -> TableClientBuilder {
        TableClientBuilder::new()
    }

    pub(crate) fn new(builder: &TableClientBuilder) -> Result<TableClient, TableError> {
        if builder.account.is_empty() {
            return missing(builder, "account", "AZURE_TABLE_ACCOUNT");
        }
        if builder.key.is_empty() {
            return missing(builder, "key", "AZURE_TABLE_KEY");
        }
        if builder.table.is_empty() {
            return missing(builder, "table", "AZURE_TABLE_TABLE");
        }
        let key = BASE64_STANDARD.decode(&builder.key)?;

        let endpoint = if builder.endpoint.is_empty() {
            let host = if builder.service_host.is_empty() {
                DEFAULT_SERVICE_HOST
            } else {
                builder.service_host.as_str()
            };
            Url::parse(&format!("https://{}.{}/", builder.account, host))?
        } else {
            Url::parse(&builder.endpoint)?
        };

        let timeout = builder.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let mut cb = Client::builder().timeout(timeout);
        if let Some(cert) = &builder.add_cert {
            cb = cb.add_root_certificate(cert.clone());
        }
        if builder.accept_invalid_certs {
            cb = cb.danger_accept_invalid_certs(true);
        }
        let client = cb.build()?;

        Ok(TableClient {
            inner: Arc::new(TableClientRef {
                client,
                account: builder.account.clone(),
                key,
                table: builder.table.clone(),
                endpoint,
                timeout,
            }),
        })
    }

    /// The name of the table this client operates on.
    pub fn table(&self) -> &str {
        &self.inner.table
    }

    /// Create this client's table in the storage account.
    ///
    /// Returns a [`TableAlreadyExists`](TableErrorCode::TableAlreadyExists)
    /// error if a table with this name already exists.
    pub fn create_table(&self) -> Result<(), TableError> {
        let url = self.url_for("Tables", false)?;
        let body = table_entry(&self.inner.table)?;
        let resp = self.dispatch(Method::POST, &url, None, Some(body))?;
        match resp.status().as_u16() {
            200..=299 => Ok(()),
            409 => Err(TableError {
                code: TableErrorCode::TableAlreadyExists,
                status: Some(409),
                message: format!("table '{}' already exists", self.inner.table),
            }),
            _ => Err(status_error("create table", resp)),
        }
    }

    /// Delete this client's table and all the entities in it.
    ///
    /// Deleting a table that does not exist returns
    /// [`WriteOutcome::NotFound`]. The service holds the name for a while
    /// after a deletion; re-creating too soon, or deleting again before the
    /// first deletion completes, answers 409, surfaced as
    /// [`TableAlreadyExists`](TableErrorCode::TableAlreadyExists).
    pub fn delete_table(&self) -> Result<WriteOutcome, TableError> {
        let seg = format!("Tables('{}')", quote(&self.inner.table));
        let url = self.url_for(&seg, false)?;
        let resp = self.dispatch(Method::DELETE, &url, None, None)?;
        match resp.status().as_u16() {
            200..=299 => Ok(WriteOutcome::Applied),
            404 => Ok(WriteOutcome::NotFound),
            409 => Err(TableError {
                code: TableErrorCode::TableAlreadyExists,
                status: Some(409),
                message: format!(
                    "table '{}' is still being deleted by the service",
                    self.inner.table
                ),
            }),
            _ => Err(status_error("delete table", resp)),
        }
    }

    /// Insert a new entity into the table.
    ///
    /// Returns an
    /// [`EntityAlreadyExists`](TableErrorCode::EntityAlreadyExists) error
    /// if an entity with the same PartitionKey/RowKey pair is already
    /// present.
    pub fn insert_entity<T: TableRow>(&self, row: &T) -> Result<(), TableError> {
        let seg = format!("{}()", self.inner.table);
        let url = self.url_for(&seg, true)?;
        let body = entity_entry(row)?;
        let resp = self.dispatch(Method::POST, &url, None, Some(body))?;
        match resp.status().as_u16() {
            200..=299 => Ok(()),
            409 => Err(TableError {
                code: TableErrorCode::EntityAlreadyExists,
                status: Some(409),
                message: format!(
                    "entity (PartitionKey='{}',RowKey='{}') already exists",
                    row.partition_key(),
                    row.row_key()
                ),
            }),
            _ => Err(status_error("insert entity", resp)),
        }
    }

    /// Replace an existing entity wholesale with the given row.
    ///
    /// Properties absent from the row are removed from the stored entity.
    /// If the row carries an etag it is sent as `If-Match`; otherwise the
    /// unconditional `*` is sent.
    pub fn update_entity<T: TableRow>(&self, row: &T) -> Result<WriteOutcome, TableError> {
        self.write_entity(Method::PUT, row)
    }

    /// Merge the given row into an existing entity.
    ///
    /// Properties absent from the row keep their stored values. If the row
    /// carries an etag it is sent as `If-Match`; otherwise the
    /// unconditional `*` is sent.
    pub fn merge_entity<T: TableRow>(&self, row: &T) -> Result<WriteOutcome, TableError> {
        let merge =
            Method::from_bytes(b"MERGE").map_err(|e| ia_error!("invalid method: {}", e))?;
        self.write_entity(merge, row)
    }

    fn write_entity<T: TableRow>(
        &self,
        method: Method,
        row: &T,
    ) -> Result<WriteOutcome, TableError> {
        let url = self.entity_url(row.partition_key(), row.row_key())?;
        let body = entity_entry(row)?;
        let etag = etag_or_star(row.etag());
        let resp = self.dispatch(method, &url, Some(etag), Some(body))?;
        match resp.status().as_u16() {
            200..=299 => Ok(WriteOutcome::Applied),
            404 => Ok(WriteOutcome::NotFound),
            _ => Err(status_error("write entity", resp)),
        }
    }

    /// Delete the entity with the given keys.
    ///
    /// `etag` may be a token from a previous read to make the delete
    /// conditional; pass `None` (or a blank string) to delete
    /// unconditionally. Deleting an entity that does not exist returns
    /// [`WriteOutcome::NotFound`].
    pub fn delete_entity(
        &self,
        partition_key: &str,
        row_key: &str,
        etag: Option<&str>,
    ) -> Result<WriteOutcome, TableError> {
        let url = self.entity_url(partition_key, row_key)?;
        let resp = self.dispatch(Method::DELETE, &url, Some(etag_or_star(etag)), None)?;
        match resp.status().as_u16() {
            200..=299 => Ok(WriteOutcome::Applied),
            404 => Ok(WriteOutcome::NotFound),
            _ => Err(status_error("delete entity", resp)),
        }
    }

    /// Read the entity with the given keys, or `None` if it does not exist.
    pub fn retrieve_entity<T: TableRow + Default>(
        &self,
        partition_key: &str,
        row_key: &str,
    ) -> Result<Option<T>, TableError> {
        let url = self.entity_url(partition_key, row_key)?;
        let resp = self.dispatch(Method::GET, &url, None, None)?;
        match resp.status().as_u16() {
            200..=299 => {
                let body = resp.text()?;
                trace!("retrieve response: {}", body);
                Ok(Some(parse_entry(&body)?.hydrate()))
            }
            404 => Ok(None),
            _ => Err(status_error("retrieve entity", resp)),
        }
    }

    /// Run a [`TableQuery`] against the table and return the matching
    /// entities. A query that matches nothing returns an empty vec.
    pub fn query_entities<T: TableRow + Default>(
        &self,
        query: &TableQuery,
    ) -> Result<Vec<T>, TableError> {
        let table = self.inner.table.clone();
        let mut url = self.url_for(&table, false)?;
        query.append_to(&mut url);
        let resp = self.dispatch(Method::GET, &url, None, None)?;
        match resp.status().as_u16() {
            200..=299 => {
                let body = resp.text()?;
                trace!("query response: {}", body);
                let entries = parse_feed(&body)?;
                Ok(entries.iter().map(|e| e.hydrate()).collect())
            }
            _ => Err(status_error("query entities", resp)),
        }
    }

    // Append one path segment to the endpoint, optionally with the
    // client timeout as a timeout=N query parameter.
    fn url_for(&self, segment: &str, with_timeout: bool) -> Result<Url, TableError> {
        let mut url = self.inner.endpoint.clone();
        match url.path_segments_mut() {
            Ok(mut segs) => {
                segs.pop_if_empty().push(segment);
            }
            Err(_) => {
                return ia_err!("endpoint '{}' cannot be a base url", self.inner.endpoint);
            }
        }
        if with_timeout {
            url.query_pairs_mut()
                .append_pair("timeout", &self.inner.timeout.as_secs().to_string());
        }
        Ok(url)
    }

    fn entity_url(&self, partition_key: &str, row_key: &str) -> Result<Url, TableError> {
        let seg = format!(
            "{}(PartitionKey='{}',RowKey='{}')",
            self.inner.table,
            quote(partition_key),
            quote(row_key)
        );
        self.url_for(&seg, true)
    }

    fn dispatch(
        &self,
        method: Method,
        url: &Url,
        if_match: Option<&str>,
        body: Option<String>,
    ) -> Result<Response, TableError> {
        let mut headers = HeaderMap::new();
        headers.insert("x-ms-version", HeaderValue::from_static(STORAGE_VERSION));
        headers.insert(
            "MaxDataServiceVersion",
            HeaderValue::from_static(MAX_DATA_SERVICE_VERSION),
        );
        headers.insert("Accept", HeaderValue::from_static(ACCEPT_TYPES));
        headers.insert("Accept-Charset", HeaderValue::from_static("UTF-8"));
        headers.insert("User-Agent", HeaderValue::from_static(user_agent()));
        if let Some(etag) = if_match {
            headers.insert("If-Match", HeaderValue::from_str(etag)?);
        }
        if body.is_some() {
            headers.insert("Content-Type", HeaderValue::from_static(CONTENT_TYPE_ATOM));
        }
        sign_request(&mut headers, &self.inner.account, &self.inner.key, url.path())?;

        debug!("{} {}", method, url);
        if let Some(b) = &body {
            trace!("request body: {}", b);
        }
        let mut req = self.inner.client.request(method, url.clone()).headers(headers);
        if let Some(b) = body {
            req = req.body(b);
        }
        Ok(req.send()?)
    }
}

// The service doubles single quotes inside key values in entity addresses.
fn quote(v: &str) -> String {
    v.replace('\'', "''")
}

// A blank etag means an unconditional write.
fn etag_or_star(etag: Option<&str>) -> &str {
    match etag {
        Some(e) if !e.trim().is_empty() => e,
        _ => "*",
    }
}

fn missing(
    builder: &TableClientBuilder,
    field: &str,
    envvar: &str,
) -> Result<TableClient, TableError> {
    if builder.from_environment {
        ia_err!("builder is missing required {}(): set {} in the environment", field, envvar)
    } else {
        ia_err!("builder is missing required {}()", field)
    }
}

fn status_error(op: &str, resp: Response) -> TableError {
    let status = resp.status().as_u16();
    let body = resp.text().unwrap_or_default();
    TableError::from_status(status, &format!("{} failed: {}", op, body.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> TableClient {
        TableClientBuilder::new()
            .account("myaccount")
            .unwrap()
            .key(&BASE64_STANDARD.encode(b"the account key"))
            .unwrap()
            .table("contacts")
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn default_endpoint_from_account() {
        let c = test_client();
        assert_eq!(
            c.inner.endpoint.as_str(),
            "https://myaccount.table.core.windows.net/"
        );
    }

    #[test]
    fn entity_url_shape() {
        let c = test_client();
        let url = c.entity_url("Ritchie", "Peter").unwrap();
        assert_eq!(
            url.as_str(),
            "https://myaccount.table.core.windows.net/contacts(PartitionKey='Ritchie',RowKey='Peter')?timeout=90"
        );
    }

    #[test]
    fn entity_url_quotes_doubled() {
        let c = test_client();
        let url = c.entity_url("O'Brien", "r").unwrap();
        assert!(url.as_str().contains("PartitionKey='O''Brien'"));
    }

    #[test]
    fn insert_url_shape() {
        let c = test_client();
        let url = c.url_for("contacts()", true).unwrap();
        assert_eq!(
            url.as_str(),
            "https://myaccount.table.core.windows.net/contacts()?timeout=90"
        );
    }

    #[test]
    fn endpoint_override_keeps_base_path() {
        let c = TableClientBuilder::new()
            .account("devstoreaccount1")
            .unwrap()
            .key(&BASE64_STANDARD.encode(b"k"))
            .unwrap()
            .table("contacts")
            .unwrap()
            .endpoint("http://127.0.0.1:10002/devstoreaccount1")
            .unwrap()
            .build()
            .unwrap();
        let url = c.url_for("Tables", false).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:10002/devstoreaccount1/Tables");
    }

    #[test]
    fn invalid_key_encoding() {
        let res = TableClientBuilder::new()
            .account("a")
            .unwrap()
            .key("not base64!!!")
            .unwrap()
            .table("t")
            .unwrap()
            .build();
        match res {
            Ok(_) => panic!("expected an error for a non-base64 key"),
            Err(e) => assert_eq!(e.code, TableErrorCode::InvalidKeyEncoding),
        }
    }

    #[test]
    fn missing_builder_fields() {
        let res = TableClientBuilder::new().build();
        assert!(res.is_err());
        let res = TableClientBuilder::new().account("a").unwrap().build();
        assert!(res.is_err());
    }

    #[test]
    fn etag_fallback() {
        assert_eq!(etag_or_star(None), "*");
        assert_eq!(etag_or_star(Some("")), "*");
        assert_eq!(etag_or_star(Some("  ")), "*");
        assert_eq!(etag_or_star(Some("W/\"1\"")), "W/\"1\"");
    }
}
