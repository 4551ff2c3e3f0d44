//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
use url::Url;

/// A query over the entities of a table, built from the OData `$filter`,
/// `$top` and `$select` options.
///
/// ```no_run
/// # use azure_table_rust_sdk::{TableClient, TableQuery};
/// # fn main() -> Result<(), azure_table_rust_sdk::TableError> {
/// # let client = TableClient::builder().from_environment()?.build()?;
/// # #[derive(Default, Debug)] struct Person;
/// # use azure_table_rust_sdk::types::*;
/// # impl TableRow for Person {
/// #   fn partition_key(&self) -> &str { "" }
/// #   fn row_key(&self) -> &str { "" }
/// #   fn set_keys(&mut self, _p: &str, _r: &str) {}
/// #   fn to_property_map(&self) -> PropertyMap { PropertyMap::new() }
/// #   fn from_property_map(&mut self, _p: &PropertyMap) {}
/// # }
/// let query = TableQuery::new()
///     .filter("PartitionKey eq 'Ritchie'")
///     .top(10);
/// let people: Vec<Person> = client.query_entities(&query)?;
/// # Ok(())
/// # }
/// ```
#[derive(Default, Debug, Clone)]
pub struct TableQuery {
    pub(crate) filter: Option<String>,
    pub(crate) top: Option<u32>,
    pub(crate) select: Option<Vec<String>>,
}

impl TableQuery {
    pub fn new() -> Self {
        Default::default()
    }

    /// Set the `$filter` expression. The expression is passed to the
    /// service verbatim (URL-encoded but not otherwise validated), e.g.
    /// `"PartitionKey eq 'Ritchie' and Age gt 30"`.
    pub fn filter(mut self, filter: &str) -> Self {
        self.filter = Some(filter.to_string());
        self
    }

    /// Limit the result to at most `top` entities.
    pub fn top(mut self, top: u32) -> Self {
        self.top = Some(top);
        self
    }

    /// Project the result onto the named properties. `PartitionKey`,
    /// `RowKey` and `Timestamp` are always included in the projection so
    /// returned entities keep their identity.
    pub fn select<S: AsRef<str>>(mut self, columns: &[S]) -> Self {
        self.select = Some(columns.iter().map(|c| c.as_ref().to_string()).collect());
        self
    }

    // The $select value sent to the service: requested columns first, then
    // the identity properties, skipping any the caller already named.
    // The skip check is an exact comparison; a differently-cased name is a
    // distinct column as far as the projection is concerned.
    fn projection(&self, columns: &[String]) -> String {
        let mut cols: Vec<&str> = columns.iter().map(|c| c.as_str()).collect();
        for id in ["PartitionKey", "RowKey", "Timestamp"] {
            if !cols.iter().any(|c| *c == id) {
                cols.push(id);
            }
        }
        cols.join(",")
    }

    pub(crate) fn append_to(&self, url: &mut Url) {
        // an empty column list means no projection at all
        let select = self.select.as_deref().filter(|s| !s.is_empty());
        if self.filter.is_none() && self.top.is_none() && select.is_none() {
            return;
        }
        let mut pairs = url.query_pairs_mut();
        if let Some(f) = &self.filter {
            pairs.append_pair("$filter", f);
        }
        if let Some(t) = &self.top {
            pairs.append_pair("$top", &t.to_string());
        }
        if let Some(s) = select {
            pairs.append_pair("$select", &self.projection(s));
        }
    }
}
