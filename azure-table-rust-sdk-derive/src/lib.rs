//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
extern crate proc_macro;
extern crate proc_macro2;
extern crate syn;
#[macro_use]
extern crate quote;

use proc_macro::TokenStream;
use proc_macro2::{TokenStream as TokenStream2, TokenTree};
use syn::{parse_macro_input, Data, DeriveInput, Meta};

/// Derive macro to specify a struct that can be written directly into, and read directly from,
/// a table storage entity.
///
/// The struct must have `partition_key: String` and `row_key: String` fields; those become the
/// entity identity and are never part of the data-property set. Optional `etag: Option<String>`
/// and `timestamp: Option<chrono::DateTime<chrono::FixedOffset>>` fields, if present, receive
/// the concurrency token and server timestamp when an entity is read back.
///
/// All other fields are data properties, registered in declaration order. The single `table`
/// attribute can be used to rename a property on the wire using the `column` key, which is the
/// usual way to map a snake_case Rust field to a PascalCase storage property:
///
/// ```ignore
/// #[derive(Default, Debug, TableRow)]
/// struct ContactEntity {
///     partition_key: String,
///     row_key: String,
///     etag: Option<String>,
///     #[table(column = Email)]
///     email: String,
/// }
/// ```
#[proc_macro_derive(TableRow, attributes(table))]
pub fn to_from_property_map(input: TokenStream) -> TokenStream {
    // Parse input tokens into a syntax tree
    let input = parse_macro_input!(input as DeriveInput);

    // Build the trait implementation
    impl_to_from_property_map(input)
}

fn impl_to_from_property_map(input: DeriveInput) -> TokenStream {
    let name = &input.ident;

    // check that input.data is Struct (vs Enum vs Union)
    let ds;
    if let Data::Struct(d) = input.data {
        ds = d;
    } else {
        panic!("TableRow only supports Struct datatypes");
    }

    #[derive(Debug)]
    struct FieldNameType {
        fname: String,
        alias: Option<String>,
    }

    let mut fntypes: Vec<FieldNameType> = Vec::new();
    let mut has_partition_key = false;
    let mut has_row_key = false;
    let mut has_etag = false;
    let mut has_timestamp = false;

    for field in ds.fields {
        // wire column name comes from the field name;
        // if a "column" attribute is given, use that instead

        let mut alias: Option<String> = None;
        for a in field.attrs {
            let mut good: bool = false;
            if let Meta::List(l) = a.meta {
                for s in l.path.segments {
                    if s.ident == "table" {
                        good = true;
                        break;
                    }
                }
                if good == false {
                    continue;
                }
                // we now have a "table" attribute list
                let mut is_column: bool = false;
                for t in l.tokens {
                    match t {
                        TokenTree::Ident(i) => {
                            if is_column {
                                alias = Some(i.to_string());
                                break;
                            }
                            if i.to_string() == "column" {
                                is_column = true;
                            } else {
                                is_column = false;
                            }
                        }
                        _ => (),
                    }
                }
                if alias.is_some() {
                    break;
                }
            }
        }

        let fname = if let Some(id) = field.ident {
            id.to_string()
        } else {
            panic!("Field in TableRow is missing ident");
        };

        // identity fields get dedicated accessors and never appear
        // in the data-property map
        match fname.as_str() {
            "partition_key" => {
                has_partition_key = true;
                continue;
            }
            "row_key" => {
                has_row_key = true;
                continue;
            }
            "etag" => {
                has_etag = true;
                continue;
            }
            "timestamp" => {
                has_timestamp = true;
                continue;
            }
            _ => (),
        }

        fntypes.push(FieldNameType { fname, alias });
    }

    if !has_partition_key || !has_row_key {
        panic!("TableRow requires partition_key and row_key String fields");
    }

    let mut tbody = TokenStream2::default();
    let mut fbody = TokenStream2::default();
    for f in fntypes {
        let fname = format_ident!("{}", f.fname);
        let fnameq: String;
        match f.alias {
            Some(s) => fnameq = s,
            None => fnameq = f.fname,
        }
        tbody.extend(quote! {
            m.put(#fnameq, &self.#fname);
        });
        fbody.extend(quote! {
            if let Some(v) = self.#fname.from_map(#fnameq, props) {
                self.#fname = v;
            }
        });
    }

    let etag_impl = if has_etag {
        quote! {
            fn etag(&self) -> Option<&str> {
                self.etag.as_deref()
            }
            fn set_etag(&mut self, etag: &str) {
                self.etag = Some(etag.to_string());
            }
        }
    } else {
        TokenStream2::default()
    };

    let timestamp_impl = if has_timestamp {
        quote! {
            fn set_timestamp(&mut self, timestamp: chrono::DateTime<chrono::FixedOffset>) {
                self.timestamp = Some(timestamp);
            }
        }
    } else {
        TokenStream2::default()
    };

    let expanded = quote! {
        impl TableRow for #name {
            fn partition_key(&self) -> &str {
                self.partition_key.as_str()
            }

            fn row_key(&self) -> &str {
                self.row_key.as_str()
            }

            fn set_keys(&mut self, partition_key: &str, row_key: &str) {
                self.partition_key = partition_key.to_string();
                self.row_key = row_key.to_string();
            }

            #etag_impl

            #timestamp_impl

            fn to_property_map(&self) -> PropertyMap {
                let mut m = PropertyMap::new();
                #tbody
                m
            }

            fn from_property_map(&mut self, props: &PropertyMap) {
                #fbody
            }
        }
    };

    // Return the generated impl
    TokenStream::from(expanded)
}
