//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
use chrono::{DateTime, FixedOffset, SecondsFormat};
use std::fmt;
use std::result::Result;
use std::string::String;
use std::vec::Vec;

pub use azure_table_rust_sdk_derive::*;

use crate::error::ia_err;
use crate::error::TableError;

// Reserved property names carrying entity identity on the wire.
pub(crate) const PARTITION_KEY: &str = "PartitionKey";
pub(crate) const ROW_KEY: &str = "RowKey";
pub(crate) const TIMESTAMP: &str = "Timestamp";
pub(crate) const ETAG: &str = "ETag";

/// A single typed data value of a table entity property.
///
/// The variants cover the convertible subset of the `Edm.*` wire types:
/// text, 32/64-bit integers, double floats, booleans, GUID-shaped
/// identifiers, and round-trippable date-times. Each variant knows its wire
/// type name and its wire text rendering.
///
/// Values read back from the service are only as typed as the wire payload:
/// an element without a type attribute is a `PropertyValue::String`, and the
/// conversion into a struct field happens through [`FromProperty`] against
/// the field's declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    String(String),
    Int32(i32),
    Int64(i64),
    Double(f64),
    Boolean(bool),
    Guid(Guid),
    DateTime(DateTime<FixedOffset>),
}

impl PropertyValue {
    // The m:type attribute value, None for Edm.String (the wire default).
    pub(crate) fn edm_type(&self) -> Option<&'static str> {
        match self {
            PropertyValue::String(_) => None,
            PropertyValue::Int32(_) => Some("Edm.Int32"),
            PropertyValue::Int64(_) => Some("Edm.Int64"),
            PropertyValue::Double(_) => Some("Edm.Double"),
            PropertyValue::Boolean(_) => Some("Edm.Boolean"),
            PropertyValue::Guid(_) => Some("Edm.Guid"),
            PropertyValue::DateTime(_) => Some("Edm.DateTime"),
        }
    }

    // Wire text for the value. Numeric and date-time renderings round-trip
    // through their FromProperty parses.
    pub(crate) fn render(&self) -> String {
        match self {
            PropertyValue::String(s) => s.clone(),
            PropertyValue::Int32(i) => i.to_string(),
            PropertyValue::Int64(l) => l.to_string(),
            PropertyValue::Double(d) => d.to_string(),
            PropertyValue::Boolean(b) => b.to_string(),
            PropertyValue::Guid(g) => g.to_string(),
            PropertyValue::DateTime(t) => t.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        }
    }
}

/// A GUID-shaped identifier (`8-4-4-4-12` hex groups).
///
/// This is a validated string wrapper so `Edm.Guid` columns can be declared
/// without pulling in a separate uuid dependency; the wire representation is
/// the textual form either way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Guid {
    value: String,
}

impl Guid {
    /// Parse a GUID from its hyphenated textual form.
    pub fn parse(s: &str) -> Result<Guid, TableError> {
        let bytes = s.as_bytes();
        if bytes.len() != 36 {
            return ia_err!("invalid GUID '{}': expected 36 characters", s);
        }
        for (i, b) in bytes.iter().enumerate() {
            match i {
                8 | 13 | 18 | 23 => {
                    if *b != b'-' {
                        return ia_err!("invalid GUID '{}': expected '-' at offset {}", s, i);
                    }
                }
                _ => {
                    if !b.is_ascii_hexdigit() {
                        return ia_err!("invalid GUID '{}': non-hex character at offset {}", s, i);
                    }
                }
            }
        }
        Ok(Guid {
            value: s.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        self.value.as_str()
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Conversion of a native Rust value into a [`PropertyValue`].
///
/// Implementations exist for the convertible primitive types; entity structs
/// get their per-field conversions through the [`macro@TableRow`] derive.
pub trait ToProperty {
    fn to_property(&self) -> PropertyValue;
}

impl<T: ToProperty> ToProperty for &T {
    fn to_property(&self) -> PropertyValue {
        (*self).to_property()
    }
}
impl ToProperty for PropertyValue {
    fn to_property(&self) -> PropertyValue {
        self.clone()
    }
}
impl ToProperty for String {
    fn to_property(&self) -> PropertyValue {
        PropertyValue::String(self.to_string())
    }
}
impl ToProperty for &str {
    fn to_property(&self) -> PropertyValue {
        PropertyValue::String(self.to_string())
    }
}
impl ToProperty for i8 {
    fn to_property(&self) -> PropertyValue {
        PropertyValue::Int32(*self as i32)
    }
}
impl ToProperty for i16 {
    fn to_property(&self) -> PropertyValue {
        PropertyValue::Int32(*self as i32)
    }
}
impl ToProperty for i32 {
    fn to_property(&self) -> PropertyValue {
        PropertyValue::Int32(*self)
    }
}
impl ToProperty for i64 {
    fn to_property(&self) -> PropertyValue {
        PropertyValue::Int64(*self)
    }
}
impl ToProperty for f64 {
    fn to_property(&self) -> PropertyValue {
        PropertyValue::Double(*self)
    }
}
impl ToProperty for bool {
    fn to_property(&self) -> PropertyValue {
        PropertyValue::Boolean(*self)
    }
}
impl ToProperty for Guid {
    fn to_property(&self) -> PropertyValue {
        PropertyValue::Guid(self.clone())
    }
}
impl ToProperty for DateTime<FixedOffset> {
    fn to_property(&self) -> PropertyValue {
        PropertyValue::DateTime(self.clone())
    }
}

/// Conversion of a [`PropertyValue`] into a native Rust value.
///
/// Every implementation accepts both its matching typed variant and the
/// untyped `String` variant, parsing the wire text against the declared
/// target type. This mirrors the protocol, where a reader cannot rely on
/// writers having emitted type attributes.
pub trait FromProperty: Sized {
    fn from_property(p: &PropertyValue) -> Result<Self, TableError>;
}

impl FromProperty for PropertyValue {
    fn from_property(p: &PropertyValue) -> Result<Self, TableError> {
        Ok(p.clone())
    }
}
impl FromProperty for String {
    fn from_property(p: &PropertyValue) -> Result<Self, TableError> {
        Ok(p.render())
    }
}
impl FromProperty for i32 {
    fn from_property(p: &PropertyValue) -> Result<Self, TableError> {
        match p {
            PropertyValue::Int32(i) => Ok(*i),
            PropertyValue::String(s) => match s.trim().parse::<i32>() {
                Ok(i) => Ok(i),
                Err(e) => ia_err!("cannot convert '{}' to i32: {}", s, e),
            },
            _ => ia_err!("wrong type for i32 field: {:?}", p),
        }
    }
}
impl FromProperty for i64 {
    fn from_property(p: &PropertyValue) -> Result<Self, TableError> {
        match p {
            PropertyValue::Int32(i) => Ok(*i as i64),
            PropertyValue::Int64(l) => Ok(*l),
            PropertyValue::String(s) => match s.trim().parse::<i64>() {
                Ok(l) => Ok(l),
                Err(e) => ia_err!("cannot convert '{}' to i64: {}", s, e),
            },
            _ => ia_err!("wrong type for i64 field: {:?}", p),
        }
    }
}
impl FromProperty for f64 {
    fn from_property(p: &PropertyValue) -> Result<Self, TableError> {
        match p {
            PropertyValue::Int32(i) => Ok(*i as f64),
            PropertyValue::Int64(l) => Ok(*l as f64),
            PropertyValue::Double(d) => Ok(*d),
            PropertyValue::String(s) => match s.trim().parse::<f64>() {
                Ok(d) => Ok(d),
                Err(e) => ia_err!("cannot convert '{}' to f64: {}", s, e),
            },
            _ => ia_err!("wrong type for f64 field: {:?}", p),
        }
    }
}
impl FromProperty for bool {
    fn from_property(p: &PropertyValue) -> Result<Self, TableError> {
        match p {
            PropertyValue::Boolean(b) => Ok(*b),
            PropertyValue::String(s) => match s.trim().to_lowercase().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => ia_err!("cannot convert '{}' to bool", s),
            },
            _ => ia_err!("wrong type for bool field: {:?}", p),
        }
    }
}
impl FromProperty for Guid {
    fn from_property(p: &PropertyValue) -> Result<Self, TableError> {
        match p {
            PropertyValue::Guid(g) => Ok(g.clone()),
            PropertyValue::String(s) => Guid::parse(s),
            _ => ia_err!("wrong type for Guid field: {:?}", p),
        }
    }
}
impl FromProperty for DateTime<FixedOffset> {
    fn from_property(p: &PropertyValue) -> Result<Self, TableError> {
        match p {
            PropertyValue::DateTime(t) => Ok(t.clone()),
            PropertyValue::String(s) => Ok(DateTime::parse_from_rfc3339(s.trim())?),
            _ => ia_err!("wrong type for DateTime field: {:?}", p),
        }
    }
}

/// Field lookup-and-convert helper used by the [`macro@TableRow`] derive.
///
/// The receiver is only used for type inference. A `None` result means the
/// property is absent from the map or its value could not be converted; the
/// generated code then leaves the field at its current (default) value —
/// conversion failures are deliberately not surfaced, matching the documented
/// hydration behavior.
pub trait ColumnFromPropertyMap: Sized {
    fn from_map(&self, name: &str, props: &PropertyMap) -> Option<Self>;
}

impl<T: FromProperty> ColumnFromPropertyMap for T {
    fn from_map(&self, name: &str, props: &PropertyMap) -> Option<Self> {
        let p = props.get_ci(name)?;
        T::from_property(p).ok()
    }
}

/// The ordered set of data properties of a single entity.
///
/// This is a list of `(name, PropertyValue)` pairs rather than a map:
/// property declaration order is part of the serialized form and is
/// preserved end-to-end. Lookup during hydration is case-insensitive on the
/// wire-local name, which is what lets snake_case fields match PascalCase
/// storage properties.
#[derive(Default, Debug)]
pub struct PropertyMap {
    props: Vec<(String, PropertyValue)>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<(String, PropertyValue)> {
        self.props.iter()
    }

    /// Set a property, replacing any existing value with the same name.
    pub fn put(&mut self, name: &str, val: impl ToProperty) {
        let v = val.to_property();
        for p in self.props.iter_mut() {
            if p.0 == name {
                p.1 = v;
                return;
            }
        }
        self.props.push((name.to_string(), v));
    }

    /// Builder-style [`put()`](PropertyMap::put).
    pub fn column(mut self, name: &str, val: impl ToProperty) -> PropertyMap {
        self.put(name, val);
        self
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        for p in self.props.iter() {
            if p.0 == name {
                return Some(&p.1);
            }
        }
        None
    }

    /// Case-insensitive lookup by wire-local name.
    pub fn get_ci(&self, name: &str) -> Option<&PropertyValue> {
        for p in self.props.iter() {
            if p.0.eq_ignore_ascii_case(name) {
                return Some(&p.1);
            }
        }
        None
    }
}

/// Trait implemented by structs that map to table entities.
///
/// This is normally implemented with the [`macro@TableRow`] derive, which
/// registers the struct's data properties as an explicit ordered schema at
/// compile time. `partition_key` and `row_key` are required; `etag` and
/// `timestamp` accessors have no-op defaults for types that do not carry
/// them.
pub trait TableRow {
    fn partition_key(&self) -> &str;
    fn row_key(&self) -> &str;
    fn set_keys(&mut self, partition_key: &str, row_key: &str);

    /// The concurrency token from the last read or write, if any.
    fn etag(&self) -> Option<&str> {
        None
    }
    fn set_etag(&mut self, _etag: &str) {}

    /// The server-assigned timestamp is informational only.
    fn set_timestamp(&mut self, _timestamp: DateTime<FixedOffset>) {}

    /// The data properties in declaration order, excluding the identity
    /// members (PartitionKey, RowKey, Timestamp, ETag).
    fn to_property_map(&self) -> PropertyMap;

    /// Populate data properties from a wire property set. Absent or
    /// unconvertible properties leave the field untouched.
    fn from_property_map(&mut self, props: &PropertyMap);
}
