//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
use crate::error::{bad_response, TableError};
use crate::types::{PropertyMap, PropertyValue, TableRow, ETAG, PARTITION_KEY, ROW_KEY, TIMESTAMP};
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use quick_xml::writer::Writer;

// Atom/OData serialization of table entities. An entity travels as an Atom
// <entry> whose <content> holds an <m:properties> element with one
// data-namespaced child per property; a query result is an Atom <feed> of
// such entries.

const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
const DATA_NS: &str = "http://schemas.microsoft.com/ado/2007/08/dataservices";
const META_NS: &str = "http://schemas.microsoft.com/ado/2007/08/dataservices/metadata";

/// Serialize an entity row as an Atom entry document. The identity keys are
/// appended after the data properties; the server does not care about
/// property order but keeping keys last matches what it echoes back.
pub(crate) fn entity_entry<T: TableRow>(row: &T) -> Result<String, TableError> {
    let mut props = row.to_property_map();
    props.put(PARTITION_KEY, row.partition_key());
    props.put(ROW_KEY, row.row_key());
    write_entry(&props)
}

/// Serialize a table-creation entry: a single `TableName` property.
pub(crate) fn table_entry(table_name: &str) -> Result<String, TableError> {
    write_entry(&PropertyMap::new().column("TableName", table_name))
}

fn write_entry(props: &PropertyMap) -> Result<String, TableError> {
    let mut w = Writer::new(Vec::new());
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), Some("yes"))))?;

    let mut entry = BytesStart::new("entry");
    entry.push_attribute(("xmlns:d", DATA_NS));
    entry.push_attribute(("xmlns:m", META_NS));
    entry.push_attribute(("xmlns", ATOM_NS));
    w.write_event(Event::Start(entry))?;

    // required Atom envelope elements, empty except for the timestamp
    w.write_event(Event::Empty(BytesStart::new("title")))?;
    let updated = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    w.write_event(Event::Start(BytesStart::new("updated")))?;
    w.write_event(Event::Text(BytesText::new(&updated)))?;
    w.write_event(Event::End(BytesEnd::new("updated")))?;
    w.write_event(Event::Start(BytesStart::new("author")))?;
    w.write_event(Event::Empty(BytesStart::new("name")))?;
    w.write_event(Event::End(BytesEnd::new("author")))?;
    w.write_event(Event::Empty(BytesStart::new("id")))?;

    let mut content = BytesStart::new("content");
    content.push_attribute(("type", "application/xml"));
    w.write_event(Event::Start(content))?;
    w.write_event(Event::Start(BytesStart::new("m:properties")))?;

    for (name, val) in props.iter() {
        let tag = format!("d:{}", name);
        let mut el = BytesStart::new(tag.as_str());
        if let Some(t) = val.edm_type() {
            el.push_attribute(("m:type", t));
        }
        let text = val.render();
        if text.is_empty() {
            w.write_event(Event::Empty(el))?;
        } else {
            w.write_event(Event::Start(el))?;
            w.write_event(Event::Text(BytesText::new(&text)))?;
            w.write_event(Event::End(BytesEnd::new(tag.as_str())))?;
        }
    }

    w.write_event(Event::End(BytesEnd::new("m:properties")))?;
    w.write_event(Event::End(BytesEnd::new("content")))?;
    w.write_event(Event::End(BytesEnd::new("entry")))?;

    match String::from_utf8(w.into_inner()) {
        Ok(s) => Ok(s),
        Err(e) => Err(bad_response!("serialized entry is not UTF-8: {}", e)),
    }
}

/// One entity as decoded from the wire, before hydration into a caller's
/// row type.
#[derive(Debug, Default)]
pub(crate) struct WireEntry {
    pub(crate) partition_key: String,
    pub(crate) row_key: String,
    pub(crate) etag: Option<String>,
    pub(crate) timestamp: Option<DateTime<FixedOffset>>,
    pub(crate) props: PropertyMap,
}

impl WireEntry {
    pub(crate) fn hydrate<T: TableRow + Default>(&self) -> T {
        let mut row = T::default();
        row.set_keys(&self.partition_key, &self.row_key);
        if let Some(e) = &self.etag {
            row.set_etag(e);
        }
        if let Some(t) = &self.timestamp {
            row.set_timestamp(*t);
        }
        row.from_property_map(&self.props);
        row
    }
}

/// Parse a single-entry document, as returned by a point read.
pub(crate) fn parse_entry(body: &str) -> Result<WireEntry, TableError> {
    let mut entries = parse_entries(body)?;
    if entries.is_empty() {
        return Err(bad_response!("response contains no entry element"));
    }
    Ok(entries.remove(0))
}

/// Parse a feed document, as returned by a query. An empty feed is an
/// empty vec, not an error.
pub(crate) fn parse_feed(body: &str) -> Result<Vec<WireEntry>, TableError> {
    parse_entries(body)
}

// In-flight state for one property element.
struct PendingProp {
    name: String,
    edm_type: Option<String>,
    null: bool,
    text: String,
}

#[derive(Default)]
struct EntryBuilder {
    etag: Option<String>,
    partition_key: Option<String>,
    row_key: Option<String>,
    timestamp: Option<DateTime<FixedOffset>>,
    props: PropertyMap,
}

impl EntryBuilder {
    fn commit(&mut self, p: PendingProp) {
        if p.null {
            return;
        }
        match p.name.as_str() {
            PARTITION_KEY => self.partition_key = Some(p.text),
            ROW_KEY => self.row_key = Some(p.text),
            // the token may also arrive as a reserved property element;
            // the m:etag entry attribute wins when both are present
            ETAG => {
                if self.etag.is_none() {
                    self.etag = Some(p.text);
                }
            }
            TIMESTAMP => {
                // the server timestamp is informational; an unparseable one
                // is carried as a plain property instead
                match DateTime::parse_from_rfc3339(p.text.trim()) {
                    Ok(t) => self.timestamp = Some(t),
                    Err(_) => self.props.put(&p.name, PropertyValue::String(p.text)),
                }
            }
            _ => {
                let v = typed_value(p.edm_type.as_deref(), p.text);
                self.props.put(&p.name, v);
            }
        }
    }

    fn build(self) -> Result<WireEntry, TableError> {
        let partition_key = match self.partition_key {
            Some(k) => k,
            None => return Err(bad_response!("entry is missing its PartitionKey property")),
        };
        let row_key = match self.row_key {
            Some(k) => k,
            None => return Err(bad_response!("entry is missing its RowKey property")),
        };
        Ok(WireEntry {
            partition_key,
            row_key,
            etag: self.etag,
            timestamp: self.timestamp,
            props: self.props,
        })
    }
}

// Decode the wire text against the m:type attribute. A value that fails its
// typed parse degrades to a String so hydration can still see it.
fn typed_value(edm_type: Option<&str>, text: String) -> PropertyValue {
    match edm_type {
        Some("Edm.Int32") => match text.trim().parse::<i32>() {
            Ok(i) => PropertyValue::Int32(i),
            Err(_) => PropertyValue::String(text),
        },
        Some("Edm.Int64") => match text.trim().parse::<i64>() {
            Ok(l) => PropertyValue::Int64(l),
            Err(_) => PropertyValue::String(text),
        },
        Some("Edm.Double") => match text.trim().parse::<f64>() {
            Ok(d) => PropertyValue::Double(d),
            Err(_) => PropertyValue::String(text),
        },
        Some("Edm.Boolean") => match text.trim() {
            "true" => PropertyValue::Boolean(true),
            "false" => PropertyValue::Boolean(false),
            _ => PropertyValue::String(text),
        },
        Some("Edm.Guid") => match crate::types::Guid::parse(text.trim()) {
            Ok(g) => PropertyValue::Guid(g),
            Err(_) => PropertyValue::String(text),
        },
        Some("Edm.DateTime") => match DateTime::parse_from_rfc3339(text.trim()) {
            Ok(t) => PropertyValue::DateTime(t),
            Err(_) => PropertyValue::String(text),
        },
        _ => PropertyValue::String(text),
    }
}

fn is_ns(r: &ResolveResult, ns: &str) -> bool {
    match r {
        ResolveResult::Bound(b) => b.0 == ns.as_bytes(),
        _ => false,
    }
}

fn parse_entries(body: &str) -> Result<Vec<WireEntry>, TableError> {
    let mut reader = NsReader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut entries: Vec<WireEntry> = Vec::new();
    let mut cur: Option<EntryBuilder> = None;
    let mut in_properties = false;
    let mut prop: Option<PendingProp> = None;

    loop {
        match reader.read_resolved_event()? {
            (ns, Event::Start(e)) => {
                let local = e.local_name();
                if is_ns(&ns, ATOM_NS) && local.as_ref() == b"entry" {
                    let mut b = EntryBuilder::default();
                    b.etag = entry_etag(&reader, &e)?;
                    cur = Some(b);
                } else if is_ns(&ns, META_NS) && local.as_ref() == b"properties" {
                    in_properties = cur.is_some();
                } else if in_properties && is_ns(&ns, DATA_NS) {
                    prop = Some(begin_property(&reader, &e)?);
                }
            }
            (ns, Event::Empty(e)) => {
                // an empty property element carries the empty string
                if in_properties && is_ns(&ns, DATA_NS) {
                    if let Some(b) = cur.as_mut() {
                        b.commit(begin_property(&reader, &e)?);
                    }
                }
            }
            (_, Event::Text(t)) => {
                if let Some(p) = prop.as_mut() {
                    p.text.push_str(&t.unescape()?);
                }
            }
            (ns, Event::End(e)) => {
                let local = e.local_name();
                if prop.is_some() && is_ns(&ns, DATA_NS) {
                    if let (Some(p), Some(b)) = (prop.take(), cur.as_mut()) {
                        b.commit(p);
                    }
                } else if is_ns(&ns, META_NS) && local.as_ref() == b"properties" {
                    in_properties = false;
                } else if is_ns(&ns, ATOM_NS) && local.as_ref() == b"entry" {
                    if let Some(b) = cur.take() {
                        entries.push(b.build()?);
                    }
                }
            }
            (_, Event::Eof) => break,
            _ => (),
        }
    }

    Ok(entries)
}

// The entity's concurrency token rides on the entry element as an
// m:etag attribute.
fn entry_etag(reader: &NsReader<&[u8]>, e: &BytesStart) -> Result<Option<String>, TableError> {
    for a in e.attributes() {
        let a = a?;
        let (ns, local) = reader.resolve_attribute(a.key);
        if is_ns(&ns, META_NS) && local.as_ref() == b"etag" {
            return Ok(Some(a.unescape_value()?.to_string()));
        }
    }
    Ok(None)
}

fn begin_property(reader: &NsReader<&[u8]>, e: &BytesStart) -> Result<PendingProp, TableError> {
    let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
    let mut edm_type: Option<String> = None;
    let mut null = false;
    for a in e.attributes() {
        let a = a?;
        let (ns, local) = reader.resolve_attribute(a.key);
        if !is_ns(&ns, META_NS) {
            continue;
        }
        match local.as_ref() {
            b"type" => edm_type = Some(a.unescape_value()?.to_string()),
            b"null" => null = a.unescape_value()?.as_ref() == "true",
            _ => (),
        }
    }
    Ok(PendingProp {
        name,
        edm_type,
        null,
        text: String::new(),
    })
}
