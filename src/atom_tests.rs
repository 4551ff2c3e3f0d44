//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
use crate::atom::{entity_entry, parse_entry, parse_feed, table_entry};
use crate::error::TableErrorCode;
use crate::types::*;
use chrono::{DateTime, FixedOffset};
use std::error::Error;
use std::result::Result;

#[derive(Default, Debug, TableRow)]
struct ContactEntity {
    partition_key: String,
    row_key: String,
    etag: Option<String>,
    timestamp: Option<DateTime<FixedOffset>>,
    #[table(column = Email)]
    email: String,
    #[table(column = PhoneNumber)]
    phone_number: String,
    #[table(column = Age)]
    age: i32,
    #[table(column = Active)]
    active: bool,
}

fn sample_contact() -> ContactEntity {
    let mut c = ContactEntity::default();
    c.set_keys("Ritchie", "Peter");
    c.email = "1@2.com".to_string();
    c.phone_number = "555-0123".to_string();
    c.age = 42;
    c.active = true;
    c
}

#[test]
fn test_entry_roundtrip() -> Result<(), Box<dyn Error>> {
    let xml = entity_entry(&sample_contact())?;
    let entry = parse_entry(&xml)?;
    assert_eq!(entry.partition_key, "Ritchie");
    assert_eq!(entry.row_key, "Peter");
    let back: ContactEntity = entry.hydrate();
    assert_eq!(back.partition_key(), "Ritchie");
    assert_eq!(back.row_key(), "Peter");
    assert_eq!(back.email, "1@2.com");
    assert_eq!(back.phone_number, "555-0123");
    assert_eq!(back.age, 42);
    assert_eq!(back.active, true);
    // we never serialize an etag; none should come back
    assert!(back.etag.is_none());
    Ok(())
}

#[test]
fn test_entry_shape() -> Result<(), Box<dyn Error>> {
    let xml = entity_entry(&sample_contact())?;
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\" standalone=\"yes\"?>"));
    assert!(xml.contains("xmlns=\"http://www.w3.org/2005/Atom\""));
    assert!(xml.contains("xmlns:d=\"http://schemas.microsoft.com/ado/2007/08/dataservices\""));
    assert!(xml.contains("<m:properties>"));
    assert!(xml.contains("<d:Email>1@2.com</d:Email>"));
    assert!(xml.contains("<d:Age m:type=\"Edm.Int32\">42</d:Age>"));
    assert!(xml.contains("<d:Active m:type=\"Edm.Boolean\">true</d:Active>"));
    // string properties carry no type attribute
    assert!(!xml.contains("<d:Email m:type"));
    // identity keys come after the data properties
    let email_at = xml.find("<d:Email").ok_or("no Email element")?;
    let pk_at = xml.find("<d:PartitionKey").ok_or("no PartitionKey element")?;
    let rk_at = xml.find("<d:RowKey").ok_or("no RowKey element")?;
    assert!(email_at < pk_at && pk_at < rk_at);
    Ok(())
}

#[test]
fn test_table_entry() -> Result<(), Box<dyn Error>> {
    let xml = table_entry("people")?;
    assert!(xml.contains("<d:TableName>people</d:TableName>"));
    assert!(!xml.contains("PartitionKey"));
    Ok(())
}

// Shaped like a real table service query response: entry etags ride on an
// m:etag attribute, the Timestamp property uses 7-digit fractional seconds.
const FEED: &str = r#"<?xml version="1.0" encoding="utf-8" standalone="yes"?>
<feed xml:base="https://myaccount.table.core.windows.net/" xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices" xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata" xmlns="http://www.w3.org/2005/Atom">
  <title type="text">contacts</title>
  <id>https://myaccount.table.core.windows.net/contacts</id>
  <updated>2008-10-01T15:26:13Z</updated>
  <link rel="self" title="contacts" href="contacts" />
  <entry m:etag="W/&quot;datetime'2008-10-01T15%3A26%3A13.1873504Z'&quot;">
    <id>https://myaccount.table.core.windows.net/contacts(PartitionKey='Ritchie',RowKey='Peter')</id>
    <updated>2008-10-01T15:26:13Z</updated>
    <content type="application/xml">
      <m:properties>
        <d:PartitionKey>Ritchie</d:PartitionKey>
        <d:RowKey>Peter</d:RowKey>
        <d:Timestamp m:type="Edm.DateTime">2008-10-01T15:26:13.1873504Z</d:Timestamp>
        <d:Email>1@2.com</d:Email>
        <d:PhoneNumber>555-0123</d:PhoneNumber>
        <d:Age m:type="Edm.Int32">42</d:Age>
        <d:Active m:type="Edm.Boolean">true</d:Active>
      </m:properties>
    </content>
  </entry>
  <entry m:etag="W/&quot;datetime'2008-10-01T15%3A26%3A14.0000001Z'&quot;">
    <id>https://myaccount.table.core.windows.net/contacts(PartitionKey='Ritchie',RowKey='Paul')</id>
    <updated>2008-10-01T15:26:14Z</updated>
    <content type="application/xml">
      <m:properties>
        <d:PartitionKey>Ritchie</d:PartitionKey>
        <d:RowKey>Paul</d:RowKey>
        <d:Timestamp m:type="Edm.DateTime">2008-10-01T15:26:14.0000001Z</d:Timestamp>
        <d:Email m:null="true" />
        <d:PhoneNumber></d:PhoneNumber>
        <d:Age m:type="Edm.Int32">notanumber</d:Age>
      </m:properties>
    </content>
  </entry>
</feed>"#;

#[test]
fn test_parse_feed() -> Result<(), Box<dyn Error>> {
    let entries = parse_feed(FEED)?;
    assert_eq!(entries.len(), 2);

    let first: ContactEntity = entries[0].hydrate();
    assert_eq!(first.partition_key(), "Ritchie");
    assert_eq!(first.row_key(), "Peter");
    assert_eq!(
        first.etag.as_deref(),
        Some("W/\"datetime'2008-10-01T15%3A26%3A13.1873504Z'\"")
    );
    assert!(first.timestamp.is_some());
    assert_eq!(first.email, "1@2.com");
    assert_eq!(first.age, 42);
    assert_eq!(first.active, true);

    let second: ContactEntity = entries[1].hydrate();
    assert_eq!(second.row_key(), "Paul");
    // null property: field keeps its default
    assert_eq!(second.email, "");
    // empty element: the empty string
    assert_eq!(second.phone_number, "");
    // unparseable Int32 degrades to String; conversion to i32 then fails
    // silently and the field keeps its default
    assert_eq!(second.age, 0);
    // Active absent entirely
    assert_eq!(second.active, false);
    Ok(())
}

#[test]
fn test_parse_single_entry_with_etag() -> Result<(), Box<dyn Error>> {
    let body = r#"<?xml version="1.0" encoding="utf-8" standalone="yes"?>
<entry xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices" xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata" m:etag="W/&quot;1&quot;" xmlns="http://www.w3.org/2005/Atom">
  <content type="application/xml">
    <m:properties>
      <d:PartitionKey>p</d:PartitionKey>
      <d:RowKey>r</d:RowKey>
      <d:Email>a@b.com</d:Email>
    </m:properties>
  </content>
</entry>"#;
    let entry = parse_entry(body)?;
    assert_eq!(entry.partition_key, "p");
    assert_eq!(entry.row_key, "r");
    assert_eq!(entry.etag.as_deref(), Some("W/\"1\""));
    Ok(())
}

#[test]
fn test_etag_from_reserved_property() -> Result<(), Box<dyn Error>> {
    // no m:etag attribute; the token rides as a d:ETag property element
    let body = r#"<?xml version="1.0" encoding="utf-8" standalone="yes"?>
<entry xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices" xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata" xmlns="http://www.w3.org/2005/Atom">
  <content type="application/xml">
    <m:properties>
      <d:PartitionKey>p</d:PartitionKey>
      <d:RowKey>r</d:RowKey>
      <d:ETag>W/"7"</d:ETag>
      <d:Email>a@b.com</d:Email>
    </m:properties>
  </content>
</entry>"#;
    let entry = parse_entry(body)?;
    assert_eq!(entry.etag.as_deref(), Some("W/\"7\""));
    // not carried as an ordinary data property
    assert!(entry.props.get("ETag").is_none());
    let c: ContactEntity = entry.hydrate();
    assert_eq!(c.etag.as_deref(), Some("W/\"7\""));
    assert_eq!(c.email, "a@b.com");
    Ok(())
}

#[test]
fn test_etag_attribute_wins_over_property() -> Result<(), Box<dyn Error>> {
    let body = r#"<?xml version="1.0" encoding="utf-8" standalone="yes"?>
<entry xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices" xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata" m:etag="W/&quot;8&quot;" xmlns="http://www.w3.org/2005/Atom">
  <content type="application/xml">
    <m:properties>
      <d:PartitionKey>p</d:PartitionKey>
      <d:RowKey>r</d:RowKey>
      <d:ETag>W/"7"</d:ETag>
    </m:properties>
  </content>
</entry>"#;
    let entry = parse_entry(body)?;
    assert_eq!(entry.etag.as_deref(), Some("W/\"8\""));
    Ok(())
}

#[test]
fn test_entry_missing_partition_key() {
    let body = r#"<?xml version="1.0" encoding="utf-8" standalone="yes"?>
<entry xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices" xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata" xmlns="http://www.w3.org/2005/Atom">
  <content type="application/xml">
    <m:properties>
      <d:RowKey>r</d:RowKey>
    </m:properties>
  </content>
</entry>"#;
    match parse_entry(body) {
        Ok(_) => panic!("expected an error for an entry with no PartitionKey"),
        Err(e) => assert_eq!(e.code, TableErrorCode::BadResponse),
    }
}

#[test]
fn test_parse_empty_feed() -> Result<(), Box<dyn Error>> {
    let body = r#"<?xml version="1.0" encoding="utf-8" standalone="yes"?>
<feed xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices" xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata" xmlns="http://www.w3.org/2005/Atom">
  <title type="text">contacts</title>
  <updated>2008-10-01T15:26:13Z</updated>
</feed>"#;
    let entries = parse_feed(body)?;
    assert!(entries.is_empty());
    Ok(())
}

#[test]
fn test_case_insensitive_property_matching() -> Result<(), Box<dyn Error>> {
    let body = r#"<?xml version="1.0" encoding="utf-8" standalone="yes"?>
<entry xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices" xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata" xmlns="http://www.w3.org/2005/Atom">
  <content type="application/xml">
    <m:properties>
      <d:PartitionKey>p</d:PartitionKey>
      <d:RowKey>r</d:RowKey>
      <d:EMAIL>a@b.com</d:EMAIL>
      <d:UnknownColumn>ignored</d:UnknownColumn>
    </m:properties>
  </content>
</entry>"#;
    let c: ContactEntity = parse_entry(body)?.hydrate();
    assert_eq!(c.email, "a@b.com");
    Ok(())
}

#[test]
fn test_guid_and_datetime_values() -> Result<(), Box<dyn Error>> {
    let mut m = PropertyMap::new();
    let g = Guid::parse("c9da6455-213d-42c9-9a79-3e9149a57833")?;
    m.put("Id", g.clone());
    let t = DateTime::parse_from_rfc3339("2008-10-01T15:26:13.1873504Z")?;
    m.put("When", t);
    assert_eq!(m.get("Id"), Some(&PropertyValue::Guid(g)));
    match m.get("When") {
        Some(PropertyValue::DateTime(dt)) => assert_eq!(*dt, t),
        other => panic!("unexpected value: {:?}", other),
    }
    assert!(Guid::parse("not-a-guid").is_err());
    assert!(Guid::parse("c9da6455213d42c99a793e9149a57833").is_err());
    Ok(())
}
