//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
include!(concat!(env!("OUT_DIR"), "/ua.rs"));

pub(crate) fn sdk_version() -> &'static str {
    SDK_VERSION
}

pub(crate) fn user_agent() -> &'static str {
    USER_AGENT
}

/// Error type returned by all fallible operations in this library.
#[derive(Debug, Clone)]
pub struct TableError {
    pub code: TableErrorCode,
    /// The HTTP status the service answered with, when the error came from
    /// an unexpected response rather than from the client itself.
    pub status: Option<u16>,
    pub message: String,
}

impl std::error::Error for TableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.status {
            Some(s) => write!(
                f,
                "code={:?} status={} message=\"{}\"",
                self.code, s, self.message
            ),
            None => write!(f, "code={:?} message=\"{}\"", self.code, self.message),
        }
    }
}

impl TableError {
    pub fn new(code: TableErrorCode, msg: &str) -> TableError {
        TableError {
            code,
            status: None,
            message: msg.to_string(),
        }
    }

    pub(crate) fn from_status(status: u16, msg: &str) -> TableError {
        TableError {
            code: TableErrorCode::HttpStatus,
            status: Some(status),
            message: msg.to_string(),
        }
    }
}

macro_rules! ia_error {
    ($($t:tt)*) => {{
        let m = format!($($t)*);
        crate::error::TableError {
            code: crate::error::TableErrorCode::IllegalArgument,
            status: None,
            message: format!("{} ({})", m, crate::error::sdk_version()),
        }
    }};
}

pub(crate) use ia_error;

macro_rules! ia_err {
    ($($t:tt)*) => {{
        let m = format!($($t)*);
        Err(crate::error::TableError {
            code: crate::error::TableErrorCode::IllegalArgument,
            status: None,
            message: format!("{} ({})", m, crate::error::sdk_version()),
        })
    }};
}

pub(crate) use ia_err;

macro_rules! bad_response {
    ($($t:tt)*) => {{
        crate::error::TableError {
            code: crate::error::TableErrorCode::BadResponse,
            status: None,
            message: format!($($t)*),
        }
    }};
}

pub(crate) use bad_response;

impl From<reqwest::Error> for TableError {
    fn from(e: reqwest::Error) -> Self {
        let mut code = TableErrorCode::ConnectionError;
        if e.is_timeout() {
            code = TableErrorCode::RequestTimeout;
        }
        TableError {
            code,
            status: None,
            message: format!("reqwest error: {} ({})", e, crate::error::sdk_version()),
        }
    }
}

impl From<reqwest::header::InvalidHeaderValue> for TableError {
    fn from(e: reqwest::header::InvalidHeaderValue) -> Self {
        ia_error!("invalid header value: {}", e)
    }
}

impl From<url::ParseError> for TableError {
    fn from(e: url::ParseError) -> Self {
        ia_error!("error parsing url: {}", e)
    }
}

impl From<chrono::ParseError> for TableError {
    fn from(e: chrono::ParseError) -> Self {
        ia_error!("invalid datetime value: {}", e)
    }
}

impl From<base64::DecodeError> for TableError {
    fn from(e: base64::DecodeError) -> Self {
        TableError {
            code: TableErrorCode::InvalidKeyEncoding,
            status: None,
            message: format!("account key is not valid base64: {}", e),
        }
    }
}

impl From<std::io::Error> for TableError {
    fn from(e: std::io::Error) -> Self {
        ia_error!("i/o error: {}", e)
    }
}

impl From<quick_xml::Error> for TableError {
    fn from(e: quick_xml::Error) -> Self {
        bad_response!("malformed XML in response: {}", e)
    }
}

impl From<quick_xml::events::attributes::AttrError> for TableError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        bad_response!("malformed XML attribute in response: {}", e)
    }
}

/// The kinds of errors surfaced by this library.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TableErrorCode {
    /// The application provided an illegal argument for the operation,
    /// such as an empty account name or an unparseable filter value.
    IllegalArgument,

    /// A table creation was attempted but the named table already exists.
    TableAlreadyExists,

    /// An entity insert was attempted but an entity with the same
    /// PartitionKey/RowKey pair already exists in the table.
    EntityAlreadyExists,

    /// The service answered with a payload this library could not decode:
    /// malformed XML, or an entity entry missing its identity properties.
    BadResponse,

    /// The configured account key could not be decoded as base64.
    InvalidKeyEncoding,

    /// The service answered with an HTTP status the operation does not
    /// give a specific meaning to. The status is in
    /// [`TableError::status`].
    HttpStatus,

    /// The request did not complete within the configured timeout.
    RequestTimeout,

    /// The request could not be sent or the connection failed mid-flight.
    ConnectionError,
}
