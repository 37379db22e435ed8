//! XML utilities for scanner protocol drivers.
//!
//! eSCL and WS-Scan exchange small XML documents whose namespace prefixes
//! vary from vendor to vendor. This crate provides the three pieces a
//! driver needs to deal with them:
//!
//! - [`XmlReader`]: a cursor over a parsed document that reports element
//!   names and paths with namespace prefixes normalized through a table of
//!   [`XmlNs`] glob rules;
//! - [`XmlWriter`]: a builder for request documents, serialized compact or
//!   indented;
//! - [`reformat`]: a pretty-printer for logging raw messages.
//!
//! # Example
//!
//! ```rust
//! use airscan_xml::{XmlNs, XmlReader, XmlWriter};
//!
//! const NS: &[XmlNs<'static>] = &[
//!     XmlNs::new("scan", "http://schemas.hp.com/imaging/escl/2011/05/03"),
//!     XmlNs::new("pwg", "http://www.pwg.org/schemas/2010/12/sm"),
//! ];
//!
//! let mut xml = XmlWriter::begin("scan:ScanSettings", NS);
//! xml.add_text("pwg:Version", "2.6");
//! xml.add_uint("scan:XResolution", 300);
//! let request = xml.finish();
//!
//! let mut reader = XmlReader::begin(request.as_bytes(), Some(NS)).unwrap();
//! reader.enter();
//! reader.next();
//! assert_eq!(reader.path(), Some("scan:ScanSettings/scan:XResolution"));
//! assert_eq!(reader.value_uint().unwrap(), 300);
//! ```
//!
//! Malformed input is reported through [`Error`]; [`Error::kind`] tells a
//! syntax problem apart from a bad value:
//!
//! ```rust
//! use airscan_xml::{ErrorKind, XmlReader};
//!
//! let err = XmlReader::begin(b"<a><b></a>", None).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::MalformedInput);
//! ```

pub mod error;
pub mod format;
mod ns;
pub mod parser;
pub mod reader;
pub mod types;
pub mod writer;

// Re-export main types
pub use error::{Error, ErrorKind, Result};
pub use format::{format_to, reformat};
pub use parser::parse;
pub use reader::XmlReader;
pub use types::{
    Attribute, Declaration, Document, Namespace, Node, NodeId, NodeKind, XmlAttr, XmlNs,
};
pub use writer::{Format, XmlWriter};
