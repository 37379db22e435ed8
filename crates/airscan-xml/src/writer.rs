//! Incremental XML document builder.
//!
//! [`XmlWriter`] builds a tree through [`enter`](XmlWriter::enter),
//! [`leave`](XmlWriter::leave) and the `add_*` family, then serializes it
//! once:
//!
//! ```rust
//! use airscan_xml::XmlWriter;
//!
//! let mut xml = XmlWriter::begin("root", &[]);
//! xml.enter("a");
//! xml.add_text("b", "x");
//! xml.leave();
//! xml.add_text("c", "y");
//!
//! assert_eq!(
//!     xml.finish_compact(),
//!     r#"<?xml version="1.0" encoding="UTF-8"?><root><a><b>x</b></a><c>y</c></root>"#
//! );
//! ```

use crate::types::{XmlAttr, XmlNs, ns_table};
use quick_xml::escape::escape;
use serde::Serialize;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Index of the root node.
const ROOT: usize = 0;

/// Output format of [`XmlWriter::finish_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Format {
    /// Two-space indentation, one element per line.
    #[default]
    Pretty,
    /// No whitespace between tags.
    Compact,
}

/// Element being built.
#[derive(Debug)]
struct WriterNode {
    name: String,
    value: Option<String>,
    attrs: Vec<(String, String)>,
    /// Children in insertion order.
    children: Vec<usize>,
    parent: Option<usize>,
}

/// XML document builder.
///
/// `'a` is the lifetime of the namespace table declared on the root
/// element.
#[derive(Debug)]
pub struct XmlWriter<'a> {
    nodes: Vec<WriterNode>,
    current: usize,
    ns: &'a [XmlNs<'a>],
}

impl<'a> XmlWriter<'a> {
    /// Start a document with the given root element.
    ///
    /// Every entry of `ns` is declared on the root element as
    /// `xmlns:prefix="uri"`, in table order.
    pub fn begin(root: &str, ns: &'a [XmlNs<'a>]) -> Self {
        Self {
            nodes: vec![WriterNode {
                name: root.to_string(),
                value: None,
                attrs: Vec::new(),
                children: Vec::new(),
                parent: None,
            }],
            current: ROOT,
            ns,
        }
    }

    /// Add a child element to the current node and return its index.
    fn add_node(&mut self, name: &str, value: Option<&str>, attrs: &[XmlAttr<'_>]) -> usize {
        let id = self.nodes.len();
        self.nodes.push(WriterNode {
            name: name.to_string(),
            value: value.map(str::to_string),
            attrs: attrs
                .iter()
                .map(|attr| (attr.name.to_string(), attr.value.to_string()))
                .collect(),
            children: Vec::new(),
            parent: Some(self.current),
        });
        self.nodes[self.current].children.push(id);
        id
    }

    /// Add a leaf element with optional text and attributes.
    pub fn add_leaf(&mut self, name: &str, value: Option<&str>, attrs: &[XmlAttr<'_>]) {
        self.add_node(name, value, attrs);
    }

    /// Add a leaf element with text.
    pub fn add_text(&mut self, name: &str, value: &str) {
        self.add_leaf(name, Some(value), &[]);
    }

    /// Add a leaf element with text and attributes.
    pub fn add_text_attr(&mut self, name: &str, value: &str, attrs: &[XmlAttr<'_>]) {
        self.add_leaf(name, Some(value), attrs);
    }

    /// Add a leaf element with a decimal unsigned integer.
    pub fn add_uint(&mut self, name: &str, value: u32) {
        self.add_uint_attr(name, value, &[]);
    }

    /// Add a leaf element with a decimal unsigned integer and attributes.
    pub fn add_uint_attr(&mut self, name: &str, value: u32, attrs: &[XmlAttr<'_>]) {
        self.add_leaf(name, Some(&value.to_string()), attrs);
    }

    /// Add a leaf element with `true` or `false`.
    pub fn add_bool(&mut self, name: &str, value: bool) {
        self.add_bool_attr(name, value, &[]);
    }

    /// Add a leaf element with `true` or `false` and attributes.
    pub fn add_bool_attr(&mut self, name: &str, value: bool, attrs: &[XmlAttr<'_>]) {
        self.add_leaf(name, Some(if value { "true" } else { "false" }), attrs);
    }

    /// Add a child element and make it current.
    pub fn enter(&mut self, name: &str) {
        self.enter_attr(name, &[]);
    }

    /// Add a child element with attributes and make it current.
    pub fn enter_attr(&mut self, name: &str, attrs: &[XmlAttr<'_>]) {
        self.current = self.add_node(name, None, attrs);
    }

    /// Make the parent of the current element current.
    ///
    /// # Panics
    ///
    /// Panics if the current element is the root: every `leave` must pair
    /// with an earlier `enter`.
    pub fn leave(&mut self) {
        match self.nodes[self.current].parent {
            Some(parent) => self.current = parent,
            None => panic!("XmlWriter::leave() called at the root element"),
        }
    }

    /// Serialize the document with indentation.
    pub fn finish(self) -> String {
        self.finish_with(Format::Pretty)
    }

    /// Serialize the document without any inserted whitespace.
    pub fn finish_compact(self) -> String {
        self.finish_with(Format::Compact)
    }

    /// Serialize the document in the given format, consuming the writer.
    pub fn finish_with(self, format: Format) -> String {
        let mut buf = String::from(XML_DECLARATION);
        if format == Format::Pretty {
            buf.push('\n');
        }

        self.format_node(&mut buf, ROOT, 0, format);

        tracing::trace!(nodes = self.nodes.len(), ?format, "Serialized XML document");
        buf
    }

    fn format_node(&self, buf: &mut String, id: usize, level: usize, format: Format) {
        let node = &self.nodes[id];
        let pretty = format == Format::Pretty;

        if pretty {
            format_indent(buf, level);
        }

        buf.push('<');
        buf.push_str(&node.name);
        if id == ROOT {
            for ns in ns_table(self.ns) {
                format_attr(buf, &format!("xmlns:{}", ns.prefix), ns.uri);
            }
        }
        for (name, value) in &node.attrs {
            format_attr(buf, name, value);
        }
        buf.push('>');

        if node.children.is_empty() {
            if let Some(value) = &node.value {
                buf.push_str(&escape(value.as_str()));
            }
            format_end(buf, &node.name);
            if pretty {
                buf.push('\n');
            }
        } else {
            if pretty {
                buf.push('\n');
            }

            for &child in &node.children {
                self.format_node(buf, child, level + 1, format);
            }

            if pretty {
                format_indent(buf, level);
            }
            format_end(buf, &node.name);
            if pretty && level != 0 {
                buf.push('\n');
            }
        }
    }
}

fn format_indent(buf: &mut String, level: usize) {
    for _ in 0..level {
        buf.push_str("  ");
    }
}

fn format_attr(buf: &mut String, name: &str, value: &str) {
    buf.push(' ');
    buf.push_str(name);
    buf.push_str("=\"");
    buf.push_str(&escape(value));
    buf.push('"');
}

fn format_end(buf: &mut String, name: &str) {
    buf.push_str("</");
    buf.push_str(name);
    buf.push('>');
}
