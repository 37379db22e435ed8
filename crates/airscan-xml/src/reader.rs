//! Cursor-style XML reader.
//!
//! [`XmlReader`] parses a whole document up front and then walks it under
//! caller control: [`next`](XmlReader::next) moves to the following
//! sibling, [`enter`](XmlReader::enter) and [`leave`](XmlReader::leave)
//! move down and up, and [`deep_next`](XmlReader::deep_next) does a
//! pre-order walk. Only element nodes are visited; text, comments and
//! processing instructions are skipped.
//!
//! At every position the reader exposes the node's name and its full path
//! from the root, both using substituted namespace prefixes (see
//! [`XmlNs`]), so protocol code can dispatch on stable strings:
//!
//! ```rust
//! use airscan_xml::{XmlNs, XmlReader};
//!
//! const RULES: &[XmlNs<'static>] = &[XmlNs::new("scan", "http://schemas.hp.com/imaging/escl/*")];
//!
//! let xml = br#"<e:ScannerStatus xmlns:e="http://schemas.hp.com/imaging/escl/2011/05/03">
//!   <e:State>Idle</e:State>
//! </e:ScannerStatus>"#;
//!
//! let mut reader = XmlReader::begin(xml, Some(RULES)).unwrap();
//! let mut state = None;
//! while !reader.end() {
//!     if reader.path() == Some("scan:ScannerStatus/scan:State") {
//!         state = reader.value().map(str::to_string);
//!     }
//!     reader.deep_next(0);
//! }
//! assert_eq!(state.as_deref(), Some("Idle"));
//! ```

use crate::ns::NsSubst;
use crate::parser;
use crate::types::{Document, Node, NodeId, XmlNs};
use crate::{Error, Result};
use once_cell::unsync::OnceCell;

/// Lazily computed text value of the node under the cursor.
///
/// The cell belongs to one node; switching to another node discards it.
#[derive(Debug, Default)]
struct NodeValue {
    node: Option<NodeId>,
    text: OnceCell<String>,
}

impl NodeValue {
    fn switch(&mut self, node: Option<NodeId>) {
        if self.node != node {
            self.node = node;
            self.text = OnceCell::new();
        }
    }

    fn get<'d>(&'d self, doc: &Document) -> Option<&'d str> {
        let node = self.node?;
        let text = self
            .text
            .get_or_init(|| doc.text_content(node).trim_ascii().to_string());
        Some(text.as_str())
    }
}

/// XML document cursor.
///
/// `'r` is the lifetime of the namespace substitution table, which the
/// reader borrows rather than copies.
pub struct XmlReader<'r> {
    /// The parsed document.
    doc: Document,

    /// Current node; `None` past the last sibling.
    node: Option<NodeId>,

    /// Parent of the current level.
    parent: Option<NodeId>,

    /// Depth of the current level, 0 for the root.
    depth: usize,

    /// `/`-separated path to the current node.
    path: String,

    /// `pathlen[d]` is the path length right after entering depth `d + 1`,
    /// i.e. the offset where names at depth `d + 1` start.
    pathlen: Vec<usize>,

    /// Offset of the current node's name within `path`.
    name_start: usize,

    /// Cached value of the current node.
    value: NodeValue,

    /// Namespace prefix substitution.
    subst: NsSubst<'r>,
}

impl<'r> XmlReader<'r> {
    /// Parse `xml` and position the cursor at the root element.
    ///
    /// `rules`, if given, is a table of namespace substitution rules: each
    /// entry maps a URI glob pattern to a canonical prefix.
    ///
    /// # Errors
    ///
    /// Returns an error of kind
    /// [`MalformedInput`](crate::ErrorKind::MalformedInput) if `xml` is not
    /// a well-formed document; no reader is created.
    pub fn begin(xml: &[u8], rules: Option<&'r [XmlNs<'r>]>) -> Result<Self> {
        let doc = parser::parse(xml).inspect_err(|err| {
            tracing::debug!(error = %err, "Failed to parse XML");
        })?;

        let mut reader = Self {
            node: doc.root(),
            doc,
            parent: None,
            depth: 0,
            path: String::new(),
            pathlen: Vec::with_capacity(8),
            name_start: 0,
            value: NodeValue::default(),
            subst: NsSubst::new(rules),
        };

        reader.node_switched();
        Ok(reader)
    }

    /// Finish reading and release the document.
    ///
    /// Dropping the reader has the same effect.
    pub fn finish(self) {}

    /// The parsed document.
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Id of the current node; `None` at end.
    pub fn node_id(&self) -> Option<NodeId> {
        self.node
    }

    /// The current node; `None` at end.
    pub fn node(&self) -> Option<&Node> {
        self.node.map(|id| self.doc.node(id))
    }

    /// Check if the cursor moved past the last node of the current level.
    pub fn end(&self) -> bool {
        self.node.is_none()
    }

    /// Depth of the current level; the root element is at depth 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Qualified name of the current node with its substituted prefix.
    pub fn name(&self) -> Option<&str> {
        self.node.map(|_| &self.path[self.name_start..])
    }

    /// Full path from the root to the current node, `/`-separated.
    pub fn path(&self) -> Option<&str> {
        self.node.map(|_| self.path.as_str())
    }

    /// Check if the current node's name is exactly `pattern`.
    pub fn name_matches(&self, pattern: &str) -> bool {
        self.name() == Some(pattern)
    }

    /// Text content of the current node with surrounding whitespace
    /// removed.
    ///
    /// This is all descendant character data concatenated. Computed on
    /// first use and kept until the cursor moves.
    pub fn value(&self) -> Option<&str> {
        self.value.get(&self.doc)
    }

    /// Value of the current node as an unsigned decimal integer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] if the value is missing, contains
    /// anything but ASCII digits, or does not fit into `u32`.
    pub fn value_uint(&self) -> Result<u32> {
        let value = self.value();
        let parsed = value
            .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|s| s.parse::<u32>().ok());

        parsed.ok_or_else(|| Error::InvalidValue {
            name: self.name().unwrap_or_default().to_string(),
            value: value.unwrap_or_default().to_string(),
        })
    }

    /// Move to the next sibling element.
    pub fn next(&mut self) {
        if let Some(id) = self.node {
            self.node = self.doc.first_element(self.doc.node(id).next);
            self.node_switched();
        }
    }

    /// Descend into the current node's children.
    ///
    /// If the node has no child elements, the cursor ends up at end at the
    /// new depth.
    pub fn enter(&mut self) {
        if let Some(id) = self.node {
            self.path.push('/');
            self.pathlen.truncate(self.depth);
            self.pathlen.push(self.path.len());

            self.parent = Some(id);
            self.node = self
                .doc
                .first_element(self.doc.node(id).children.first().copied());

            self.depth += 1;
            self.node_switched();
        }
    }

    /// Return to the parent node. Does nothing at depth 0.
    pub fn leave(&mut self) {
        if self.depth > 0 {
            self.depth -= 1;
            self.node = self.parent;
            if let Some(id) = self.node {
                self.parent = self.doc.node(id).parent;
            }

            self.node_switched();
        }
    }

    /// Move to the next node in document order, visiting nested nodes.
    ///
    /// The walk never climbs above `depth + 1`: once the nodes at that
    /// level are exhausted the reader stays at end there. Passing the
    /// depth of a node walks exactly that node's subtree; passing 0 from
    /// the root walks the whole document.
    pub fn deep_next(&mut self, depth: usize) {
        self.enter();

        while self.end() && self.depth > depth + 1 {
            self.leave();
            self.next();
        }
    }

    /// Refresh name and path after the current node changed.
    fn node_switched(&mut self) {
        self.value.switch(self.node);

        let pathlen = match self.depth {
            0 => 0,
            depth => self.pathlen[depth - 1],
        };
        self.path.truncate(pathlen);
        self.name_start = pathlen;

        if let Some(id) = self.node {
            let node = self.doc.node(id);
            let prefix = node
                .namespace
                .as_ref()
                .and_then(|ns| self.subst.lookup(ns.prefix.as_deref(), &ns.uri));

            if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
                self.path.push_str(prefix);
                self.path.push(':');
            }
            self.path.push_str(&node.name);
        }
    }
}

impl std::fmt::Debug for XmlReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XmlReader")
            .field("depth", &self.depth)
            .field("path", &self.path())
            .finish_non_exhaustive()
    }
}
