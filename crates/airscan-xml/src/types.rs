//! Core types: namespace/attribute tables and the parsed document tree.

use serde::Serialize;
use std::borrow::Cow;

/// A namespace table entry.
///
/// The same shape serves two purposes:
/// - for [`XmlWriter`](crate::XmlWriter), `uri` is an exact namespace URI
///   declared on the root element as `xmlns:prefix="uri"`;
/// - for [`XmlReader`](crate::XmlReader), `uri` is a shell-style glob
///   pattern and `prefix` is the canonical prefix substituted for every
///   namespace whose URI matches it.
///
/// Tables are plain slices, so they can be `const` or `static`. An entry
/// with both fields empty terminates a table early.
///
/// Reader patterns follow shell wildcard rules: `*` matches any run of
/// characters including `/` (as does `**`), `?` matches one character and
/// `[...]` a character class. A backslash has no escaping meaning. A
/// pattern that fails to compile matches only the identical URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct XmlNs<'a> {
    /// Namespace prefix.
    pub prefix: &'a str,
    /// Namespace URI (writer) or URI glob pattern (reader).
    pub uri: &'a str,
}

impl<'a> XmlNs<'a> {
    /// Table terminator.
    pub const END: XmlNs<'static> = XmlNs { prefix: "", uri: "" };

    /// Create a new table entry.
    pub const fn new(prefix: &'a str, uri: &'a str) -> Self {
        Self { prefix, uri }
    }

    /// Check if this entry is the table terminator.
    pub fn is_end(&self) -> bool {
        self.prefix.is_empty() && self.uri.is_empty()
    }
}

/// Iterate a namespace table up to its terminator, if any.
pub(crate) fn ns_table<'t, 'a>(table: &'t [XmlNs<'a>]) -> impl Iterator<Item = &'t XmlNs<'a>> {
    table.iter().take_while(|ns| !ns.is_end())
}

/// An attribute attached to a written element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct XmlAttr<'a> {
    /// Attribute name, possibly prefixed.
    pub name: &'a str,
    /// Attribute value (escaped on output).
    pub value: &'a str,
}

impl<'a> XmlAttr<'a> {
    /// Create a new attribute.
    pub const fn new(name: &'a str, value: &'a str) -> Self {
        Self { name, value }
    }
}

/// Index of a node inside its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The document node. Every [`Document`] has one.
    pub const DOCUMENT: NodeId = NodeId(0);

    /// Position of this node in document order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Kind of a parsed node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// The document itself; parent of the root element.
    Document,
    /// An element.
    Element,
    /// Character data (entities already resolved).
    Text,
    /// A `<![CDATA[...]]>` section.
    CData,
    /// A `<!--...-->` comment.
    Comment,
    /// A `<?target ...?>` processing instruction.
    ProcessingInstruction,
    /// A `<!DOCTYPE ...>` declaration, kept as unparsed text.
    DocType,
}

/// Namespace an element belongs to, as written in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    /// Prefix used in the document; `None` for the default namespace.
    pub prefix: Option<String>,
    /// Namespace URI the prefix is bound to.
    pub uri: String,
}

/// A parsed attribute.
///
/// Namespace declarations (`xmlns`, `xmlns:*`) are kept as ordinary
/// attributes, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Qualified attribute name, as written.
    pub name: String,
    /// The attribute value (after unescaping XML entities).
    pub value: String,
}

/// A node of the parsed tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// Node kind.
    pub kind: NodeKind,
    /// Local name for elements, target for processing instructions,
    /// empty otherwise.
    pub name: String,
    /// Resolved namespace of an element.
    pub namespace: Option<Namespace>,
    /// Attributes of an element.
    pub attributes: Vec<Attribute>,
    /// Character data of text, CDATA and comment nodes; content of a
    /// processing instruction or document type declaration.
    pub text: String,
    /// Children in document order.
    pub children: Vec<NodeId>,
    /// Parent node; `None` only for the document node.
    pub parent: Option<NodeId>,
    /// Next sibling.
    pub next: Option<NodeId>,
}

impl Node {
    fn new(kind: NodeKind, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            name: String::new(),
            namespace: None,
            attributes: Vec::new(),
            text: String::new(),
            children: Vec::new(),
            parent,
            next: None,
        }
    }

    /// Check if this node is an element.
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    /// Element name as written in the document, `prefix:local` or `local`.
    pub fn qualified_name(&self) -> Cow<'_, str> {
        match self.namespace.as_ref().and_then(|ns| ns.prefix.as_deref()) {
            Some(prefix) => Cow::Owned(format!("{}:{}", prefix, self.name)),
            None => Cow::Borrowed(&self.name),
        }
    }

    /// Get an attribute value by qualified name.
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }
}

/// The XML declaration of a parsed document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Declaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

/// A fully materialized XML document.
///
/// Nodes live in a single pool and refer to each other by [`NodeId`]; node
/// `0` is the document node, whose children are the root element, the
/// document type declaration if any, and top-level comments or processing
/// instructions.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    /// The XML declaration, if the document had one.
    pub declaration: Option<Declaration>,
}

impl Document {
    pub(crate) fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Document, None)],
            declaration: None,
        }
    }

    /// Append a new node as the last child of `parent`.
    pub(crate) fn append(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        if let Some(&last) = self.nodes[parent.0].children.last() {
            self.nodes[last.0].next = Some(id);
        }
        self.nodes[parent.0].children.push(id);
        self.nodes.push(Node::new(kind, Some(parent)));
        id
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Get a node by id.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Number of nodes, including the document node.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the document has nothing but the document node.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// The root element.
    pub fn root(&self) -> Option<NodeId> {
        self.first_element(self.node(NodeId::DOCUMENT).children.first().copied())
    }

    /// Skip non-element nodes, starting from `id` and following sibling
    /// links.
    pub fn first_element(&self, mut id: Option<NodeId>) -> Option<NodeId> {
        while let Some(node) = id {
            if self.node(node).is_element() {
                break;
            }
            id = self.node(node).next;
        }
        id
    }

    /// Concatenated character data of all descendants, in document order.
    ///
    /// For a text-like node, its own text.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut buf = String::new();
        self.collect_text(id, &mut buf);
        buf
    }

    fn collect_text(&self, id: NodeId, buf: &mut String) {
        let node = self.node(id);
        match node.kind {
            NodeKind::Text | NodeKind::CData => buf.push_str(&node.text),
            NodeKind::Document | NodeKind::Element => {
                for &child in &node.children {
                    self.collect_text(child, buf);
                }
            }
            NodeKind::Comment | NodeKind::ProcessingInstruction | NodeKind::DocType => {}
        }
    }
}
