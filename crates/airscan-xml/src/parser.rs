//! XML parser that materializes quick-xml events into a [`Document`].

use crate::types::{Attribute, Declaration, Document, Namespace, NodeId, NodeKind};
use crate::{Error, Result};
use quick_xml::NsReader;
use quick_xml::events::{BytesDecl, BytesStart, BytesText, Event};
use quick_xml::name::ResolveResult;
use std::borrow::Cow;

/// Deepest element nesting accepted, counting the root as 1.
pub const MAX_DEPTH: usize = 256;

/// Parse a complete XML document.
///
/// The whole document is materialized before returning; a malformed
/// document produces an error and no partial tree.
///
/// Text is decoded from the encoding named by a byte order mark or the
/// XML declaration, UTF-8 otherwise. Elements nested deeper than
/// [`MAX_DEPTH`] are rejected.
///
/// # Example
///
/// ```rust
/// use airscan_xml::parse;
///
/// let doc = parse(b"<root><child/></root>").unwrap();
/// let root = doc.root().unwrap();
/// assert_eq!(doc.node(root).name, "root");
/// ```
///
/// # Errors
///
/// Returns an error if the XML is malformed.
pub fn parse(content: &[u8]) -> Result<Document> {
    XmlParser::new(content).parse()
}

/// Internal parser state.
struct XmlParser<'a> {
    /// The quick-xml reader.
    reader: NsReader<&'a [u8]>,

    /// Tree being built.
    doc: Document,

    /// Open elements with their qualified names.
    stack: Vec<(NodeId, String)>,
}

impl<'a> XmlParser<'a> {
    fn new(content: &'a [u8]) -> Self {
        let mut reader = NsReader::from_reader(content);
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;
        reader.config_mut().check_end_names = true;

        Self {
            reader,
            doc: Document::new(),
            stack: Vec::new(),
        }
    }

    fn current(&self) -> NodeId {
        self.stack.last().map_or(NodeId::DOCUMENT, |(id, _)| *id)
    }

    fn parse(mut self) -> Result<Document> {
        loop {
            let event = match self.reader.read_event() {
                Ok(event) => event,
                Err(e) => {
                    return Err(Error::XmlSyntax {
                        message: e.to_string(),
                        position: Some(self.reader.error_position()),
                    });
                }
            };

            match event {
                Event::Start(e) => {
                    let id = self.handle_start(&e)?;
                    let qname = self.decode(e.name().as_ref())?;
                    self.stack.push((id, qname));
                }
                Event::Empty(e) => {
                    self.handle_start(&e)?;
                }
                Event::End(e) => {
                    if self.stack.pop().is_none() {
                        return Err(Error::InvalidStructure {
                            message: format!(
                                "Unexpected closing tag </{}>",
                                String::from_utf8_lossy(e.name().as_ref())
                            ),
                        });
                    }
                }
                Event::Text(e) => {
                    self.handle_text(&e)?;
                }
                Event::CData(e) => {
                    let text = self.decode(&e)?;
                    self.handle_character_data(NodeKind::CData, Cow::Owned(text))?;
                }
                Event::Comment(e) => {
                    let text = self.decode(&e)?;
                    let id = self.doc.append(self.current(), NodeKind::Comment);
                    self.doc.node_mut(id).text = text;
                }
                Event::PI(e) => {
                    let target = self.decode(e.target())?;
                    let content = self.decode(e.content())?;
                    let id = self
                        .doc
                        .append(self.current(), NodeKind::ProcessingInstruction);
                    let node = self.doc.node_mut(id);
                    node.name = target;
                    node.text = content.trim().to_string();
                }
                Event::Decl(e) => {
                    self.doc.declaration = Some(declaration(&e)?);
                }
                Event::DocType(e) => {
                    // Kept verbatim, the DTD is not interpreted
                    if !self.stack.is_empty() || self.doc.root().is_some() {
                        return Err(Error::InvalidStructure {
                            message: "Document type declaration after the root element".to_string(),
                        });
                    }
                    let text = self.decode(&e)?;
                    let id = self.doc.append(NodeId::DOCUMENT, NodeKind::DocType);
                    self.doc.node_mut(id).text = text;
                }
                Event::Eof => break,
            }
        }

        // Check for unclosed elements
        if let Some((_, qname)) = self.stack.last() {
            return Err(Error::UnexpectedEof {
                expected: format!("closing tag </{}>", qname),
            });
        }

        if self.doc.root().is_none() {
            return Err(Error::EmptyDocument);
        }

        Ok(self.doc)
    }

    fn handle_start(&mut self, e: &BytesStart<'_>) -> Result<NodeId> {
        if self.stack.is_empty() && self.doc.root().is_some() {
            return Err(Error::MultipleRoots);
        }
        if self.stack.len() >= MAX_DEPTH {
            return Err(Error::InvalidStructure {
                message: format!("Elements nested deeper than {} levels", MAX_DEPTH),
            });
        }

        let (name, namespace) = self.resolve_name(e)?;
        let attributes = self.parse_attributes(e)?;

        let id = self.doc.append(self.current(), NodeKind::Element);
        let node = self.doc.node_mut(id);
        node.name = name;
        node.namespace = namespace;
        node.attributes = attributes;

        Ok(id)
    }

    /// Split an element name into its local part and resolved namespace.
    ///
    /// A prefix with no binding in scope leaves the qualified name intact
    /// and the element without a namespace.
    fn resolve_name(&self, e: &BytesStart<'_>) -> Result<(String, Option<Namespace>)> {
        let qname = e.name();
        let (resolved, local) = self.reader.resolve_element(qname);

        match resolved {
            ResolveResult::Bound(ns) => {
                let namespace = Namespace {
                    prefix: qname
                        .prefix()
                        .map(|p| self.decode(p.as_ref()))
                        .transpose()?,
                    uri: self.decode(ns.as_ref())?,
                };
                Ok((self.decode(local.as_ref())?, Some(namespace)))
            }
            ResolveResult::Unbound => Ok((self.decode(local.as_ref())?, None)),
            ResolveResult::Unknown(_) => Ok((self.decode(qname.as_ref())?, None)),
        }
    }

    fn parse_attributes(&self, e: &BytesStart<'_>) -> Result<Vec<Attribute>> {
        let mut attributes = Vec::new();

        for attr_result in e.attributes() {
            let attr = attr_result?;

            let value = attr
                .decode_and_unescape_value(self.reader.decoder())
                .map_err(|err| Error::XmlSyntax {
                    message: format!("Invalid attribute value: {}", err),
                    position: None,
                })?;

            attributes.push(Attribute {
                name: self.decode(attr.key.as_ref())?,
                value: value.into_owned(),
            });
        }

        Ok(attributes)
    }

    /// Decode raw markup bytes in the document encoding.
    fn decode(&self, bytes: &[u8]) -> Result<String> {
        self.reader
            .decoder()
            .decode(bytes)
            .map(Cow::into_owned)
            .map_err(|err| Error::XmlSyntax {
                message: format!("Cannot decode input: {}", err),
                position: None,
            })
    }

    fn handle_text(&mut self, e: &BytesText<'_>) -> Result<()> {
        let text = e.unescape().map_err(|err| Error::XmlSyntax {
            message: format!("Invalid text content: {}", err),
            position: None,
        })?;

        self.handle_character_data(NodeKind::Text, text)
    }

    fn handle_character_data(&mut self, kind: NodeKind, text: Cow<'_, str>) -> Result<()> {
        if self.stack.is_empty() {
            // Outside of the root element only whitespace is allowed
            if text.trim().is_empty() {
                return Ok(());
            }
            return Err(Error::InvalidStructure {
                message: "Character data outside of the root element".to_string(),
            });
        }

        let id = self.doc.append(self.current(), kind);
        self.doc.node_mut(id).text = text.into_owned();
        Ok(())
    }
}

fn declaration(e: &BytesDecl<'_>) -> Result<Declaration> {
    let lossy = |bytes: Cow<'_, [u8]>| String::from_utf8_lossy(&bytes).into_owned();

    Ok(Declaration {
        version: lossy(e.version()?),
        encoding: e.encoding().transpose()?.map(lossy),
        standalone: e.standalone().transpose()?.map(lossy),
    })
}
