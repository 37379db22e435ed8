//! XML pretty-printer.
//!
//! Reformats arbitrary XML text with two-space indentation, one element
//! per line. Used for dumping protocol messages to trace logs.

use crate::parser;
use crate::types::{Document, NodeId, NodeKind};
use crate::{Error, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use std::io::Write;

/// Reformat an XML document with indentation.
///
/// Whitespace between elements is replaced by indentation. Text is kept,
/// so elements with mixed content keep their inline children on one line.
///
/// # Errors
///
/// Returns an error of kind
/// [`MalformedInput`](crate::ErrorKind::MalformedInput) if `xml` is not a
/// well-formed document, or [`Error::EmptyOutput`] if nothing was produced.
pub fn reformat(xml: &[u8]) -> Result<Vec<u8>> {
    let doc = parser::parse(xml).inspect_err(|err| {
        tracing::debug!(error = %err, "Failed to parse XML for formatting");
    })?;

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    // Output is always UTF-8, whatever the input was encoded in
    let decl = doc.declaration.as_ref();
    writer.write_event(Event::Decl(BytesDecl::new(
        decl.map_or("1.0", |d| d.version.as_str()),
        decl.and_then(|d| d.encoding.as_ref()).map(|_| "UTF-8"),
        decl.and_then(|d| d.standalone.as_deref()),
    )))?;

    for &child in &doc.node(NodeId::DOCUMENT).children {
        write_node(&mut writer, &doc, child)?;
    }

    let mut out = writer.into_inner();
    if out.is_empty() {
        return Err(Error::EmptyOutput);
    }
    out.push(b'\n');

    Ok(out)
}

/// Reformat `xml` into `sink`.
///
/// Either writes the whole formatted document and returns `true`, or
/// writes nothing and returns `false`.
pub fn format_to<W: Write>(sink: &mut W, xml: &[u8]) -> bool {
    let out = match reformat(xml) {
        Ok(out) => out,
        Err(_) => return false,
    };

    match sink.write_all(&out) {
        Ok(()) => true,
        Err(err) => {
            tracing::debug!(error = %err, "Failed to write formatted XML");
            false
        }
    }
}

fn write_node(writer: &mut Writer<Vec<u8>>, doc: &Document, id: NodeId) -> Result<()> {
    let node = doc.node(id);

    match node.kind {
        NodeKind::Element => {
            let name = node.qualified_name();
            let start = BytesStart::new(&*name).with_attributes(
                node.attributes
                    .iter()
                    .map(|attr| (attr.name.as_str(), attr.value.as_str())),
            );

            // Blank text is layout only when there is no other text around
            let element_only = node.children.iter().all(|&child| {
                let child = doc.node(child);
                child.kind != NodeKind::CData
                    && (child.kind != NodeKind::Text || child.text.trim().is_empty())
            });
            let children: Vec<NodeId> = node
                .children
                .iter()
                .copied()
                .filter(|&child| {
                    !(element_only && doc.node(child).kind == NodeKind::Text)
                })
                .collect();

            if children.is_empty() {
                writer.write_event(Event::Empty(start))?;
            } else {
                writer.write_event(Event::Start(start))?;
                for child in children {
                    write_node(writer, doc, child)?;
                }
                writer.write_event(Event::End(BytesEnd::new(&*name)))?;
            }
        }
        NodeKind::Text => {
            writer.write_event(Event::Text(BytesText::new(&node.text)))?;
        }
        NodeKind::CData => {
            writer.write_event(Event::CData(BytesCData::new(node.text.as_str())))?;
        }
        NodeKind::Comment => {
            writer.write_event(Event::Comment(BytesText::from_escaped(node.text.as_str())))?;
        }
        NodeKind::ProcessingInstruction => {
            let content = if node.text.is_empty() {
                node.name.clone()
            } else {
                format!("{} {}", node.name, node.text)
            };
            writer.write_event(Event::PI(BytesPI::new(content)))?;
        }
        NodeKind::DocType => {
            writer.write_event(Event::DocType(BytesText::from_escaped(node.text.as_str())))?;
        }
        NodeKind::Document => {}
    }

    Ok(())
}
