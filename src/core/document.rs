/*!
 * In-memory XML tree shared by the model filter and manifest reconciler
 *
 * Start tags are kept as raw `BytesStart` events so attribute order and
 * quoting survive a load/save round-trip. Everything that is not an element
 * (text, comments, CDATA, processing instructions) is kept as the original
 * event.
 */

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::Write;
use std::path::Path;

use crate::error::{EditorError, Result};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Stable identity of an element within one loaded document
pub type NodeId = usize;

#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    Other(Event<'static>),
}

#[derive(Debug, Clone)]
pub struct Element {
    id: NodeId,
    start: BytesStart<'static>,
    children: Vec<Node>,
    self_closing: bool,
}

impl Element {
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Element name without namespace prefix
    pub fn local_name(&self) -> String {
        String::from_utf8_lossy(self.start.local_name().as_ref()).into_owned()
    }

    /// Unescaped value of the attribute with the exact key `name`
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.start
            .attributes()
            .with_checks(false)
            .flatten()
            .find(|attr| attr.key.as_ref() == name.as_bytes())
            .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Other(_) => None,
        })
    }

    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Other(_) => None,
        })
    }

    /// Concatenated text and CDATA content of the direct children
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            match node {
                Node::Other(Event::Text(text)) => match text.unescape() {
                    Ok(value) => out.push_str(&value),
                    Err(_) => out.push_str(&String::from_utf8_lossy(text)),
                },
                Node::Other(Event::CData(data)) => {
                    out.push_str(&String::from_utf8_lossy(data))
                }
                _ => {}
            }
        }
        out
    }

    /// Replace all children with a single text node
    pub fn set_text(&mut self, value: &str) {
        self.children = vec![Node::Other(Event::Text(BytesText::new(value).into_owned()))];
        self.self_closing = false;
    }

    /// All descendant elements in document order, excluding `self`
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        self.collect_descendants(&mut out);
        out
    }

    fn collect_descendants<'a>(&'a self, out: &mut Vec<&'a Element>) {
        for child in self.child_elements() {
            out.push(child);
            child.collect_descendants(out);
        }
    }

    /// First descendant in document order matching `pred`
    pub fn find_descendant(&self, pred: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        for child in self.child_elements() {
            if pred(child) {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(pred) {
                return Some(found);
            }
        }
        None
    }

    pub fn find_descendant_mut(
        &mut self,
        pred: &dyn Fn(&Element) -> bool,
    ) -> Option<&mut Element> {
        for child in self.child_elements_mut() {
            if pred(child) {
                return Some(child);
            }
            if let Some(found) = child.find_descendant_mut(pred) {
                return Some(found);
            }
        }
        None
    }

    /// Detach every descendant matching `pred`, returned in document order
    ///
    /// A detached element is not searched further; its subtree leaves with it.
    pub fn detach_where(&mut self, pred: &dyn Fn(&Element) -> bool) -> Vec<Element> {
        let mut removed = Vec::new();
        let children = std::mem::take(&mut self.children);
        for node in children {
            match node {
                Node::Element(child) if pred(&child) => removed.push(child),
                Node::Element(mut child) => {
                    removed.extend(child.detach_where(pred));
                    self.children.push(Node::Element(child));
                }
                other => self.children.push(other),
            }
        }
        removed
    }

    fn write_raw<W: Write>(&self, writer: &mut Writer<W>) -> std::io::Result<()> {
        if self.self_closing && self.children.is_empty() {
            return writer.write_event(Event::Empty(self.start.borrow()));
        }
        writer.write_event(Event::Start(self.start.borrow()))?;
        for child in &self.children {
            match child {
                Node::Element(el) => el.write_raw(writer)?,
                Node::Other(event) => writer.write_event(event.borrow())?,
            }
        }
        writer.write_event(Event::End(self.end_tag()))
    }

    fn write_indented<W: Write>(
        &self,
        writer: &mut Writer<W>,
        depth: usize,
        newline: &str,
    ) -> std::io::Result<()> {
        let indent = "  ".repeat(depth);
        writer.get_mut().write_all(indent.as_bytes())?;

        let content: Vec<&Node> = self
            .children
            .iter()
            .filter(|node| !is_whitespace_text(node))
            .collect();

        if content.is_empty() {
            writer.write_event(Event::Empty(self.start.borrow()))?;
            return writer.get_mut().write_all(newline.as_bytes());
        }

        writer.write_event(Event::Start(self.start.borrow()))?;
        let has_elements = content.iter().any(|node| matches!(node, Node::Element(_)));
        if has_elements {
            writer.get_mut().write_all(newline.as_bytes())?;
            for node in content {
                match node {
                    Node::Element(el) => el.write_indented(writer, depth + 1, newline)?,
                    Node::Other(event) => {
                        writer
                            .get_mut()
                            .write_all("  ".repeat(depth + 1).as_bytes())?;
                        writer.write_event(with_newline(event, newline))?;
                        writer.get_mut().write_all(newline.as_bytes())?;
                    }
                }
            }
            writer.get_mut().write_all(indent.as_bytes())?;
        } else {
            for node in content {
                if let Node::Other(event) = node {
                    writer.write_event(with_newline(event, newline))?;
                }
            }
        }
        writer.write_event(Event::End(self.end_tag()))?;
        writer.get_mut().write_all(newline.as_bytes())
    }

    fn end_tag(&self) -> BytesEnd<'static> {
        BytesEnd::new(String::from_utf8_lossy(self.start.name().as_ref()).into_owned())
    }
}

/// Text with every line break rewritten to `newline`
fn with_newline<'a>(event: &'a Event<'static>, newline: &str) -> Event<'a> {
    match event {
        Event::Text(text) if text.contains(&b'\n') => {
            let normalized = String::from_utf8_lossy(text)
                .replace("\r\n", "\n")
                .replace('\n', newline);
            Event::Text(BytesText::from_escaped(normalized))
        }
        other => other.borrow(),
    }
}

fn is_whitespace_text(node: &Node) -> bool {
    match node {
        Node::Other(Event::Text(text)) => text.iter().all(|b| b.is_ascii_whitespace()),
        _ => false,
    }
}

/// A parsed XML document
#[derive(Debug, Clone)]
pub struct XmlDocument {
    bom: bool,
    prolog: Vec<Event<'static>>,
    root: Element,
    epilog: Vec<Event<'static>>,
}

impl XmlDocument {
    /// Load and parse a document from disk
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::parse(&bytes).map_err(|message| EditorError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Parse a document from bytes, the error carries the parser diagnostic
    pub fn parse(bytes: &[u8]) -> std::result::Result<Self, String> {
        let (bom, body) = match bytes.strip_prefix(UTF8_BOM) {
            Some(rest) => (true, rest),
            None => (false, bytes),
        };

        let mut reader = Reader::from_reader(body);
        reader.config_mut().trim_text(false);
        reader.config_mut().check_end_names = true;

        let mut prolog = Vec::new();
        let mut epilog = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;
        let mut next_id: NodeId = 0;
        let mut buf = Vec::new();

        loop {
            let event = reader.read_event_into(&mut buf).map_err(|e| {
                format!("{} (at byte {})", e, reader.error_position())
            })?;

            match event {
                Event::Eof => break,
                Event::Start(start) => {
                    if root.is_some() && stack.is_empty() {
                        return Err(format!(
                            "multiple root elements (at byte {})",
                            reader.buffer_position()
                        ));
                    }
                    stack.push(Element {
                        id: next_id,
                        start: start.into_owned(),
                        children: Vec::new(),
                        self_closing: false,
                    });
                    next_id += 1;
                }
                Event::Empty(start) => {
                    let element = Element {
                        id: next_id,
                        start: start.into_owned(),
                        children: Vec::new(),
                        self_closing: true,
                    };
                    next_id += 1;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(Node::Element(element)),
                        None if root.is_none() => root = Some(element),
                        None => {
                            return Err(format!(
                                "multiple root elements (at byte {})",
                                reader.buffer_position()
                            ))
                        }
                    }
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| {
                        format!("unexpected closing tag (at byte {})", reader.buffer_position())
                    })?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(Node::Element(element)),
                        None => root = Some(element),
                    }
                }
                other => {
                    let other = other.into_owned();
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(Node::Other(other)),
                        None if root.is_none() => prolog.push(other),
                        None => epilog.push(other),
                    }
                }
            }
            buf.clear();
        }

        if let Some(open) = stack.last() {
            return Err(format!(
                "unexpected end of document, <{}> is not closed",
                open.local_name()
            ));
        }
        let root = root.ok_or_else(|| "document has no root element".to_string())?;

        Ok(Self {
            bom,
            prolog,
            root,
            epilog,
        })
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// Root followed by every descendant, in document order
    pub fn elements(&self) -> Vec<&Element> {
        let mut out = vec![&self.root];
        out.extend(self.root.descendants());
        out
    }

    /// Serialize preserving the original layout of unchanged content
    pub fn to_bytes(&self) -> std::io::Result<Vec<u8>> {
        let mut out = Vec::new();
        if self.bom {
            out.extend_from_slice(UTF8_BOM);
        }
        let mut writer = Writer::new(out);
        for event in &self.prolog {
            writer.write_event(event.borrow())?;
        }
        self.root.write_raw(&mut writer)?;
        for event in &self.epilog {
            writer.write_event(event.borrow())?;
        }
        Ok(writer.into_inner())
    }

    /// Serialize with a fresh UTF-8 declaration, two-space indentation and
    /// the given newline sequence; whitespace-only text is re-flowed
    pub fn to_indented_bytes(&self, newline: &str) -> std::io::Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        writer.get_mut().write_all(newline.as_bytes())?;
        for event in &self.prolog {
            if matches!(event, Event::Decl(_) | Event::Text(_)) {
                continue;
            }
            writer.write_event(event.borrow())?;
            writer.get_mut().write_all(newline.as_bytes())?;
        }
        self.root.write_indented(&mut writer, 0, newline)?;
        let mut out = writer.into_inner();
        // No newline after the root element
        if out.ends_with(newline.as_bytes()) {
            out.truncate(out.len() - newline.len());
        }
        Ok(out)
    }

    /// Write the raw-preserving serialization to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<DataSchemaModel FileFormatVersion="1.2" SchemaVersion="2.9">
  <Model>
    <!-- objects -->
    <Element Type="SqlTable" Name="[dbo].[Orders]">
      <Property Name="IsAnsiNullsOn" Value="True" />
    </Element>
    <Element Type="SqlView" Name="[dbo].[V&amp;1]"/>
  </Model>
</DataSchemaModel>"#;

    #[test]
    fn test_round_trip_preserves_bytes() {
        let doc = XmlDocument::parse(SAMPLE.as_bytes()).unwrap();
        let bytes = doc.to_bytes().unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), SAMPLE);
    }

    #[test]
    fn test_bom_is_preserved() {
        let mut input = UTF8_BOM.to_vec();
        input.extend_from_slice(b"<a><b/></a>");
        let doc = XmlDocument::parse(&input).unwrap();
        assert_eq!(doc.to_bytes().unwrap(), input);
    }

    #[test]
    fn test_attribute_lookup_unescapes() {
        let doc = XmlDocument::parse(SAMPLE.as_bytes()).unwrap();
        let view = doc
            .root()
            .find_descendant(&|e| e.attribute("Type").as_deref() == Some("SqlView"))
            .unwrap();
        assert_eq!(view.attribute("Name").unwrap(), "[dbo].[V&1]");
        assert_eq!(view.local_name(), "Element");
        assert!(view.attribute("Missing").is_none());
    }

    #[test]
    fn test_elements_in_document_order() {
        let doc = XmlDocument::parse(SAMPLE.as_bytes()).unwrap();
        let names: Vec<String> = doc.elements().iter().map(|e| e.local_name()).collect();
        assert_eq!(
            names,
            vec!["DataSchemaModel", "Model", "Element", "Property", "Element"]
        );
    }

    #[test]
    fn test_local_name_strips_prefix() {
        let doc = XmlDocument::parse(b"<x:Root xmlns:x=\"urn:x\"><x:Child/></x:Root>").unwrap();
        assert_eq!(doc.root().local_name(), "Root");
        assert_eq!(doc.root().descendants()[0].local_name(), "Child");
    }

    #[test]
    fn test_set_text_and_read_back() {
        let mut doc = XmlDocument::parse(b"<r><v/></r>").unwrap();
        let v = doc
            .root_mut()
            .find_descendant_mut(&|e| e.local_name() == "v")
            .unwrap();
        v.set_text("a<b");
        assert_eq!(v.text(), "a<b");
        assert_eq!(
            String::from_utf8(doc.to_bytes().unwrap()).unwrap(),
            "<r><v>a&lt;b</v></r>"
        );
    }

    #[test]
    fn test_detach_where_returns_document_order() {
        let mut doc =
            XmlDocument::parse(b"<r><a k=\"1\"><a k=\"2\"/></a><b/><a k=\"3\"/></r>").unwrap();
        let removed = doc.root_mut().detach_where(&|e| e.local_name() == "a");
        let keys: Vec<String> = removed.iter().map(|e| e.attribute("k").unwrap()).collect();
        // The nested a travels with its parent
        assert_eq!(keys, vec!["1", "3"]);
        assert_eq!(removed[0].descendants().len(), 1);
        assert_eq!(String::from_utf8(doc.to_bytes().unwrap()).unwrap(), "<r><b/></r>");
    }

    #[test]
    fn test_indented_output_uses_crlf() {
        let doc = XmlDocument::parse(b"<r>\n<a>1</a>\n   <b><c/></b></r>").unwrap();
        let out = String::from_utf8(doc.to_indented_bytes("\r\n").unwrap()).unwrap();
        assert_eq!(
            out,
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\r\n<r>\r\n  <a>1</a>\r\n  <b>\r\n    <c/>\r\n  </b>\r\n</r>"
        );
    }

    #[test]
    fn test_indented_output_rewrites_text_line_breaks() {
        let doc = XmlDocument::parse(b"<r><Note>line1\nline2\r\nline3</Note></r>").unwrap();
        let out = doc.to_indented_bytes("\r\n").unwrap();
        let text = String::from_utf8(out.clone()).unwrap();
        assert!(text.contains("<Note>line1\r\nline2\r\nline3</Note>"), "got: {:?}", text);
        assert!(!text.replace("\r\n", "").contains('\n'));

        // Stable once normalized
        let again = XmlDocument::parse(&out).unwrap().to_indented_bytes("\r\n").unwrap();
        assert_eq!(again, out);
    }

    #[test]
    fn test_malformed_input_reports_diagnostic() {
        let err = XmlDocument::parse(b"<r><a></b></r>").unwrap_err();
        assert!(!err.is_empty());

        let err = XmlDocument::parse(b"<r><a>").unwrap_err();
        assert!(err.contains("not closed"), "got: {}", err);

        let err = XmlDocument::parse(b"   ").unwrap_err();
        assert!(err.contains("no root"), "got: {}", err);
    }

    #[test]
    fn test_load_wraps_parse_error_with_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("model.xml");
        std::fs::write(&path, "<r><a></r>").unwrap();

        match XmlDocument::load(&path) {
            Err(EditorError::Parse { path: p, message }) => {
                assert_eq!(p, path);
                assert!(!message.is_empty());
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }
}
