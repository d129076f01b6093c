//! A small owned XML element tree.
//!
//! The REST-XML parser reads request bodies into this tree and walks it
//! against the input shape, and the XML serializers build one before writing
//! it out. Element names are stored without their namespace prefix; attribute
//! names keep theirs (`xsi:type`).

use std::io::{self, Write};

use quick_xml::events::{BytesDecl, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::ParseError;

/// An element with its attributes, text, and child elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    /// Local name.
    pub name: String,
    /// Attributes in document order, with prefixed names.
    pub attributes: Vec<(String, String)>,
    /// Concatenated, unescaped character data.
    pub text: String,
    /// Child elements in document order.
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// An empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// An element holding only text.
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    /// Set an attribute, replacing an earlier one of the same name.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Append a child element.
    pub fn push(&mut self, child: XmlElement) {
        self.children.push(child);
    }

    /// The first child with the given local name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with the given local name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// An attribute by full name, or by local name when the document used a
    /// different prefix.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        let local = local_part(name);
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .or_else(|| self.attributes.iter().find(|(k, _)| local_part(k) == local))
            .map(|(_, v)| v.as_str())
    }

    /// Parse a document and return its root element.
    pub fn parse(xml: &[u8]) -> Result<Self, ParseError> {
        let mut reader = Reader::from_reader(xml);
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root = None;

        loop {
            match reader.read_event().map_err(malformed)? {
                Event::Start(e) => stack.push(open_element(&e)?),
                Event::Empty(e) => {
                    let element = open_element(&e)?;
                    close_element(element, &mut stack, &mut root);
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| malformed("unbalanced end tag"))?;
                    close_element(element, &mut stack, &mut root);
                }
                Event::Text(e) => {
                    if let Some(current) = stack.last_mut() {
                        let decoded = e.decode().map_err(malformed)?;
                        let unescaped = quick_xml::escape::unescape(&decoded).map_err(malformed)?;
                        current.text.push_str(&unescaped);
                    }
                }
                Event::CData(e) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(&e));
                    }
                }
                Event::GeneralRef(e) => {
                    if let Some(current) = stack.last_mut() {
                        let name = e.decode().map_err(malformed)?;
                        let reference = format!("&{name};");
                        let resolved =
                            quick_xml::escape::unescape(&reference).map_err(malformed)?;
                        current.text.push_str(&resolved);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(malformed("unexpected end of document"));
        }
        root.ok_or_else(|| malformed("document has no root element"))
    }

    /// Write the element as a complete document with an XML declaration.
    pub fn to_document(&self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(512);
        let mut writer = Writer::new(&mut buf);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        write_element(&mut writer, self)?;
        Ok(buf)
    }
}

fn local_part(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

fn malformed(error: impl ToString) -> ParseError {
    ParseError::MalformedRequestBody(error.to_string())
}

fn open_element(start: &BytesStart<'_>) -> Result<XmlElement, ParseError> {
    let local_name = start.local_name();
    let name = std::str::from_utf8(local_name.as_ref()).map_err(malformed)?;
    let mut element = XmlElement::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(malformed)?;
        let key = std::str::from_utf8(attr.key.as_ref()).map_err(malformed)?;
        let raw = std::str::from_utf8(&attr.value).map_err(malformed)?;
        let value = quick_xml::escape::unescape(raw).map_err(malformed)?;
        element.attributes.push((key.to_owned(), value.into_owned()));
    }
    Ok(element)
}

fn close_element(element: XmlElement, stack: &mut [XmlElement], root: &mut Option<XmlElement>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn write_element<W: Write>(writer: &mut Writer<W>, element: &XmlElement) -> io::Result<()> {
    let mut start = writer.create_element(element.name.as_str());
    for (key, value) in &element.attributes {
        start = start.with_attribute((key.as_str(), value.as_str()));
    }

    if !element.children.is_empty() {
        start.write_inner_content(|w| {
            for child in &element.children {
                write_element(w, child)?;
            }
            Ok(())
        })?;
    } else if !element.text.is_empty() {
        start.write_text_content(BytesText::new(&element.text))?;
    } else {
        start.write_empty()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_nested_elements_and_strip_prefixes() {
        let doc = br#"<?xml version="1.0" encoding="UTF-8"?>
            <s3:Tagging xmlns:s3="http://s3.amazonaws.com/doc/2006-03-01/">
              <s3:TagSet><s3:Tag><s3:Key>env</s3:Key><s3:Value>a &amp; b</s3:Value></s3:Tag></s3:TagSet>
            </s3:Tagging>"#;
        let root = XmlElement::parse(doc).unwrap();
        assert_eq!(root.name, "Tagging");
        let tag = root.child("TagSet").unwrap().child("Tag").unwrap();
        assert_eq!(tag.child("Key").unwrap().text, "env");
        assert_eq!(tag.child("Value").unwrap().text, "a & b");
    }

    #[test]
    fn test_should_resolve_entity_and_character_references() {
        let doc = b"<Message><Body>&lt;a&gt; &amp; &quot;b&quot; &#65;&#x42;</Body></Message>";
        let root = XmlElement::parse(doc).unwrap();
        assert_eq!(root.child("Body").unwrap().text, "<a> & \"b\" AB");

        assert!(matches!(
            XmlElement::parse(b"<Body>&nbsp;</Body>"),
            Err(ParseError::MalformedRequestBody(_))
        ));
    }

    #[test]
    fn test_should_read_attributes_by_full_or_local_name() {
        let doc = br#"<Grantee xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:type="CanonicalUser"><ID>abc</ID></Grantee>"#;
        let root = XmlElement::parse(doc).unwrap();
        assert_eq!(root.attribute("xsi:type"), Some("CanonicalUser"));
        assert_eq!(root.attribute("type"), Some("CanonicalUser"));
        assert_eq!(root.attribute("missing"), None);
    }

    #[test]
    fn test_should_reject_malformed_documents() {
        assert!(matches!(
            XmlElement::parse(b"<A><B></A>"),
            Err(ParseError::MalformedRequestBody(_))
        ));
        assert!(matches!(
            XmlElement::parse(b"   "),
            Err(ParseError::MalformedRequestBody(_))
        ));
    }

    #[test]
    fn test_should_write_document_with_escaping() {
        let mut root = XmlElement::new("ListQueuesResponse");
        root.set_attribute("xmlns", "http://queue.amazonaws.com/doc/2012-11-05/");
        root.push(XmlElement::with_text("QueueUrl", "http://q?a=1&b=2"));
        root.push(XmlElement::new("Empty"));

        let xml = String::from_utf8(root.to_document().unwrap()).unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains("<QueueUrl>http://q?a=1&amp;b=2</QueueUrl>"));
        assert!(xml.contains("<Empty/>"));

        let back = XmlElement::parse(xml.as_bytes()).unwrap();
        assert_eq!(back.child("QueueUrl").unwrap().text, "http://q?a=1&b=2");
    }
}
