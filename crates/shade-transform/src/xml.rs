//! Owned XML tree used by the XML-appending transformer.
//!
//! Documents are parsed with `roxmltree` after removing any `DOCTYPE`
//! declaration, so no DTD is loaded and no custom entity is expanded.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct XmlElement {
    pub prefix: Option<String>,
    pub name: String,
    pub namespace: Option<String>,
    /// Namespace declarations introduced on this element (`None` is the default namespace).
    pub declarations: Vec<(Option<String>, String)>,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct XmlAttribute {
    pub prefix: Option<String>,
    pub name: String,
    pub namespace: Option<String>,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum XmlNode {
    Element(XmlElement),
    Text(String),
    Comment(String),
}

pub(crate) fn parse(text: &str) -> Result<XmlElement, String> {
    let text = strip_doctype(text);
    let options = roxmltree::ParsingOptions {
        allow_dtd: false,
        ..roxmltree::ParsingOptions::default()
    };
    let doc = roxmltree::Document::parse_with_options(&text, options).map_err(|e| e.to_string())?;
    Ok(convert(doc.root_element(), None))
}

fn convert(node: roxmltree::Node<'_, '_>, parent: Option<roxmltree::Node<'_, '_>>) -> XmlElement {
    let in_parent = |prefix: Option<&str>, uri: &str| {
        parent.is_some_and(|p| p.namespaces().any(|ns| ns.name() == prefix && ns.uri() == uri))
    };
    let declarations = node
        .namespaces()
        .filter(|ns| ns.uri() != XML_NS && !in_parent(ns.name(), ns.uri()))
        .map(|ns| (ns.name().map(str::to_string), ns.uri().to_string()))
        .collect();

    let tag = node.tag_name();
    let attributes = node
        .attributes()
        .map(|attr| XmlAttribute {
            prefix: attr.namespace().and_then(|uri| attribute_prefix(node, uri)),
            name: attr.name().to_string(),
            namespace: attr.namespace().map(str::to_string),
            value: attr.value().to_string(),
        })
        .collect();

    let children = node
        .children()
        .filter_map(|child| {
            if child.is_element() {
                Some(XmlNode::Element(convert(child, Some(node))))
            } else if child.is_text() {
                child.text().map(|t| XmlNode::Text(t.to_string()))
            } else if child.is_comment() {
                child.text().map(|t| XmlNode::Comment(t.to_string()))
            } else {
                None
            }
        })
        .collect();

    XmlElement {
        prefix: tag.namespace().and_then(|uri| node.lookup_prefix(uri)).map(str::to_string),
        name: tag.name().to_string(),
        namespace: tag.namespace().map(str::to_string),
        declarations,
        attributes,
        children,
    }
}

fn attribute_prefix(node: roxmltree::Node<'_, '_>, uri: &str) -> Option<String> {
    if uri == XML_NS {
        return Some("xml".to_string());
    }
    // Unprefixed attributes never take the default namespace.
    node.namespaces()
        .find(|ns| ns.uri() == uri && ns.name().is_some())
        .and_then(|ns| ns.name())
        .map(str::to_string)
}

/// Removes a `<!DOCTYPE ...>` declaration, including an internal subset.
fn strip_doctype(text: &str) -> std::borrow::Cow<'_, str> {
    let Some(start) = text.find("<!DOCTYPE") else {
        return text.into();
    };
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (offset, c) in text[start..].char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, '>') if depth == 0 => {
                let end = start + offset + 1;
                return format!("{}{}", &text[..start], &text[end..]).into();
            }
            _ => {}
        }
    }
    text.into()
}

impl XmlElement {
    /// An element without namespace, attributes or children.
    pub(crate) fn new(name: &str) -> Self {
        Self {
            prefix: None,
            name: name.to_string(),
            namespace: None,
            declarations: Vec::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub(crate) fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(element) => Some(element),
            _ => None,
        })
    }

    pub(crate) fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|element| element.name == name)
    }

    pub(crate) fn child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.children.iter_mut().find_map(|child| match child {
            XmlNode::Element(element) if element.name == name => Some(element),
            _ => None,
        })
    }

    pub(crate) fn push_element(&mut self, element: XmlElement) {
        self.children.push(XmlNode::Element(element));
    }

    /// Trimmed concatenation of the direct text children.
    pub(crate) fn text(&self) -> String {
        let text: String = self
            .children
            .iter()
            .filter_map(|child| match child {
                XmlNode::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect();
        text.trim().to_string()
    }

    /// Replaces all children with one text node.
    pub(crate) fn set_text(&mut self, text: impl Into<String>) {
        self.children = vec![XmlNode::Text(text.into())];
    }

    fn find_attribute(&self, namespace: Option<&str>, name: &str) -> Option<&XmlAttribute> {
        self.attributes
            .iter()
            .find(|a| a.name == name && a.namespace.as_deref() == namespace)
    }

    /// Adds attributes missing on `self`, then appends all of `other`'s children.
    pub(crate) fn merge_root(&mut self, other: XmlElement) {
        for decl in other.declarations {
            if !self.declarations.iter().any(|(prefix, _)| *prefix == decl.0) {
                self.declarations.push(decl);
            }
        }
        for attr in other.attributes {
            if self
                .find_attribute(attr.namespace.as_deref(), &attr.name)
                .is_none()
            {
                self.attributes.push(attr);
            }
        }
        self.children.extend(other.children);
    }

    /// Pretty-printed document with a UTF-8 XML declaration.
    pub(crate) fn to_document_bytes(&self) -> Result<Vec<u8>, String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|e| e.to_string())?;
        self.write(&mut writer)?;
        let mut out = writer.into_inner();
        out.push(b'\n');
        Ok(out)
    }

    #[cfg(test)]
    pub(crate) fn to_document_string(&self) -> Result<String, String> {
        String::from_utf8(self.to_document_bytes()?).map_err(|e| e.to_string())
    }

    fn qualified(prefix: &Option<String>, name: &str) -> String {
        match prefix {
            Some(prefix) => format!("{prefix}:{name}"),
            None => name.to_string(),
        }
    }

    fn write(&self, writer: &mut Writer<Vec<u8>>) -> Result<(), String> {
        let name = Self::qualified(&self.prefix, &self.name);
        let mut start = BytesStart::new(name.as_str());
        for (prefix, uri) in &self.declarations {
            let key = match prefix {
                Some(prefix) => format!("xmlns:{prefix}"),
                None => "xmlns".to_string(),
            };
            start.push_attribute((key.as_str(), uri.as_str()));
        }
        for attr in &self.attributes {
            let key = Self::qualified(&attr.prefix, &attr.name);
            start.push_attribute((key.as_str(), attr.value.as_str()));
        }

        let children: Vec<&XmlNode> = self
            .children
            .iter()
            .filter(|child| !matches!(child, XmlNode::Text(t) if t.trim().is_empty()))
            .collect();

        if children.is_empty() {
            return writer.write_event(Event::Empty(start)).map_err(|e| e.to_string());
        }
        writer.write_event(Event::Start(start)).map_err(|e| e.to_string())?;
        for child in children {
            match child {
                XmlNode::Element(element) => element.write(writer)?,
                XmlNode::Text(text) => writer
                    .write_event(Event::Text(BytesText::new(text.trim())))
                    .map_err(|e| e.to_string())?,
                XmlNode::Comment(comment) => writer
                    .write_event(Event::Comment(BytesText::from_escaped(comment.as_str())))
                    .map_err(|e| e.to_string())?,
            }
        }
        writer
            .write_event(Event::End(BytesEnd::new(name.as_str())))
            .map_err(|e| e.to_string())
    }
}
