//! Typed XML for the SMP documents.
//!
//! Every document is built as an [`XmlElement`] tree and written by one small
//! serializer. Namespaces are declared on the first element that uses them.
//! Canonicalization and signing happen on the serialized text in
//! [`crate::signing`].

pub mod service_group;
pub mod service_metadata;

pub use service_group::ServiceGroup;
pub use service_metadata::{ServiceInformation, SignedServiceMetadata};

use std::collections::BTreeMap;

use thiserror::Error;

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Namespace {
    pub prefix: Option<&'static str>,
    pub uri: &'static str,
}

pub const SMP_NS: Namespace = Namespace {
    prefix: None,
    uri: "http://busdox.org/serviceMetadata/publishing/1.0/",
};

pub const IDS_NS: Namespace = Namespace {
    prefix: Some("ids"),
    uri: "http://busdox.org/transport/identifiers/1.0/",
};

pub const WSA_NS: Namespace = Namespace {
    prefix: Some("wsa"),
    uri: "http://www.w3.org/2005/08/addressing",
};

pub const DS_NS: Namespace = Namespace {
    prefix: Some("ds"),
    uri: "http://www.w3.org/2000/09/xmldsig#",
};

/// Text or attribute content that cannot appear in an XML 1.0 document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum XmlError {
    #[error("<{element}> contains U+{code:04X}, which is not an XML 1.0 character")]
    ForbiddenCharacter { element: &'static str, code: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    namespace: Namespace,
    name: &'static str,
    attributes: Vec<(&'static str, String)>,
    children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(namespace: Namespace, name: &'static str) -> Self {
        Self {
            namespace,
            name,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Attributes are written in the order they are added.
    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attributes.push((name, value.into()));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    pub fn child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = XmlElement>) -> Self {
        self.children
            .extend(children.into_iter().map(XmlNode::Element));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// Fails on the first text or attribute value holding a character outside
    /// the XML 1.0 `Char` production.
    pub fn validate(&self) -> Result<(), XmlError> {
        for (_, value) in &self.attributes {
            check_chars(self.name, value)?;
        }
        for child in &self.children {
            match child {
                XmlNode::Element(element) => element.validate()?,
                XmlNode::Text(text) => check_chars(self.name, text)?,
            }
        }
        Ok(())
    }

    /// This element alone, without an XML declaration.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        self.write(&mut out, &BTreeMap::new());
        out
    }

    /// Full document: XML declaration followed by this element as root.
    /// Call [`XmlElement::validate`] first for content that did not originate
    /// in this crate.
    pub fn to_document_string(&self) -> String {
        let mut out = String::from(XML_DECLARATION);
        out.push('\n');
        self.write(&mut out, &BTreeMap::new());
        out
    }

    fn write(&self, out: &mut String, declared: &BTreeMap<Option<&'static str>, &'static str>) {
        out.push('<');
        out.push_str(&self.qualified_name());

        let prefix = self.namespace.prefix;
        let mut scope = None;
        if declared.get(&prefix) != Some(&self.namespace.uri) {
            match prefix {
                Some(p) => {
                    out.push_str(" xmlns:");
                    out.push_str(p);
                }
                None => out.push_str(" xmlns"),
            }
            out.push_str("=\"");
            out.push_str(&escape_attribute(self.namespace.uri));
            out.push('"');

            let mut inner = declared.clone();
            inner.insert(prefix, self.namespace.uri);
            scope = Some(inner);
        }
        let scope = scope.as_ref().unwrap_or(declared);

        for (name, value) in &self.attributes {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape_attribute(value));
            out.push('"');
        }
        out.push('>');

        for child in &self.children {
            match child {
                XmlNode::Element(element) => element.write(out, scope),
                XmlNode::Text(text) => out.push_str(&escape_text(text)),
            }
        }

        out.push_str("</");
        out.push_str(&self.qualified_name());
        out.push('>');
    }

    fn qualified_name(&self) -> String {
        match self.namespace.prefix {
            Some(prefix) => format!("{prefix}:{}", self.name),
            None => self.name.to_owned(),
        }
    }
}

/// XML 1.0 `Char`. Surrogates cannot occur in a `char`.
pub fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

fn check_chars(element: &'static str, value: &str) -> Result<(), XmlError> {
    match value.chars().find(|c| !is_xml_char(*c)) {
        Some(c) => Err(XmlError::ForbiddenCharacter {
            element,
            code: u32::from(c),
        }),
        None => Ok(()),
    }
}

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            c => out.push(c),
        }
    }
    out
}

/// Whitespace is written as character references so it survives attribute
/// value normalization.
pub fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            c => out.push(c),
        }
    }
    out
}
