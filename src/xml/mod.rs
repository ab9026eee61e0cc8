//! Owned XML element tree used as the parsed form of policy, request and
//! response documents.

mod reader;
mod writer;

#[cfg(test)]
mod tests;

use crate::error::XmlError;
use std::io::{Read, Write};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Parses a complete document and returns its root element.
    pub fn parse<R: Read>(input: R) -> Result<Self, XmlError> {
        reader::read_document(input)
    }

    pub fn parse_str(input: &str) -> Result<Self, XmlError> {
        reader::read_document(input.as_bytes())
    }

    /// Writes this element as a standalone document, XML declaration included.
    pub fn write_to<W: Write>(&self, output: W) -> Result<(), XmlError> {
        writer::write_document(self, output)
    }

    pub fn to_xml_string(&self) -> Result<String, XmlError> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Element name with any namespace prefix removed.
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_optional_attribute(self, name: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.with_attribute(name, value),
            None => self,
        }
    }

    /// Sets an attribute, replacing an existing one with the same name.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Looks up an attribute by its local name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name || local_part(key) == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.push_child(child);
        self
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    pub fn children_named<'a, 'b>(
        &'a self,
        local: &'b str,
    ) -> impl Iterator<Item = &'a Element> + 'b
    where
        'a: 'b,
    {
        self.child_elements()
            .filter(move |element| element.local_name() == local)
    }

    pub fn first_child(&self, local: &str) -> Option<&Element> {
        self.child_elements()
            .find(|element| element.local_name() == local)
    }

    /// Concatenated direct text content, exactly as read.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            if let Node::Text(text) = node {
                out.push_str(text);
            }
        }
        out
    }

    /// Drops whitespace-only text next to child elements; leaf text is kept.
    fn drop_layout_whitespace(&mut self) {
        let has_elements = self
            .children
            .iter()
            .any(|node| matches!(node, Node::Element(_)));
        if has_elements {
            self.children.retain(|node| match node {
                Node::Text(text) => !text.trim().is_empty(),
                Node::Element(_) => true,
            });
        }
    }

    pub(crate) fn required_attribute(&self, name: &str) -> Result<&str, XmlError> {
        self.attribute(name)
            .ok_or_else(|| XmlError::missing_attribute(self.local_name(), name))
    }

    pub(crate) fn expect_name(&self, local: &str) -> Result<(), XmlError> {
        if self.local_name() == local {
            Ok(())
        } else {
            Err(XmlError::unexpected(local, self.local_name()))
        }
    }
}

fn local_part(name: &str) -> &str {
    match name.rfind(':') {
        Some(index) => &name[index + 1..],
        None => name,
    }
}
