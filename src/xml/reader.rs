use super::{Element, Node};
use crate::error::XmlError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::io::{BufReader, Read};

pub(super) fn read_document<R: Read>(input: R) -> Result<Element, XmlError> {
    let mut reader = Reader::from_reader(BufReader::new(input));

    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(start) => {
                ensure_single_root(&root, &stack, &start)?;
                stack.push(element_from_start(&start)?);
            }
            Event::Empty(start) => {
                ensure_single_root(&root, &stack, &start)?;
                let element = element_from_start(&start)?;
                attach(element, &mut stack, &mut root);
            }
            Event::End(end) => {
                let mut element = match stack.pop() {
                    Some(element) => element,
                    None => {
                        let name = std::str::from_utf8(end.name().as_ref())?.to_string();
                        return Err(XmlError::UnbalancedTag(name));
                    }
                };
                element.drop_layout_whitespace();
                attach(element, &mut stack, &mut root);
            }
            Event::Text(text) => {
                let value = text.unescape()?.into_owned();
                push_text(&mut stack, value);
            }
            Event::CData(data) => {
                let value = std::str::from_utf8(&data.into_inner())?.to_string();
                push_text(&mut stack, value);
            }
            Event::Eof => break,
            // declarations, comments, processing instructions and doctypes carry no content
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.pop() {
        return Err(XmlError::UnbalancedTag(open.name));
    }
    root.ok_or(XmlError::EmptyDocument)
}

fn ensure_single_root(
    root: &Option<Element>,
    stack: &[Element],
    start: &BytesStart<'_>,
) -> Result<(), XmlError> {
    if root.is_some() && stack.is_empty() {
        let name = std::str::from_utf8(start.name().as_ref())?.to_string();
        return Err(XmlError::unexpected("end of document", &name));
    }
    Ok(())
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element, XmlError> {
    let name = std::str::from_utf8(start.name().as_ref())?.to_string();
    let mut element = Element::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
        let value = attr.unescape_value()?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(element: Element, stack: &mut [Element], root: &mut Option<Element>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None => *root = Some(element),
    }
}

// text outside the root element is ignored
fn push_text(stack: &mut [Element], value: String) {
    let Some(parent) = stack.last_mut() else {
        return;
    };
    // the unescaped text and a following CDATA section arrive as separate events
    if let Some(Node::Text(previous)) = parent.children.last_mut() {
        previous.push_str(&value);
        return;
    }
    parent.children.push(Node::Text(value));
}
