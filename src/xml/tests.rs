use super::{Element, Node};
use crate::error::XmlError;

#[test]
fn parses_nested_elements_attributes_and_text() {
    let input = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- leading comment -->
<x:Request xmlns:x="urn:test" Mode="strict">
  <Subject>
    <Attribute AttributeId="id" DataType="string"><AttributeValue>alice &amp; bob</AttributeValue></Attribute>
  </Subject>
  <Empty/>
</x:Request>"#;

    let root = Element::parse_str(input).unwrap();
    assert_eq!(root.name(), "x:Request");
    assert_eq!(root.local_name(), "Request");
    assert_eq!(root.attribute("Mode"), Some("strict"));
    assert_eq!(root.child_elements().count(), 2);

    let value = root
        .first_child("Subject")
        .and_then(|subject| subject.first_child("Attribute"))
        .and_then(|attribute| attribute.first_child("AttributeValue"))
        .unwrap();
    assert_eq!(value.text(), "alice & bob");
    assert!(root.first_child("Empty").unwrap().children().is_empty());
}

#[test]
fn cdata_becomes_text() {
    let root = Element::parse_str("<Value><![CDATA[a < b]]></Value>").unwrap();
    assert_eq!(root.text(), "a < b");
}

#[test]
fn written_document_parses_back_to_same_tree() {
    let element = Element::new("Response")
        .with_attribute("xmlns", "urn:oasis:names:tc:xacml:2.0:context:schema:os")
        .with_child(
            Element::new("Result")
                .with_attribute("ResourceId", "/layers/\"roads\"")
                .with_child(Element::new("Decision").with_text("Permit <ok>")),
        )
        .with_child(Element::new("Status"));

    let xml = element.to_xml_string().unwrap();
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    let parsed = Element::parse_str(&xml).unwrap();
    assert_eq!(parsed, element);
}

#[test]
fn set_attribute_replaces_existing_value() {
    let mut element = Element::new("Rule").with_attribute("Effect", "Permit");
    element.set_attribute("Effect", "Deny");
    let attributes: Vec<_> = element.attributes().collect();
    assert_eq!(attributes, vec![("Effect", "Deny")]);
}

#[test]
fn rejects_empty_document() {
    let err = Element::parse_str("<?xml version=\"1.0\"?>").unwrap_err();
    assert!(matches!(err, XmlError::EmptyDocument));
}

#[test]
fn rejects_unclosed_root() {
    let err = Element::parse_str("<Request><Subject></Subject>").unwrap_err();
    assert!(matches!(err, XmlError::UnbalancedTag(_)));
}

#[test]
fn rejects_mismatched_tags() {
    assert!(Element::parse_str("<Request></Response>").is_err());
}

#[test]
fn rejects_second_root_element() {
    let err = Element::parse_str("<Request/><Request/>").unwrap_err();
    assert!(matches!(err, XmlError::UnexpectedElement { .. }));
}

#[test]
fn required_attribute_reports_element_and_attribute() {
    let element = Element::new("Rule");
    let err = element.required_attribute("RuleId").unwrap_err();
    assert_eq!(err.to_string(), "missing mandatory Rule@RuleId");
}

#[test]
fn whitespace_only_text_is_dropped() {
    let root = Element::parse_str("<A>\n   <B/>\n</A>").unwrap();
    assert!(root
        .children()
        .iter()
        .all(|node| matches!(node, Node::Element(_))));
}

#[test]
fn leaf_text_keeps_surrounding_whitespace() {
    let root = Element::parse_str("<A>\n  <B>  padded  </B>\n  <C>   </C>\n</A>").unwrap();
    assert_eq!(root.first_child("B").unwrap().text(), "  padded  ");
    assert_eq!(root.first_child("C").unwrap().text(), "   ");
    assert_eq!(root.text(), "");
}

#[test]
fn escaped_text_and_cdata_join_into_one_node() {
    let root = Element::parse_str("<V> a &amp; <![CDATA[<b>]]> </V>").unwrap();
    assert_eq!(root.children(), &[Node::Text(" a & <b> ".to_string())]);
}
