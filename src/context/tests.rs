use super::*;
use crate::models::{
    Attribute, AttributeCategory, DataType, Effect, StatusCode, ACTION_ID, RESOURCE_ID,
};

const REQUEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Request xmlns="urn:oasis:names:tc:xacml:2.0:context:schema:os">
  <Subject>
    <Attribute AttributeId="urn:oasis:names:tc:xacml:1.0:subject:subject-id"
        DataType="http://www.w3.org/2001/XMLSchema#string">
      <AttributeValue>alice</AttributeValue>
    </Attribute>
  </Subject>
  <Resource>
    <Attribute AttributeId="urn:oasis:names:tc:xacml:1.0:resource:resource-id"
        DataType="http://www.w3.org/2001/XMLSchema#string">
      <AttributeValue>/layers/roads</AttributeValue>
    </Attribute>
  </Resource>
  <Action>
    <Attribute AttributeId="urn:oasis:names:tc:xacml:1.0:action:action-id"
        DataType="http://www.w3.org/2001/XMLSchema#string">
      <AttributeValue>read</AttributeValue>
    </Attribute>
  </Action>
  <Environment/>
</Request>"#;

const RESPONSE: &str = r#"<Response xmlns="urn:oasis:names:tc:xacml:2.0:context:schema:os">
  <Result ResourceId="/layers/roads">
    <Decision>Deny</Decision>
    <Status><StatusCode Value="urn:oasis:names:tc:xacml:1.0:status:ok"/></Status>
    <Obligations>
      <Obligation ObligationId="audit" FulfillOn="Deny">
        <AttributeAssignment AttributeId="level"
            DataType="http://www.w3.org/2001/XMLSchema#integer">3</AttributeAssignment>
      </Obligation>
    </Obligations>
  </Result>
</Response>"#;

#[test]
fn stream_and_element_reads_agree() {
    let mut from_stream = RequestContext::new();
    from_stream.read_request(REQUEST.as_bytes()).unwrap();

    let mut from_element = RequestContext::new();
    from_element
        .read_request_element(Element::parse_str(REQUEST).unwrap())
        .unwrap();

    assert_eq!(from_stream.request(), from_element.request());
    assert_eq!(from_stream.document_element(), from_element.document_element());
    let root = from_stream.document_element().unwrap();
    assert_eq!(root.local_name(), "Request");

    let request = from_stream.request().unwrap();
    assert_eq!(request.resource_id(), Some("/layers/roads"));
}

#[test]
fn set_request_drops_document() {
    let mut context = RequestContext::new();
    context.read_request(REQUEST.as_bytes()).unwrap();
    assert!(context.document_element().is_some());

    context.set_request(Request::new().with_action_id("write"));
    assert!(context.document_element().is_none());
    assert_eq!(
        context.request().unwrap().action,
        vec![Attribute::string(ACTION_ID, "write")]
    );
}

#[test]
fn failed_read_keeps_previous_state() {
    let mut context = RequestContext::new();
    context.read_request(REQUEST.as_bytes()).unwrap();
    let before = context.request().cloned();

    let err = context
        .read_request("<Request><Subject/></Request>".as_bytes())
        .unwrap_err();
    assert_eq!(err.document, "request");
    assert!(matches!(err.source, XmlError::Missing(_)));
    assert_eq!(context.request().cloned(), before);
    assert!(context.document_element().is_some());
}

#[test]
fn invalid_xml_is_malformed_request() {
    let mut context = RequestContext::new();
    let err = context.read_request("<Request><Subject>".as_bytes()).unwrap_err();
    assert_eq!(err.document, "request");
    assert!(context.request().is_none());
}

#[test]
fn marshall_round_trips_structured_request() {
    let request = Request::new()
        .with_subject_id("alice")
        .with_resource_id("/layers/roads")
        .with_resource_attribute(
            Attribute::new("layer-size", DataType::Integer, "42").with_value("43"),
        )
        .with_action_id("read")
        .with_environment_attribute(Attribute::string("zone", "eu").with_issuer("gateway"));
    let context = RequestContext::from_request(request.clone());

    let mut first = Vec::new();
    context.marshall(&mut first).unwrap();

    let mut parsed = RequestContext::new();
    parsed.read_request(first.as_slice()).unwrap();
    assert_eq!(parsed.request(), Some(&request));

    let mut second = Vec::new();
    parsed.marshall(&mut second).unwrap();
    assert_eq!(first, second);
}

#[test]
fn marshall_keeps_whitespace_of_string_values() {
    let request = Request::new()
        .with_subject_id(" alice")
        .with_resource_id("  padded  ")
        .with_resource_attribute(Attribute::string("note", "\tline one\n"))
        .with_action_id("read ");
    let mut out = Vec::new();
    RequestContext::from_request(request.clone())
        .marshall(&mut out)
        .unwrap();

    let mut parsed = RequestContext::new();
    parsed.read_request(out.as_slice()).unwrap();
    assert_eq!(parsed.request(), Some(&request));
    assert_eq!(parsed.request().unwrap().resource_id(), Some("  padded  "));
}

#[test]
fn typed_values_ignore_surrounding_whitespace() {
    let xml = r#"<Request xmlns="urn:oasis:names:tc:xacml:2.0:context:schema:os">
  <Subject/>
  <Resource>
    <Attribute AttributeId="layer-size" DataType="http://www.w3.org/2001/XMLSchema#integer">
      <AttributeValue>
        42
      </AttributeValue>
    </Attribute>
  </Resource>
  <Action/>
</Request>"#;
    let mut context = RequestContext::new();
    context.read_request(xml.as_bytes()).unwrap();
    let request = context.request().unwrap();
    let sizes: Vec<_> = request
        .attributes(AttributeCategory::Resource)
        .iter()
        .flat_map(|attribute| attribute.values.clone())
        .collect();
    assert_eq!(sizes, vec!["42".to_string()]);
}

#[test]
fn empty_context_marshalls_empty_request() {
    let mut out = Vec::new();
    RequestContext::new().marshall(&mut out).unwrap();

    let mut parsed = RequestContext::new();
    parsed.read_request(out.as_slice()).unwrap();
    let request = parsed.request().unwrap();
    assert!(request.attributes(crate::models::AttributeCategory::Action).is_empty());
    assert!(request.resource_id().is_none());
}

#[test]
fn properties_are_independent_of_request() {
    let mut context = RequestContext::from_request(Request::new());
    context.set_property("service", "wms");
    context.set_property("service", "wfs");
    assert_eq!(context.property("service"), Some("wfs"));
    assert_eq!(context.property("missing"), None);
}

#[test]
fn response_decision_matches_result() {
    let response = ResponseContext::read_response(RESPONSE.as_bytes()).unwrap();
    assert_eq!(response.decision(), Decision::Deny);
    assert_eq!(response.decision_code(), 1);
    assert_eq!(response.decision(), response.result().decision);
    assert_eq!(response.result().resource_id.as_deref(), Some("/layers/roads"));
    assert!(response.status().is_ok());
    assert_eq!(response.obligations().len(), 1);
    assert_eq!(response.obligations()[0].fulfill_on, Effect::Deny);
    assert!(response.document_element().is_some());
}

#[test]
fn response_marshall_round_trips() {
    let mut result = DecisionResult::new(
        Decision::Indeterminate,
        Status::new(StatusCode::MissingAttribute, "missing resource-id"),
    );
    result.resource_id = Some(RESOURCE_ID.to_string());
    let response = ResponseContext::new(result.clone());

    let mut out = Vec::new();
    response.marshall(&mut out).unwrap();
    let parsed = ResponseContext::read_response(out.as_slice()).unwrap();
    assert_eq!(parsed.result(), &result);
    assert_eq!(parsed.decision_code(), 2);
}

#[test]
fn response_without_result_is_malformed() {
    let err = ResponseContext::read_response(
        r#"<Response xmlns="urn:oasis:names:tc:xacml:2.0:context:schema:os"/>"#.as_bytes(),
    )
    .unwrap_err();
    assert_eq!(err.document, "response");
}
