use super::*;
use crate::error::XmlError;
use crate::xml::Element;

const LAYER_POLICY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Policy xmlns="urn:oasis:names:tc:xacml:2.0:policy:schema:os"
        PolicyId="layer-read" Version="1.0"
        RuleCombiningAlgId="urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:deny-overrides">
  <Description>Read access to published layers</Description>
  <Target>
    <Resources>
      <Resource>
        <ResourceMatch MatchId="urn:oasis:names:tc:xacml:1.0:function:string-regexp-match">
          <AttributeValue DataType="http://www.w3.org/2001/XMLSchema#string">^/layers/.*</AttributeValue>
          <ResourceAttributeDesignator AttributeId="urn:oasis:names:tc:xacml:1.0:resource:resource-id"
              DataType="http://www.w3.org/2001/XMLSchema#string"/>
        </ResourceMatch>
      </Resource>
    </Resources>
  </Target>
  <Rule RuleId="read" Effect="Permit">
    <Target>
      <Actions>
        <Action>
          <ActionMatch MatchId="urn:oasis:names:tc:xacml:1.0:function:string-equal">
            <AttributeValue DataType="http://www.w3.org/2001/XMLSchema#string">read</AttributeValue>
            <ActionAttributeDesignator AttributeId="urn:oasis:names:tc:xacml:1.0:action:action-id"
                DataType="http://www.w3.org/2001/XMLSchema#string" MustBePresent="true"/>
          </ActionMatch>
        </Action>
      </Actions>
    </Target>
  </Rule>
  <Obligations>
    <Obligation ObligationId="audit" FulfillOn="Permit">
      <AttributeAssignment AttributeId="level" DataType="http://www.w3.org/2001/XMLSchema#integer">2</AttributeAssignment>
    </Obligation>
  </Obligations>
</Policy>"#;

#[test]
fn parses_policy_document() {
    let root = Element::parse_str(LAYER_POLICY).unwrap();
    let policy = PolicyDocument::from_element(&root).unwrap();

    assert_eq!(policy.policy_id, "layer-read");
    assert_eq!(policy.version.as_deref(), Some("1.0"));
    assert_eq!(policy.description.as_deref(), Some("Read access to published layers"));
    assert_eq!(policy.target.resources.len(), 1);
    assert!(policy.target.subjects.is_empty());

    let resource_match = &policy.target.resources[0].matches[0];
    assert_eq!(resource_match.value, AttributeValue::string("^/layers/.*"));
    match &resource_match.source {
        AttributeSource::Designator(designator) => {
            assert_eq!(designator.category, AttributeCategory::Resource);
            assert_eq!(designator.attribute_id, RESOURCE_ID);
            assert!(!designator.must_be_present);
        }
        other => panic!("unexpected source {other:?}"),
    }

    let rule = &policy.rules[0];
    assert_eq!(rule.effect, Effect::Permit);
    assert!(rule.condition.is_none());
    match &rule.target.actions[0].matches[0].source {
        AttributeSource::Designator(designator) => assert!(designator.must_be_present),
        other => panic!("unexpected source {other:?}"),
    }

    assert_eq!(policy.obligations.len(), 1);
    assert_eq!(policy.obligations[0].fulfill_on, Effect::Permit);
    assert_eq!(
        policy.obligations[0].assignments[0].value,
        AttributeValue::integer(2)
    );
}

#[test]
fn policy_document_survives_element_conversion() {
    let root = Element::parse_str(LAYER_POLICY).unwrap();
    let policy = PolicyElement::from_element(&root).unwrap();
    let xml = policy.to_element().to_xml_string().unwrap();
    let reparsed = PolicyElement::from_element(&Element::parse_str(&xml).unwrap()).unwrap();
    assert_eq!(reparsed, policy);
}

#[test]
fn legacy_condition_with_function_id_becomes_apply() {
    let xml = r#"<Rule RuleId="r" Effect="Deny">
      <Condition FunctionId="urn:oasis:names:tc:xacml:1.0:function:string-equal">
        <Apply FunctionId="urn:oasis:names:tc:xacml:1.0:function:string-one-and-only">
          <SubjectAttributeDesignator AttributeId="role" DataType="http://www.w3.org/2001/XMLSchema#string"/>
        </Apply>
        <AttributeValue DataType="http://www.w3.org/2001/XMLSchema#string">guest</AttributeValue>
      </Condition>
    </Rule>"#;
    let set_xml = format!(
        r#"<Policy PolicyId="p" RuleCombiningAlgId="x"><Target/>{xml}</Policy>"#
    );
    let policy = PolicyDocument::from_element(&Element::parse_str(&set_xml).unwrap()).unwrap();
    match policy.rules[0].condition.as_ref().unwrap() {
        Expression::Apply {
            function_id,
            arguments,
        } => {
            assert!(function_id.ends_with("string-equal"));
            assert_eq!(arguments.len(), 2);
            assert!(matches!(arguments[1], Expression::Value(_)));
        }
        other => panic!("unexpected condition {other:?}"),
    }
}

#[test]
fn any_subject_clears_section() {
    let xml = r#"<Target><Subjects><AnySubject/></Subjects></Target>"#;
    let target = Target::from_element(&Element::parse_str(xml).unwrap()).unwrap();
    assert!(target.is_empty());
}

#[test]
fn policy_set_keeps_member_order() {
    let xml = r#"<PolicySet PolicySetId="root"
        PolicyCombiningAlgId="urn:oasis:names:tc:xacml:1.0:policy-combining-algorithm:first-applicable">
      <Target/>
      <PolicyIdReference>shared</PolicyIdReference>
      <Policy PolicyId="inline" RuleCombiningAlgId="x"><Target/></Policy>
      <PolicySet PolicySetId="nested" PolicyCombiningAlgId="y"><Target/></PolicySet>
      <PolicySetIdReference>other</PolicySetIdReference>
    </PolicySet>"#;
    let set = PolicySetDocument::from_element(&Element::parse_str(xml).unwrap()).unwrap();
    assert_eq!(set.members.len(), 4);
    assert_eq!(set.members[0], PolicySetMember::PolicyIdReference("shared".into()));
    assert!(matches!(&set.members[1], PolicySetMember::Policy(p) if p.policy_id == "inline"));
    assert!(matches!(&set.members[2], PolicySetMember::PolicySet(s) if s.policy_set_id == "nested"));
    assert_eq!(set.members[3], PolicySetMember::PolicySetIdReference("other".into()));
}

#[test]
fn policy_without_id_is_rejected() {
    let err = PolicyDocument::from_element(
        &Element::parse_str(r#"<Policy RuleCombiningAlgId="x"/>"#).unwrap(),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "missing mandatory Policy@PolicyId");
}

#[test]
fn invalid_rule_effect_is_rejected() {
    let xml = r#"<Policy PolicyId="p" RuleCombiningAlgId="x"><Rule RuleId="r" Effect="Maybe"/></Policy>"#;
    let err = PolicyDocument::from_element(&Element::parse_str(xml).unwrap()).unwrap_err();
    assert!(matches!(err, XmlError::InvalidValue { .. }));
}

#[test]
fn unknown_root_is_rejected() {
    let err = PolicyElement::from_element(&Element::parse_str("<Rule/>").unwrap()).unwrap_err();
    assert!(matches!(err, XmlError::UnexpectedElement { .. }));
}

#[test]
fn parses_request_groups() {
    let xml = r#"<Request xmlns="urn:oasis:names:tc:xacml:2.0:context:schema:os">
      <Subject>
        <Attribute AttributeId="urn:oasis:names:tc:xacml:1.0:subject:subject-id"
            DataType="http://www.w3.org/2001/XMLSchema#string" Issuer="shiro">
          <AttributeValue>alice</AttributeValue>
        </Attribute>
        <Attribute AttributeId="group" DataType="http://www.w3.org/2001/XMLSchema#string">
          <AttributeValue>admin</AttributeValue>
          <AttributeValue>editor</AttributeValue>
        </Attribute>
      </Subject>
      <Subject SubjectCategory="urn:oasis:names:tc:xacml:1.0:subject-category:codebase"/>
      <Resource>
        <Attribute AttributeId="urn:oasis:names:tc:xacml:1.0:resource:resource-id"
            DataType="http://www.w3.org/2001/XMLSchema#string">
          <AttributeValue>/layers/roads</AttributeValue>
        </Attribute>
      </Resource>
      <Action/>
      <Environment/>
    </Request>"#;
    let request = Request::from_element(&Element::parse_str(xml).unwrap()).unwrap();

    assert_eq!(request.subjects.len(), 2);
    assert_eq!(request.subjects[0].category, ACCESS_SUBJECT);
    assert_eq!(request.subjects[0].attributes[0].issuer.as_deref(), Some("shiro"));
    assert_eq!(request.subjects[0].attributes[1].values, vec!["admin", "editor"]);
    assert!(request.subjects[1].category.ends_with("codebase"));
    assert_eq!(request.resource_id(), Some("/layers/roads"));
    assert!(request.action.is_empty());
    assert_eq!(request.attributes(AttributeCategory::Subject).len(), 2);
}

#[test]
fn request_without_action_is_rejected() {
    let xml = r#"<Request><Subject/><Resource/></Request>"#;
    let err = Request::from_element(&Element::parse_str(xml).unwrap()).unwrap_err();
    assert_eq!(err.to_string(), "missing mandatory Action");
}

#[test]
fn empty_request_serializes_mandatory_groups() {
    let element = Request::new().to_element();
    let names: Vec<_> = element.child_elements().map(Element::local_name).collect();
    assert_eq!(names, vec!["Subject", "Resource", "Action", "Environment"]);
    assert!(Request::from_element(&element).is_ok());
}

#[test]
fn parses_response_result() {
    let xml = r#"<Response>
      <Result ResourceId="/layers/roads">
        <Decision>Indeterminate</Decision>
        <Status>
          <StatusCode Value="urn:oasis:names:tc:xacml:1.0:status:missing-attribute"/>
          <StatusMessage>subject-id required</StatusMessage>
        </Status>
      </Result>
    </Response>"#;
    let response = Response::from_element(&Element::parse_str(xml).unwrap()).unwrap();
    let result = &response.results[0];
    assert_eq!(result.decision, Decision::Indeterminate);
    assert_eq!(result.status.code, StatusCode::MissingAttribute);
    assert_eq!(result.status.message.as_deref(), Some("subject-id required"));
    assert_eq!(result.resource_id.as_deref(), Some("/layers/roads"));
}

#[test]
fn response_with_unknown_decision_is_rejected() {
    let xml = r#"<Response><Result><Decision>Maybe</Decision></Result></Response>"#;
    assert!(Response::from_element(&Element::parse_str(xml).unwrap()).is_err());
}

#[test]
fn decision_codes_follow_result_constants() {
    for decision in [
        Decision::Permit,
        Decision::Deny,
        Decision::Indeterminate,
        Decision::NotApplicable,
    ] {
        assert_eq!(Decision::from_code(decision.code()), Some(decision));
    }
    assert_eq!(Decision::NotApplicable.code(), 3);
    assert_eq!(Decision::from_code(7), None);
}

#[test]
fn data_types_map_to_schema_uris() {
    assert_eq!(
        DataType::from_uri("http://www.w3.org/2001/XMLSchema#anyURI"),
        DataType::AnyUri
    );
    assert_eq!(DataType::Boolean.uri(), "http://www.w3.org/2001/XMLSchema#boolean");
    let custom = DataType::from_uri("urn:oasis:names:tc:xacml:1.0:data-type:x500Name");
    assert_eq!(
        custom,
        DataType::Other("urn:oasis:names:tc:xacml:1.0:data-type:x500Name".into())
    );
    assert_eq!(DataType::from_short_name("dateTime"), Some(DataType::DateTime));
}

#[test]
fn request_renders_as_json() {
    let request = Request::new()
        .with_subject_id("alice")
        .with_resource_id("/layers/roads")
        .with_action_id("read");
    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(
        json["subjects"][0]["attributes"][0]["dataType"],
        "http://www.w3.org/2001/XMLSchema#string"
    );
    let back: Request = serde_json::from_value(json).unwrap();
    assert_eq!(back, request);
}
