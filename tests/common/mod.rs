#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use xacml_pdp::{
    Attribute, FlatPolicyLocator, PolicyDecisionPoint, PolicyFactory, Request, RequestContext,
};

pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

/// Permits reads below `/layers/`; writes need the `admin` role, which must
/// be present. Every permit carries an `audit` obligation.
pub const LAYERS_POLICY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Policy xmlns="urn:oasis:names:tc:xacml:2.0:policy:schema:os"
    PolicyId="layers"
    RuleCombiningAlgId="urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:deny-overrides">
  <Description>Map layer access</Description>
  <Target>
    <Resources>
      <Resource>
        <ResourceMatch MatchId="urn:oasis:names:tc:xacml:1.0:function:string-regexp-match">
          <AttributeValue DataType="http://www.w3.org/2001/XMLSchema#string">^/layers/</AttributeValue>
          <ResourceAttributeDesignator
              AttributeId="urn:oasis:names:tc:xacml:1.0:resource:resource-id"
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
            <ActionAttributeDesignator
                AttributeId="urn:oasis:names:tc:xacml:1.0:action:action-id"
                DataType="http://www.w3.org/2001/XMLSchema#string"/>
          </ActionMatch>
        </Action>
      </Actions>
    </Target>
  </Rule>
  <Rule RuleId="admin-write" Effect="Permit">
    <Target>
      <Actions>
        <Action>
          <ActionMatch MatchId="urn:oasis:names:tc:xacml:1.0:function:string-equal">
            <AttributeValue DataType="http://www.w3.org/2001/XMLSchema#string">write</AttributeValue>
            <ActionAttributeDesignator
                AttributeId="urn:oasis:names:tc:xacml:1.0:action:action-id"
                DataType="http://www.w3.org/2001/XMLSchema#string"/>
          </ActionMatch>
        </Action>
      </Actions>
    </Target>
    <Condition>
      <Apply FunctionId="urn:oasis:names:tc:xacml:1.0:function:string-is-in">
        <AttributeValue DataType="http://www.w3.org/2001/XMLSchema#string">admin</AttributeValue>
        <SubjectAttributeDesignator AttributeId="role"
            DataType="http://www.w3.org/2001/XMLSchema#string" MustBePresent="true"/>
      </Apply>
    </Condition>
  </Rule>
  <Obligations>
    <Obligation ObligationId="audit" FulfillOn="Permit">
      <AttributeAssignment AttributeId="channel"
          DataType="http://www.w3.org/2001/XMLSchema#string">layers</AttributeAssignment>
    </Obligation>
  </Obligations>
</Policy>"#;

/// Denies everything under `/archive/`; other resources are left alone.
pub const SITE_POLICY_SET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<PolicySet xmlns="urn:oasis:names:tc:xacml:2.0:policy:schema:os"
    PolicySetId="site"
    PolicyCombiningAlgId="urn:oasis:names:tc:xacml:1.0:policy-combining-algorithm:first-applicable">
  <Target/>
  <Policy PolicyId="archive"
      RuleCombiningAlgId="urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:first-applicable">
    <Target>
      <Resources>
        <Resource>
          <ResourceMatch MatchId="urn:oasis:names:tc:xacml:1.0:function:string-regexp-match">
            <AttributeValue DataType="http://www.w3.org/2001/XMLSchema#string">^/archive/</AttributeValue>
            <ResourceAttributeDesignator
                AttributeId="urn:oasis:names:tc:xacml:1.0:resource:resource-id"
                DataType="http://www.w3.org/2001/XMLSchema#string"/>
          </ResourceMatch>
        </Resource>
      </Resources>
    </Target>
    <Rule RuleId="closed" Effect="Deny"/>
  </Policy>
</PolicySet>"#;

pub fn request(subject: &str, resource: &str, action: &str) -> Request {
    Request::new()
        .with_subject_id(subject)
        .with_resource_id(resource)
        .with_action_id(action)
}

pub fn request_with_role(resource: &str, action: &str, role: &str) -> Request {
    request("alice", resource, action).with_subject_attribute(Attribute::string("role", role))
}

pub fn context(request: Request) -> RequestContext {
    RequestContext::from_request(request)
}

pub fn layers_pdp() -> PolicyDecisionPoint {
    let policy = PolicyFactory::new()
        .create_policy(LAYERS_POLICY.as_bytes())
        .expect("layers policy");
    let mut pdp = PolicyDecisionPoint::new();
    pdp.set_policies(vec![Arc::new(policy)]);
    pdp.add_locator(FlatPolicyLocator::new());
    pdp
}

/// A scratch directory removed on drop.
pub struct TempDir {
    path: PathBuf,
}

impl TempDir {
    pub fn new(label: &str) -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let path = std::env::temp_dir().join(format!(
            "xacml-pdp-{label}-{}-{}",
            process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        fs::create_dir_all(&path).expect("create temp dir");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path.join(name);
        fs::write(&path, contents).expect("write fixture");
        path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}
