use crate::error::XmlError;
use crate::models::{PolicyElement, PolicySetMember, Target};
use crate::xml::Element;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PolicyKind {
    Policy,
    PolicySet,
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyKind::Policy => f.write_str("Policy"),
            PolicyKind::PolicySet => f.write_str("PolicySet"),
        }
    }
}

/// A `PolicyIdReference` or `PolicySetIdReference`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PolicyReference {
    pub id: String,
    pub kind: PolicyKind,
}

impl PolicyReference {
    pub fn policy(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: PolicyKind::Policy,
        }
    }

    pub fn policy_set(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: PolicyKind::PolicySet,
        }
    }
}

/// Resolves policy references at evaluation time.
pub trait PolicyFinder: Send + Sync {
    fn find(&self, reference: &PolicyReference) -> Option<Arc<Policy>>;
}

/// Member of a policy set in document order.
pub(crate) enum SetMember<'a> {
    Child(&'a Arc<Policy>),
    Reference(PolicyReference),
}

/// In-memory Policy or PolicySet. A policy set owns its inline children;
/// references are kept unresolved until evaluation.
pub struct Policy {
    kind: PolicyKind,
    document: PolicyElement,
    children: Vec<Arc<Policy>>,
    finder: Option<Arc<dyn PolicyFinder>>,
}

impl Policy {
    pub fn new(document: PolicyElement, finder: Option<Arc<dyn PolicyFinder>>) -> Self {
        let (kind, children) = match &document {
            PolicyElement::Policy(_) => (PolicyKind::Policy, Vec::new()),
            PolicyElement::PolicySet(set) => {
                let children = set
                    .members
                    .iter()
                    .filter_map(|member| match member {
                        PolicySetMember::Policy(policy) => {
                            Some(PolicyElement::Policy(policy.clone()))
                        }
                        PolicySetMember::PolicySet(set) => {
                            Some(PolicyElement::PolicySet(set.clone()))
                        }
                        PolicySetMember::PolicyIdReference(_)
                        | PolicySetMember::PolicySetIdReference(_) => None,
                    })
                    .map(|child| Arc::new(Policy::new(child, None)))
                    .collect();
                (PolicyKind::PolicySet, children)
            }
        };
        Self {
            kind,
            document,
            children,
            finder,
        }
    }

    pub fn kind(&self) -> PolicyKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        self.document.id()
    }

    pub fn document(&self) -> &PolicyElement {
        &self.document
    }

    pub fn target(&self) -> &Target {
        self.document.target()
    }

    /// Inline child policies and policy sets; always empty for a Policy.
    pub fn children(&self) -> &[Arc<Policy>] {
        &self.children
    }

    /// Finder bound at construction for resolving references.
    pub fn finder(&self) -> Option<&Arc<dyn PolicyFinder>> {
        self.finder.as_ref()
    }

    pub fn matches_reference(&self, reference: &PolicyReference) -> bool {
        self.kind == reference.kind && self.id() == reference.id
    }

    pub fn to_element(&self) -> Element {
        self.document.to_element()
    }

    /// Canonical serialized form of the policy document.
    pub fn to_xml_bytes(&self) -> Result<Vec<u8>, XmlError> {
        let mut out = Vec::new();
        self.to_element().write_to(&mut out)?;
        Ok(out)
    }

    pub(crate) fn members(&self) -> Vec<SetMember<'_>> {
        let PolicyElement::PolicySet(set) = &self.document else {
            return Vec::new();
        };
        let mut children = self.children.iter();
        let mut members = Vec::with_capacity(set.members.len());
        for member in &set.members {
            match member {
                PolicySetMember::Policy(_) | PolicySetMember::PolicySet(_) => {
                    if let Some(child) = children.next() {
                        members.push(SetMember::Child(child));
                    }
                }
                PolicySetMember::PolicyIdReference(id) => {
                    members.push(SetMember::Reference(PolicyReference::policy(id.as_str())))
                }
                PolicySetMember::PolicySetIdReference(id) => {
                    members.push(SetMember::Reference(PolicyReference::policy_set(id.as_str())))
                }
            }
        }
        members
    }

    /// Depth-first search of this policy and its inline descendants.
    pub(crate) fn find_descendant(self: &Arc<Self>, reference: &PolicyReference) -> Option<Arc<Policy>> {
        if self.matches_reference(reference) {
            return Some(Arc::clone(self));
        }
        self.children
            .iter()
            .find_map(|child| child.find_descendant(reference))
    }
}

impl fmt::Debug for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Policy")
            .field("kind", &self.kind)
            .field("id", &self.id())
            .field("children", &self.children)
            .field("finder", &self.finder.is_some())
            .finish()
    }
}
