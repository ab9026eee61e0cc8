use super::model::{Policy, PolicyFinder, PolicyKind};
use crate::error::FactoryError;
use crate::models::{PolicyDocument, PolicyElement, PolicySetDocument};
use crate::xml::Element;
use std::io::Read;
use std::sync::Arc;

/// Turns a serialized policy document into a [`Policy`].
///
/// The factory delegates every construction to its builder, so alternate
/// policy representations can be plugged in without touching call sites.
pub trait PolicyBuilder: Send + Sync {
    fn build(
        &self,
        source: &[u8],
        kind: PolicyKind,
        finder: Option<Arc<dyn PolicyFinder>>,
    ) -> Result<Policy, FactoryError>;
}

/// Default builder parsing XACML 2.0 `Policy`/`PolicySet` documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct XacmlPolicyBuilder;

impl PolicyBuilder for XacmlPolicyBuilder {
    fn build(
        &self,
        source: &[u8],
        kind: PolicyKind,
        finder: Option<Arc<dyn PolicyFinder>>,
    ) -> Result<Policy, FactoryError> {
        let root = Element::parse(source)?;
        let document = PolicyElement::from_element(&root)?;
        let found = match document {
            PolicyElement::Policy(_) => PolicyKind::Policy,
            PolicyElement::PolicySet(_) => PolicyKind::PolicySet,
        };
        if found != kind {
            return Err(FactoryError::KindMismatch {
                expected: kind,
                found,
            });
        }
        Ok(Policy::new(document, finder))
    }
}

#[derive(Clone)]
pub struct PolicyFactory {
    builder: Arc<dyn PolicyBuilder>,
}

impl Default for PolicyFactory {
    fn default() -> Self {
        Self {
            builder: Arc::new(XacmlPolicyBuilder),
        }
    }
}

impl PolicyFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builder(builder: impl PolicyBuilder + 'static) -> Self {
        Self {
            builder: Arc::new(builder),
        }
    }

    /// Replaces the builder used for policies created from now on.
    pub fn set_builder(&mut self, builder: impl PolicyBuilder + 'static) {
        self.builder = Arc::new(builder);
    }

    pub fn create_policy<R: Read>(&self, source: R) -> Result<Policy, FactoryError> {
        self.build_from_reader(source, PolicyKind::Policy, None)
    }

    /// Creates a policy whose references resolve through `finder` at evaluation time.
    pub fn create_policy_with_finder<R: Read>(
        &self,
        source: R,
        finder: Arc<dyn PolicyFinder>,
    ) -> Result<Policy, FactoryError> {
        self.build_from_reader(source, PolicyKind::Policy, Some(finder))
    }

    pub fn create_policy_set<R: Read>(&self, source: R) -> Result<Policy, FactoryError> {
        self.build_from_reader(source, PolicyKind::PolicySet, None)
    }

    /// Serializes the document and parses it back through the stream path,
    /// so both entry points yield the same policy for the same document.
    pub fn create_policy_from_document(
        &self,
        document: &PolicyDocument,
    ) -> Result<Policy, FactoryError> {
        let bytes = serialize(PolicyElement::Policy(document.clone()))?;
        self.builder.build(&bytes, PolicyKind::Policy, None)
    }

    pub fn create_policy_set_from_document(
        &self,
        document: &PolicySetDocument,
    ) -> Result<Policy, FactoryError> {
        let bytes = serialize(PolicyElement::PolicySet(document.clone()))?;
        self.builder.build(&bytes, PolicyKind::PolicySet, None)
    }

    fn build_from_reader<R: Read>(
        &self,
        mut source: R,
        kind: PolicyKind,
        finder: Option<Arc<dyn PolicyFinder>>,
    ) -> Result<Policy, FactoryError> {
        let mut bytes = Vec::new();
        source.read_to_end(&mut bytes)?;
        self.builder.build(&bytes, kind, finder)
    }
}

fn serialize(document: PolicyElement) -> Result<Vec<u8>, FactoryError> {
    let mut bytes = Vec::new();
    document.to_element().write_to(&mut bytes)?;
    Ok(bytes)
}
