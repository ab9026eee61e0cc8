mod flat;
mod recursive;

pub use flat::FlatPolicyLocator;
pub use recursive::{flatten_descendants, RecursivePolicyLocator};

use super::model::{Policy, PolicyFinder, PolicyReference};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Named engine-specific locator setting, such as a lookup directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorOption {
    pub name: String,
    pub value: String,
}

impl LocatorOption {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A top-level policy together with the policies its references may resolve to.
#[derive(Clone)]
pub struct FinderModule {
    root: Arc<Policy>,
    policies: Vec<Arc<Policy>>,
}

impl FinderModule {
    pub fn new(root: Arc<Policy>, policies: Vec<Arc<Policy>>) -> Self {
        Self { root, policies }
    }

    /// The policy evaluated when this module applies to a request.
    pub fn root(&self) -> &Arc<Policy> {
        &self.root
    }

    pub fn policies(&self) -> &[Arc<Policy>] {
        &self.policies
    }

    pub fn policy_ids(&self) -> Vec<&str> {
        self.policies.iter().map(|policy| policy.id()).collect()
    }
}

impl PolicyFinder for FinderModule {
    fn find(&self, reference: &PolicyReference) -> Option<Arc<Policy>> {
        self.policies
            .iter()
            .chain(std::iter::once(&self.root))
            .find(|policy| policy.matches_reference(reference))
            .cloned()
    }
}

impl fmt::Debug for FinderModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinderModule")
            .field("root", &self.root.id())
            .field("policies", &self.policy_ids())
            .finish()
    }
}

/// Decides which policies are candidates for evaluation.
///
/// `set_policies` is the only way to seed a locator; every call discards the
/// previous finder modules and rebuilds them from the given policies, in
/// their iteration order.
pub trait PolicyLocator: Send + Sync {
    fn set_policies(&mut self, policies: &[Arc<Policy>]);

    fn set_options(&mut self, options: Vec<LocatorOption>);

    fn options(&self) -> &[LocatorOption];

    fn policies(&self) -> &[Arc<Policy>];

    fn finder_modules(&self) -> &[FinderModule];

    fn option(&self, name: &str) -> Option<&str> {
        self.options()
            .iter()
            .find(|option| option.name == name)
            .map(|option| option.value.as_str())
    }
}

/// Shared bookkeeping of the bundled locators.
#[derive(Debug, Default, Clone)]
struct LocatorState {
    options: Vec<LocatorOption>,
    policies: Vec<Arc<Policy>>,
    modules: Vec<FinderModule>,
}

impl LocatorState {
    fn replace(&mut self, policies: &[Arc<Policy>], modules: Vec<FinderModule>) {
        self.policies = policies.to_vec();
        self.modules = modules;
    }
}
