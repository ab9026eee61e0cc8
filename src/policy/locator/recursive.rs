use super::{FinderModule, LocatorOption, LocatorState, PolicyLocator};
use crate::policy::model::{Policy, PolicyKind};
use log::debug;
use std::sync::Arc;

/// Registers one finder module per top-level policy set, holding every
/// policy found below it at any depth.
#[derive(Debug, Default, Clone)]
pub struct RecursivePolicyLocator {
    state: LocatorState,
}

impl RecursivePolicyLocator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PolicyLocator for RecursivePolicyLocator {
    fn set_policies(&mut self, policies: &[Arc<Policy>]) {
        let mut modules = Vec::new();
        for policy in policies {
            match policy.kind() {
                PolicyKind::PolicySet => {
                    modules.push(FinderModule::new(Arc::clone(policy), flatten_descendants(policy)));
                }
                PolicyKind::Policy => {
                    debug!(
                        "recursive locator skips policy {}: only policy sets are indexed",
                        policy.id()
                    );
                }
            }
        }
        self.state.replace(policies, modules);
    }

    fn set_options(&mut self, options: Vec<LocatorOption>) {
        self.state.options = options;
    }

    fn options(&self) -> &[LocatorOption] {
        &self.state.options
    }

    fn policies(&self) -> &[Arc<Policy>] {
        &self.state.policies
    }

    fn finder_modules(&self) -> &[FinderModule] {
        &self.state.modules
    }
}

/// Every leaf policy below `policy`, depth first, in document order.
/// Nested policy sets are walked but not included themselves.
pub fn flatten_descendants(policy: &Policy) -> Vec<Arc<Policy>> {
    let mut out = Vec::new();
    collect_leaves(policy, &mut out);
    out
}

fn collect_leaves(policy: &Policy, out: &mut Vec<Arc<Policy>>) {
    for child in policy.children() {
        match child.kind() {
            PolicyKind::Policy => out.push(Arc::clone(child)),
            PolicyKind::PolicySet => collect_leaves(child, out),
        }
    }
}
