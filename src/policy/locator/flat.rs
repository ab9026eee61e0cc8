use super::{FinderModule, LocatorOption, LocatorState, PolicyLocator};
use crate::policy::model::{Policy, PolicyKind};
use log::debug;
use std::sync::Arc;

/// Registers every assigned policy as its own finder module. A policy set
/// contributes its immediate children; deeper nesting is left alone.
#[derive(Debug, Default, Clone)]
pub struct FlatPolicyLocator {
    state: LocatorState,
}

impl FlatPolicyLocator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PolicyLocator for FlatPolicyLocator {
    fn set_policies(&mut self, policies: &[Arc<Policy>]) {
        let modules = policies
            .iter()
            .map(|policy| match policy.kind() {
                PolicyKind::Policy => FinderModule::new(Arc::clone(policy), vec![Arc::clone(policy)]),
                PolicyKind::PolicySet => {
                    FinderModule::new(Arc::clone(policy), policy.children().to_vec())
                }
            })
            .collect::<Vec<_>>();
        debug!("flat locator indexed {} finder modules", modules.len());
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
