//! Policy decision point: indexes located policies and evaluates requests
//! against them.

mod combining;
mod config;
mod evaluator;
mod functions;


pub use combining::CombiningAlgorithm;
pub use config::{LocatorConfig, LocatorKind, PdpConfig, PdpConfiguration, PolicySourceConfig};

use crate::context::{RequestContext, ResponseContext};
use crate::error::EvaluateError;
use crate::policy::{FinderModule, Policy, PolicyFinder, PolicyLocator, PolicyReference};
use evaluator::Evaluator;
use log::{debug, warn};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Configuration progress of a [`PolicyDecisionPoint`]. Evaluation itself
/// keeps no state, so any configured point can evaluate again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdpState {
    Unconfigured,
    PoliciesSet,
    LocatorsSet,
}

/// Resolves references against the configured top-level policies and
/// everything nested inside them.
#[derive(Debug, Clone, Default)]
pub struct PolicyRegistry {
    policies: Vec<Arc<Policy>>,
}

impl PolicyRegistry {
    pub fn new(policies: Vec<Arc<Policy>>) -> Self {
        Self { policies }
    }

    pub fn policies(&self) -> &[Arc<Policy>] {
        &self.policies
    }
}

impl PolicyFinder for PolicyRegistry {
    fn find(&self, reference: &PolicyReference) -> Option<Arc<Policy>> {
        self.policies
            .iter()
            .find_map(|policy| policy.find_descendant(reference))
    }
}

/// Evaluates requests against the policies found by its locators.
///
/// `set_policies` and `set_locators` may be called in either order; each
/// call reseeds the locators and rebuilds the finder-module index, so
/// `evaluate` only reads.
pub struct PolicyDecisionPoint {
    config: PdpConfig,
    policies: Option<Vec<Arc<Policy>>>,
    locators: Vec<Box<dyn PolicyLocator>>,
    modules: Vec<FinderModule>,
    registry: PolicyRegistry,
}

impl Default for PolicyDecisionPoint {
    fn default() -> Self {
        Self::with_config(PdpConfig::default())
    }
}

impl PolicyDecisionPoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PdpConfig) -> Self {
        Self {
            config,
            policies: None,
            locators: Vec::new(),
            modules: Vec::new(),
            registry: PolicyRegistry::default(),
        }
    }

    pub fn config(&self) -> &PdpConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: PdpConfig) {
        self.config = config;
    }

    /// Replaces the policy set. Policies repeating the id and kind of an
    /// earlier one are skipped.
    pub fn set_policies(&mut self, policies: impl IntoIterator<Item = Arc<Policy>>) {
        let mut unique: Vec<Arc<Policy>> = Vec::new();
        for policy in policies {
            let duplicate = unique.iter().any(|known| {
                known.kind() == policy.kind() && known.id() == policy.id()
            });
            if duplicate {
                warn!("policy {}: duplicate top-level {}, skipped", policy.id(), policy.kind());
                continue;
            }
            unique.push(policy);
        }
        self.registry = PolicyRegistry::new(unique.clone());
        self.policies = Some(unique);
        self.reindex();
    }

    pub fn set_locators(&mut self, locators: Vec<Box<dyn PolicyLocator>>) {
        self.locators = locators;
        self.reindex();
    }

    pub fn add_locator(&mut self, locator: impl PolicyLocator + 'static) {
        self.locators.push(Box::new(locator));
        self.reindex();
    }

    pub fn policies(&self) -> &[Arc<Policy>] {
        self.policies.as_deref().unwrap_or_default()
    }

    pub fn locators(&self) -> &[Box<dyn PolicyLocator>] {
        &self.locators
    }

    /// Finder modules of every locator, first occurrence of each root kept.
    pub fn finder_modules(&self) -> &[FinderModule] {
        &self.modules
    }

    pub fn state(&self) -> PdpState {
        match (&self.policies, self.locators.is_empty()) {
            (Some(_), false) => PdpState::LocatorsSet,
            (Some(_), true) => PdpState::PoliciesSet,
            (None, _) => PdpState::Unconfigured,
        }
    }

    fn reindex(&mut self) {
        let policies = self.policies.as_deref().unwrap_or_default();
        let mut modules: Vec<FinderModule> = Vec::new();
        for locator in &mut self.locators {
            locator.set_policies(policies);
            for module in locator.finder_modules() {
                if modules
                    .iter()
                    .any(|known| Arc::ptr_eq(known.root(), module.root()))
                {
                    debug!("policy {}: already indexed by another locator", module.root().id());
                    continue;
                }
                modules.push(module.clone());
            }
        }
        self.modules = modules;
    }

    /// Renders a decision for `context`.
    ///
    /// Problems met while evaluating policies never surface as errors; they
    /// yield an Indeterminate result whose status says what went wrong.
    pub fn evaluate(&self, context: &RequestContext) -> Result<ResponseContext, EvaluateError> {
        let request = context.request().ok_or(EvaluateError::MissingRequest)?;
        if self.state() != PdpState::LocatorsSet {
            debug!("evaluating with state {:?}, no policy can apply", self.state());
        }
        let evaluator = Evaluator::new(request, &self.config, &self.registry);
        let evaluation = evaluator.evaluate_modules(&self.modules, self.config.top_level_combining);
        let resource_id = request.resource_id().map(str::to_string);
        debug!(
            "resource {}: {} over {} finder modules",
            resource_id.as_deref().unwrap_or("-"),
            evaluation.decision,
            self.modules.len()
        );
        Ok(ResponseContext::new(evaluation.into_result(resource_id)))
    }
}

impl fmt::Debug for PolicyDecisionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyDecisionPoint")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("policies", &self.policies().len())
            .field("locators", &self.locators.len())
            .field("modules", &self.modules)
            .finish()
    }
}

/// A decision point shared between threads: evaluations take the lock
/// shared, reconfiguration takes it exclusively.
#[derive(Debug, Clone)]
pub struct SharedPolicyDecisionPoint {
    inner: Arc<RwLock<PolicyDecisionPoint>>,
}

impl SharedPolicyDecisionPoint {
    pub fn new(pdp: PolicyDecisionPoint) -> Self {
        Self {
            inner: Arc::new(RwLock::new(pdp)),
        }
    }

    pub fn evaluate(&self, context: &RequestContext) -> Result<ResponseContext, EvaluateError> {
        let pdp = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        pdp.evaluate(context)
    }

    /// Runs `change` with no evaluation in flight.
    pub fn reconfigure<T>(&self, change: impl FnOnce(&mut PolicyDecisionPoint) -> T) -> T {
        let mut pdp = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        change(&mut pdp)
    }
}

impl From<PolicyDecisionPoint> for SharedPolicyDecisionPoint {
    fn from(pdp: PolicyDecisionPoint) -> Self {
        Self::new(pdp)
    }
}
