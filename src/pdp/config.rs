use super::combining::CombiningAlgorithm;
use super::PolicyDecisionPoint;
use crate::error::ConfigError;
use crate::policy::{
    FlatPolicyLocator, LocatorOption, PolicyFactory, PolicyKind, PolicyLocator,
    RecursivePolicyLocator,
};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Evaluation settings of a [`PolicyDecisionPoint`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PdpConfig {
    /// Combines the decisions of the applicable top-level policies.
    pub top_level_combining: CombiningAlgorithm,
    /// Nesting limit for policy references before the result is Indeterminate.
    pub max_reference_depth: usize,
    /// Supplies current-time, current-date and current-dateTime when the
    /// request does not carry them.
    pub supply_environment_time: bool,
}

impl Default for PdpConfig {
    fn default() -> Self {
        Self {
            top_level_combining: CombiningAlgorithm::OnlyOneApplicable,
            max_reference_depth: 16,
            supply_environment_time: true,
        }
    }
}

impl PdpConfig {
    pub fn with_top_level_combining(mut self, algorithm: CombiningAlgorithm) -> Self {
        self.top_level_combining = algorithm;
        self
    }

    pub fn with_max_reference_depth(mut self, depth: usize) -> Self {
        self.max_reference_depth = depth;
        self
    }

    pub fn with_supply_environment_time(mut self, supply: bool) -> Self {
        self.supply_environment_time = supply;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicySourceConfig {
    pub path: PathBuf,
    #[serde(default = "default_policy_kind")]
    pub kind: PolicyKind,
}

fn default_policy_kind() -> PolicyKind {
    PolicyKind::PolicySet
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LocatorKind {
    Flat,
    Recursive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocatorConfig {
    pub kind: LocatorKind,
    #[serde(default)]
    pub options: Vec<LocatorOption>,
}

impl LocatorConfig {
    fn build(&self) -> Box<dyn PolicyLocator> {
        let mut locator: Box<dyn PolicyLocator> = match self.kind {
            LocatorKind::Flat => Box::new(FlatPolicyLocator::new()),
            LocatorKind::Recursive => Box::new(RecursivePolicyLocator::new()),
        };
        locator.set_options(self.options.clone());
        locator
    }
}

/// JSON description of a fully configured decision point.
///
/// ```json
/// {
///   "pdp": { "topLevelCombining": "deny-overrides" },
///   "policies": [{ "path": "policies/layers.xml", "kind": "policy" }],
///   "locators": [{ "kind": "flat" }]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PdpConfiguration {
    pub pdp: PdpConfig,
    pub policies: Vec<PolicySourceConfig>,
    pub locators: Vec<LocatorConfig>,
}

impl PdpConfiguration {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}

impl PolicyDecisionPoint {
    /// Loads every configured policy and locator. Relative policy paths are
    /// resolved against `base_dir`.
    pub fn from_configuration(
        configuration: &PdpConfiguration,
        base_dir: impl AsRef<Path>,
    ) -> Result<Self, ConfigError> {
        let base_dir = base_dir.as_ref();
        let factory = PolicyFactory::new();
        let mut policies = Vec::with_capacity(configuration.policies.len());
        for source in &configuration.policies {
            let path = base_dir.join(&source.path);
            let display = path.display().to_string();
            let file = File::open(&path).map_err(|source| ConfigError::Io {
                path: display.clone(),
                source,
            })?;
            let policy = match source.kind {
                PolicyKind::Policy => factory.create_policy(file),
                PolicyKind::PolicySet => factory.create_policy_set(file),
            }
            .map_err(|source| ConfigError::Policy {
                path: display,
                source,
            })?;
            policies.push(Arc::new(policy));
        }

        let mut pdp = PolicyDecisionPoint::with_config(configuration.pdp.clone());
        pdp.set_policies(policies);
        pdp.set_locators(configuration.locators.iter().map(LocatorConfig::build).collect());
        Ok(pdp)
    }
}
