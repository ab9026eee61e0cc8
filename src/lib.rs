#![forbid(unsafe_code)]

mod context;
mod error;
mod models;
mod pdp;
mod policy;
mod xml;

pub use context::{RequestContext, ResponseContext};

pub use error::{
    ConfigError, ElementPath, Error, EvaluateError, FactoryError, MalformedRequestError, XmlError,
};

pub use models::{
    Attribute, AttributeAssignment, AttributeCategory, AttributeDesignator, AttributeSelector,
    AttributeSource, AttributeValue, DataType, Decision, DecisionResult, Effect, Expression,
    Obligation, PolicyDocument, PolicyElement, PolicySetDocument, PolicySetMember, Request,
    Response, Rule, Status, StatusCode, Subject, Target, TargetGroup, TargetMatch,
    VariableDefinition, ACCESS_SUBJECT, ACTION_ID, CURRENT_DATE, CURRENT_DATE_TIME, CURRENT_TIME,
    RESOURCE_ID, SUBJECT_ID,
};

pub use pdp::{
    CombiningAlgorithm, LocatorConfig, LocatorKind, PdpConfig, PdpConfiguration, PdpState,
    PolicyDecisionPoint, PolicyRegistry, PolicySourceConfig, SharedPolicyDecisionPoint,
};

pub use policy::{
    flatten_descendants, FinderModule, FlatPolicyLocator, LocatorOption, Policy, PolicyBuilder,
    PolicyFactory, PolicyFinder, PolicyKind, PolicyLocator, PolicyReference,
    RecursivePolicyLocator, XacmlPolicyBuilder,
};

pub use xml::{Element, Node};
