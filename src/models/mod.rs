mod common;
mod context;
mod policy;

#[cfg(test)]
mod tests;

pub use common::{
    AttributeCategory, AttributeValue, DataType, Decision, Effect, StatusCode, ACCESS_SUBJECT,
    ACTION_ID, CURRENT_DATE, CURRENT_DATE_TIME, CURRENT_TIME, RESOURCE_ID, SUBJECT_ID,
};
pub use context::{Attribute, DecisionResult, Request, Response, Status, Subject};
pub use policy::{
    AttributeAssignment, AttributeDesignator, AttributeSelector, AttributeSource, Expression,
    Obligation, PolicyDocument, PolicyElement, PolicySetDocument, PolicySetMember, Rule, Target,
    TargetGroup, TargetMatch, VariableDefinition,
};
