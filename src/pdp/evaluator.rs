use super::combining::{CombiningAlgorithm, CombiningLevel};
use super::config::PdpConfig;
use super::functions::{Function, RegexCache, Value};
use crate::models::{
    Attribute, AttributeCategory, AttributeDesignator, AttributeSelector, AttributeSource,
    AttributeValue, DataType, Decision, DecisionResult, Effect, Expression, Obligation,
    PolicyDocument, PolicyElement, Request, Rule, Status, StatusCode, Target, TargetGroup,
    TargetMatch, VariableDefinition, ACCESS_SUBJECT, CURRENT_DATE, CURRENT_DATE_TIME,
    CURRENT_TIME,
};
use crate::policy::{FinderModule, Policy, PolicyFinder, PolicyReference, SetMember};
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// An evaluation-time failure, reported through the Indeterminate status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EvalError {
    pub(crate) code: StatusCode,
    pub(crate) message: String,
}

impl EvalError {
    pub(crate) fn processing(message: impl Into<String>) -> Self {
        Self {
            code: StatusCode::ProcessingError,
            message: message.into(),
        }
    }

    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        Self {
            code: StatusCode::SyntaxError,
            message: message.into(),
        }
    }

    pub(crate) fn missing_attribute(message: impl Into<String>) -> Self {
        Self {
            code: StatusCode::MissingAttribute,
            message: message.into(),
        }
    }

    fn context(self, function_id: &str) -> Self {
        Self {
            message: format!("{function_id}: {}", self.message),
            ..self
        }
    }

    pub(crate) fn status(&self) -> Status {
        Status::new(self.code.clone(), self.message.as_str())
    }
}

/// Decision of a rule, policy or policy set together with what produced it.
#[derive(Debug, Clone)]
pub(crate) struct Evaluation {
    pub(crate) decision: Decision,
    pub(crate) status: Status,
    pub(crate) obligations: Vec<Obligation>,
    /// Effect of the evaluated rule; `None` above the rule level.
    pub(crate) effect: Option<Effect>,
}

impl Evaluation {
    pub(crate) fn not_applicable() -> Self {
        Self::decided(Decision::NotApplicable)
    }

    fn decided(decision: Decision) -> Self {
        Self {
            decision,
            status: Status::ok(),
            obligations: Vec::new(),
            effect: None,
        }
    }

    pub(crate) fn indeterminate(error: EvalError) -> Self {
        Self {
            decision: Decision::Indeterminate,
            status: error.status(),
            obligations: Vec::new(),
            effect: None,
        }
    }

    fn with_effect(mut self, effect: Effect) -> Self {
        self.effect = Some(effect);
        self
    }

    /// Appends the obligations meant for the decision reached.
    fn fulfil(mut self, obligations: &[Obligation]) -> Self {
        if let Some(effect) = self.decision.effect() {
            self.obligations.extend(
                obligations
                    .iter()
                    .filter(|obligation| obligation.fulfill_on == effect)
                    .cloned(),
            );
        }
        self
    }

    pub(crate) fn into_result(self, resource_id: Option<String>) -> DecisionResult {
        DecisionResult {
            resource_id,
            decision: self.decision,
            status: self.status,
            obligations: self.obligations,
        }
    }
}

#[derive(Debug)]
enum MatchResult {
    Match,
    NoMatch,
    Indeterminate(EvalError),
}

/// Where references met while evaluating a policy are resolved.
#[derive(Clone, Copy)]
struct Scope<'s> {
    module: Option<&'s FinderModule>,
    bound: Option<&'s Arc<dyn PolicyFinder>>,
    depth: usize,
}

/// Variable definitions of the policy being evaluated.
struct Variables<'d> {
    definitions: HashMap<&'d str, &'d Expression>,
    active: Vec<&'d str>,
}

impl<'d> Variables<'d> {
    fn new(definitions: &'d [VariableDefinition]) -> Self {
        Self {
            definitions: definitions
                .iter()
                .map(|definition| (definition.variable_id.as_str(), &definition.expression))
                .collect(),
            active: Vec::new(),
        }
    }

    fn definition(&self, id: &str) -> Result<(&'d str, &'d Expression), EvalError> {
        self.definitions
            .get_key_value(id)
            .map(|(name, expression)| (*name, *expression))
            .ok_or_else(|| EvalError::syntax(format!("undefined variable {id}")))
    }
}

/// Per-request evaluation state. Nothing here outlives one `evaluate` call.
pub(crate) struct Evaluator<'a> {
    request: &'a Request,
    supplied: Vec<Attribute>,
    registry: &'a dyn PolicyFinder,
    max_reference_depth: usize,
    regexes: RegexCache,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(request: &'a Request, config: &PdpConfig, registry: &'a dyn PolicyFinder) -> Self {
        let supplied = if config.supply_environment_time {
            current_time_attributes(request)
        } else {
            Vec::new()
        };
        Self {
            request,
            supplied,
            registry,
            max_reference_depth: config.max_reference_depth,
            regexes: RegexCache::default(),
        }
    }

    /// Evaluates the roots of `modules` and combines their decisions.
    pub(crate) fn evaluate_modules(
        &self,
        modules: &[FinderModule],
        algorithm: CombiningAlgorithm,
    ) -> Evaluation {
        algorithm.combine(
            CombiningLevel::Policy,
            modules,
            |module| self.is_applicable(module.root().target()),
            |module| self.evaluate_policy(module.root(), Scope::module(module)),
        )
    }

    fn is_applicable(&self, target: &Target) -> Result<bool, EvalError> {
        match self.match_target(target) {
            MatchResult::Match => Ok(true),
            MatchResult::NoMatch => Ok(false),
            MatchResult::Indeterminate(err) => Err(err),
        }
    }

    fn evaluate_policy(&self, policy: &Policy, scope: Scope<'_>) -> Evaluation {
        match self.match_target(policy.target()) {
            MatchResult::Match => {}
            MatchResult::NoMatch => return Evaluation::not_applicable(),
            MatchResult::Indeterminate(err) => {
                debug!("policy {}: target is indeterminate: {}", policy.id(), err.message);
                return Evaluation::indeterminate(err);
            }
        }
        let scope = Scope {
            bound: policy.finder().or(scope.bound),
            ..scope
        };
        match policy.document() {
            PolicyElement::Policy(document) => {
                self.evaluate_rules(document).fulfil(&document.obligations)
            }
            PolicyElement::PolicySet(document) => self
                .evaluate_members(policy, &document.policy_combining_alg_id, scope)
                .fulfil(&document.obligations),
        }
    }

    fn evaluate_rules(&self, document: &PolicyDocument) -> Evaluation {
        let Some(algorithm) = CombiningAlgorithm::from_rule_id(&document.rule_combining_alg_id)
        else {
            warn!(
                "policy {}: unknown rule combining algorithm {}",
                document.policy_id, document.rule_combining_alg_id
            );
            return Evaluation::indeterminate(EvalError::syntax(format!(
                "unknown rule combining algorithm {}",
                document.rule_combining_alg_id
            )));
        };
        let mut variables = Variables::new(&document.variables);
        algorithm.combine(
            CombiningLevel::Rule,
            &document.rules,
            |rule| self.is_applicable(&rule.target),
            |rule| self.evaluate_rule(rule, &mut variables),
        )
    }

    fn evaluate_rule(&self, rule: &Rule, variables: &mut Variables<'_>) -> Evaluation {
        let evaluation = match self.match_target(&rule.target) {
            MatchResult::NoMatch => Evaluation::not_applicable(),
            MatchResult::Indeterminate(err) => Evaluation::indeterminate(err),
            MatchResult::Match => match &rule.condition {
                None => Evaluation::decided(rule.effect.decision()),
                Some(condition) => match self
                    .eval(condition, variables)
                    .and_then(|value| value.as_bool())
                {
                    Ok(true) => Evaluation::decided(rule.effect.decision()),
                    Ok(false) => Evaluation::not_applicable(),
                    Err(err) => {
                        debug!("rule {}: condition is indeterminate: {}", rule.rule_id, err.message);
                        Evaluation::indeterminate(err)
                    }
                },
            },
        };
        evaluation.with_effect(rule.effect)
    }

    fn evaluate_members(&self, policy: &Policy, algorithm_id: &str, scope: Scope<'_>) -> Evaluation {
        let Some(algorithm) = CombiningAlgorithm::from_policy_id(algorithm_id) else {
            warn!(
                "policy set {}: unknown policy combining algorithm {algorithm_id}",
                policy.id()
            );
            return Evaluation::indeterminate(EvalError::syntax(format!(
                "unknown policy combining algorithm {algorithm_id}"
            )));
        };
        algorithm.combine(
            CombiningLevel::Policy,
            policy
                .members()
                .into_iter()
                .map(|member| self.resolve(policy, member, scope)),
            |resolved| match resolved {
                Ok((child, _)) => self.is_applicable(child.target()),
                Err(err) => Err(err.clone()),
            },
            |resolved| match resolved {
                Ok((child, depth)) => self.evaluate_policy(&child, Scope { depth, ..scope }),
                Err(err) => Evaluation::indeterminate(err),
            },
        )
    }

    /// Returns the member policy and the reference depth to evaluate it at.
    fn resolve(
        &self,
        parent: &Policy,
        member: SetMember<'_>,
        scope: Scope<'_>,
    ) -> Result<(Arc<Policy>, usize), EvalError> {
        let reference = match member {
            SetMember::Child(child) => return Ok((Arc::clone(child), scope.depth)),
            SetMember::Reference(reference) => reference,
        };
        let depth = scope.depth + 1;
        if depth > self.max_reference_depth {
            warn!(
                "policy set {}: reference {} exceeds the maximum depth {}",
                parent.id(),
                reference.id,
                self.max_reference_depth
            );
            return Err(EvalError::processing(format!(
                "reference {} exceeds the maximum depth {}",
                reference.id, self.max_reference_depth
            )));
        }
        match self.find(&reference, scope) {
            Some(found) => Ok((found, depth)),
            None => {
                warn!(
                    "policy set {}: unable to resolve {} reference {}",
                    parent.id(),
                    reference.kind,
                    reference.id
                );
                Err(EvalError::processing(format!(
                    "unable to resolve {} reference {}",
                    reference.kind, reference.id
                )))
            }
        }
    }

    fn find(&self, reference: &PolicyReference, scope: Scope<'_>) -> Option<Arc<Policy>> {
        scope
            .module
            .and_then(|module| module.find(reference))
            .or_else(|| scope.bound.and_then(|finder| finder.find(reference)))
            .or_else(|| self.registry.find(reference))
    }

    fn match_target(&self, target: &Target) -> MatchResult {
        let mut indeterminate = None;
        for category in AttributeCategory::ALL {
            let groups = target.section(category);
            if groups.is_empty() {
                continue;
            }
            match self.match_section(groups) {
                MatchResult::Match => {}
                MatchResult::NoMatch => return MatchResult::NoMatch,
                MatchResult::Indeterminate(err) => {
                    indeterminate.get_or_insert(err);
                }
            }
        }
        indeterminate.map_or(MatchResult::Match, MatchResult::Indeterminate)
    }

    fn match_section(&self, groups: &[TargetGroup]) -> MatchResult {
        let mut indeterminate = None;
        for group in groups {
            match self.match_group(group) {
                MatchResult::Match => return MatchResult::Match,
                MatchResult::NoMatch => {}
                MatchResult::Indeterminate(err) => {
                    indeterminate.get_or_insert(err);
                }
            }
        }
        indeterminate.map_or(MatchResult::NoMatch, MatchResult::Indeterminate)
    }

    fn match_group(&self, group: &TargetGroup) -> MatchResult {
        let mut indeterminate = None;
        for target_match in &group.matches {
            match self.match_one(target_match) {
                MatchResult::Match => {}
                MatchResult::NoMatch => return MatchResult::NoMatch,
                MatchResult::Indeterminate(err) => {
                    indeterminate.get_or_insert(err);
                }
            }
        }
        indeterminate.map_or(MatchResult::Match, MatchResult::Indeterminate)
    }

    fn match_one(&self, target_match: &TargetMatch) -> MatchResult {
        let Some(function) = Function::from_id(&target_match.match_id) else {
            return MatchResult::Indeterminate(EvalError::processing(format!(
                "unknown match function {}",
                target_match.match_id
            )));
        };
        let bag = match &target_match.source {
            AttributeSource::Designator(designator) => match self.attribute_bag(designator) {
                Ok(bag) => bag,
                Err(err) => return MatchResult::Indeterminate(err),
            },
            AttributeSource::Selector(selector) => {
                return MatchResult::Indeterminate(selector_unsupported(selector))
            }
        };
        let literal = Value::Single(target_match.value.clone());
        let mut indeterminate = None;
        for candidate in bag {
            let matched = function
                .apply(&[literal.clone(), Value::Single(candidate)], &self.regexes)
                .and_then(|value| value.as_bool());
            match matched {
                Ok(true) => return MatchResult::Match,
                Ok(false) => {}
                Err(err) => {
                    indeterminate.get_or_insert(err.context(&target_match.match_id));
                }
            }
        }
        indeterminate.map_or(MatchResult::NoMatch, MatchResult::Indeterminate)
    }

    fn attribute_bag(&self, designator: &AttributeDesignator) -> Result<Vec<AttributeValue>, EvalError> {
        let candidates: Vec<&Attribute> = match designator.category {
            AttributeCategory::Subject => {
                let category = designator.subject_category.as_deref().unwrap_or(ACCESS_SUBJECT);
                self.request
                    .subjects
                    .iter()
                    .filter(|subject| subject.category == category)
                    .flat_map(|subject| subject.attributes.iter())
                    .collect()
            }
            AttributeCategory::Environment => self
                .request
                .environment
                .iter()
                .chain(self.supplied.iter())
                .collect(),
            other => self.request.attributes(other),
        };
        let values: Vec<AttributeValue> = candidates
            .into_iter()
            .filter(|attribute| {
                attribute.attribute_id == designator.attribute_id
                    && attribute.data_type == designator.data_type
                    && designator
                        .issuer
                        .as_ref()
                        .map_or(true, |issuer| attribute.issuer.as_ref() == Some(issuer))
            })
            .flat_map(|attribute| attribute.typed_values())
            .collect();
        if values.is_empty() && designator.must_be_present {
            return Err(EvalError::missing_attribute(format!(
                "missing {} attribute {}",
                designator.category.entry_name(),
                designator.attribute_id
            )));
        }
        Ok(values)
    }

    fn eval(&self, expression: &Expression, variables: &mut Variables<'_>) -> Result<Value, EvalError> {
        match expression {
            Expression::Apply {
                function_id,
                arguments,
            } => self.apply(function_id, arguments, variables),
            Expression::Value(value) => Ok(Value::Single(value.clone())),
            Expression::Designator(designator) => self.attribute_bag(designator).map(Value::Bag),
            Expression::Selector(selector) => Err(selector_unsupported(selector)),
            Expression::VariableReference(id) => {
                let (name, definition) = variables.definition(id)?;
                if variables.active.contains(&name) {
                    return Err(EvalError::syntax(format!("circular reference to variable {id}")));
                }
                variables.active.push(name);
                let value = self.eval(definition, variables);
                variables.active.pop();
                value
            }
            Expression::Function(id) => Ok(Value::Function(id.clone())),
        }
    }

    fn apply(
        &self,
        function_id: &str,
        arguments: &[Expression],
        variables: &mut Variables<'_>,
    ) -> Result<Value, EvalError> {
        let function = Function::from_id(function_id)
            .ok_or_else(|| EvalError::processing(format!("unknown function {function_id}")))?;
        // and/or stop at the first deciding argument, later ones may be missing
        if matches!(function, Function::And | Function::Or) {
            let deciding = function == Function::Or;
            for argument in arguments {
                let value = self.eval(argument, variables)?;
                if value.as_bool().map_err(|err| err.context(function_id))? == deciding {
                    return Ok(Value::boolean(deciding));
                }
            }
            return Ok(Value::boolean(!deciding));
        }
        let values = arguments
            .iter()
            .map(|argument| self.eval(argument, variables))
            .collect::<Result<Vec<_>, _>>()?;
        function
            .apply(&values, &self.regexes)
            .map_err(|err| err.context(function_id))
    }
}

impl<'s> Scope<'s> {
    fn module(module: &'s FinderModule) -> Self {
        Self {
            module: Some(module),
            bound: None,
            depth: 0,
        }
    }
}

fn selector_unsupported(selector: &AttributeSelector) -> EvalError {
    EvalError::processing(format!(
        "attribute selectors are not supported: {}",
        selector.request_context_path
    ))
}

/// Environment time attributes the request does not carry itself.
fn current_time_attributes(request: &Request) -> Vec<Attribute> {
    let now = match OffsetDateTime::now_utc().format(&Rfc3339) {
        Ok(now) => now,
        Err(err) => {
            warn!("unable to format the current time: {err}");
            return Vec::new();
        }
    };
    let (date, time) = now.split_at(10);
    let time = time.strip_prefix('T').unwrap_or(time);
    [
        (CURRENT_TIME, DataType::Time, time),
        (CURRENT_DATE, DataType::Date, date),
        (CURRENT_DATE_TIME, DataType::DateTime, now.as_str()),
    ]
    .into_iter()
    .filter(|(id, _, _)| {
        !request
            .environment
            .iter()
            .any(|attribute| attribute.attribute_id == *id)
    })
    .map(|(id, data_type, value)| Attribute::new(id, data_type, value))
    .collect()
}
