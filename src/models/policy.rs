use super::common::{AttributeCategory, AttributeValue, DataType, Effect, POLICY_NAMESPACE};
use crate::error::{ElementPath, XmlError};
use crate::xml::Element;
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDesignator {
    pub category: AttributeCategory,
    pub attribute_id: String,
    pub data_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(default)]
    pub must_be_present: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_category: Option<String>,
}

impl AttributeDesignator {
    pub fn new(category: AttributeCategory, attribute_id: impl Into<String>, data_type: DataType) -> Self {
        Self {
            category,
            attribute_id: attribute_id.into(),
            data_type,
            issuer: None,
            must_be_present: false,
            subject_category: None,
        }
    }

    pub fn must_be_present(mut self) -> Self {
        self.must_be_present = true;
        self
    }

    fn from_element(element: &Element, category: AttributeCategory) -> Result<Self, XmlError> {
        let subject_category = match category {
            AttributeCategory::Subject => element.attribute("SubjectCategory").map(str::to_string),
            _ => None,
        };
        Ok(Self {
            category,
            attribute_id: element.required_attribute("AttributeId")?.to_string(),
            data_type: DataType::from_uri(element.required_attribute("DataType")?),
            issuer: element.attribute("Issuer").map(str::to_string),
            must_be_present: parse_bool(element, "MustBePresent")?,
            subject_category,
        })
    }

    fn to_element(&self) -> Element {
        let mut element = Element::new(self.category.designator_name())
            .with_attribute("AttributeId", self.attribute_id.as_str())
            .with_attribute("DataType", self.data_type.uri())
            .with_optional_attribute("Issuer", self.issuer.as_deref());
        if self.must_be_present {
            element.set_attribute("MustBePresent", "true");
        }
        element.with_optional_attribute("SubjectCategory", self.subject_category.as_deref())
    }
}

/// XPath-based attribute lookup. Parsed and serialized, never evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeSelector {
    pub request_context_path: String,
    pub data_type: DataType,
    #[serde(default)]
    pub must_be_present: bool,
}

impl AttributeSelector {
    fn from_element(element: &Element) -> Result<Self, XmlError> {
        Ok(Self {
            request_context_path: element.required_attribute("RequestContextPath")?.to_string(),
            data_type: DataType::from_uri(element.required_attribute("DataType")?),
            must_be_present: parse_bool(element, "MustBePresent")?,
        })
    }

    fn to_element(&self) -> Element {
        let element = Element::new("AttributeSelector")
            .with_attribute("RequestContextPath", self.request_context_path.as_str())
            .with_attribute("DataType", self.data_type.uri());
        if self.must_be_present {
            element.with_attribute("MustBePresent", "true")
        } else {
            element
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeSource {
    Designator(AttributeDesignator),
    Selector(AttributeSelector),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetMatch {
    pub match_id: String,
    pub value: AttributeValue,
    pub source: AttributeSource,
}

impl TargetMatch {
    pub fn new(match_id: impl Into<String>, value: AttributeValue, designator: AttributeDesignator) -> Self {
        Self {
            match_id: match_id.into(),
            value,
            source: AttributeSource::Designator(designator),
        }
    }

    fn from_element(element: &Element, category: AttributeCategory) -> Result<Self, XmlError> {
        let match_id = element.required_attribute("MatchId")?.to_string();
        let value = element
            .first_child("AttributeValue")
            .map(attribute_value_from_element)
            .ok_or_else(|| XmlError::missing_element("AttributeValue"))?;
        let source = if let Some(designator) = element.first_child(category.designator_name()) {
            AttributeSource::Designator(AttributeDesignator::from_element(designator, category)?)
        } else if let Some(selector) = element.first_child("AttributeSelector") {
            AttributeSource::Selector(AttributeSelector::from_element(selector)?)
        } else {
            return Err(XmlError::missing_element(category.designator_name()));
        };
        Ok(Self {
            match_id,
            value,
            source,
        })
    }

    fn to_element(&self, category: AttributeCategory) -> Element {
        let source = match &self.source {
            AttributeSource::Designator(designator) => designator.to_element(),
            AttributeSource::Selector(selector) => selector.to_element(),
        };
        Element::new(category.match_name())
            .with_attribute("MatchId", self.match_id.as_str())
            .with_child(attribute_value_to_element(&self.value))
            .with_child(source)
    }
}

/// One `Subject`/`Resource`/... entry of a target section; all matches must hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetGroup {
    pub matches: Vec<TargetMatch>,
}

/// Sections left empty match any request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subjects: Vec<TargetGroup>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<TargetGroup>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<TargetGroup>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environments: Vec<TargetGroup>,
}

impl Target {
    pub fn is_empty(&self) -> bool {
        AttributeCategory::ALL
            .iter()
            .all(|category| self.section(*category).is_empty())
    }

    pub fn section(&self, category: AttributeCategory) -> &[TargetGroup] {
        match category {
            AttributeCategory::Subject => &self.subjects,
            AttributeCategory::Resource => &self.resources,
            AttributeCategory::Action => &self.actions,
            AttributeCategory::Environment => &self.environments,
        }
    }

    fn section_mut(&mut self, category: AttributeCategory) -> &mut Vec<TargetGroup> {
        match category {
            AttributeCategory::Subject => &mut self.subjects,
            AttributeCategory::Resource => &mut self.resources,
            AttributeCategory::Action => &mut self.actions,
            AttributeCategory::Environment => &mut self.environments,
        }
    }

    /// Adds a single-match group to the section of the match's category.
    pub fn with_match(mut self, category: AttributeCategory, target_match: TargetMatch) -> Self {
        self.section_mut(category).push(TargetGroup {
            matches: vec![target_match],
        });
        self
    }

    pub fn from_element(element: &Element) -> Result<Self, XmlError> {
        element.expect_name("Target")?;
        let mut target = Target::default();
        for category in AttributeCategory::ALL {
            let Some(section) = element.first_child(category.section_name()) else {
                continue;
            };
            let groups = target.section_mut(category);
            for entry in section.child_elements() {
                if entry.local_name() == category.any_name() {
                    groups.clear();
                    break;
                }
                if entry.local_name() != category.entry_name() {
                    debug!("ignoring {} inside {}", entry.local_name(), section.local_name());
                    continue;
                }
                let matches = entry
                    .children_named(category.match_name())
                    .map(|m| TargetMatch::from_element(m, category))
                    .collect::<Result<Vec<_>, _>>()?;
                groups.push(TargetGroup { matches });
            }
        }
        Ok(target)
    }

    pub fn to_element(&self) -> Element {
        let mut element = Element::new("Target");
        for category in AttributeCategory::ALL {
            let groups = self.section(category);
            if groups.is_empty() {
                continue;
            }
            let mut section = Element::new(category.section_name());
            for group in groups {
                let mut entry = Element::new(category.entry_name());
                for target_match in &group.matches {
                    entry.push_child(target_match.to_element(category));
                }
                section.push_child(entry);
            }
            element.push_child(section);
        }
        element
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Expression {
    Apply {
        function_id: String,
        arguments: Vec<Expression>,
    },
    Value(AttributeValue),
    Designator(AttributeDesignator),
    Selector(AttributeSelector),
    VariableReference(String),
    Function(String),
}

impl Expression {
    pub fn apply(function_id: impl Into<String>, arguments: Vec<Expression>) -> Self {
        Expression::Apply {
            function_id: function_id.into(),
            arguments,
        }
    }

    pub fn from_element(element: &Element) -> Result<Self, XmlError> {
        let name = element.local_name();
        if let Some(category) = AttributeCategory::from_designator_name(name) {
            return Ok(Expression::Designator(AttributeDesignator::from_element(
                element, category,
            )?));
        }
        let expression = match name {
            "Apply" => Expression::Apply {
                function_id: element.required_attribute("FunctionId")?.to_string(),
                arguments: expressions_from_children(element)?,
            },
            "AttributeValue" => Expression::Value(attribute_value_from_element(element)),
            "AttributeSelector" => Expression::Selector(AttributeSelector::from_element(element)?),
            "VariableReference" => {
                Expression::VariableReference(element.required_attribute("VariableId")?.to_string())
            }
            "Function" => Expression::Function(element.required_attribute("FunctionId")?.to_string()),
            other => return Err(XmlError::unexpected("expression", other)),
        };
        Ok(expression)
    }

    pub fn to_element(&self) -> Element {
        match self {
            Expression::Apply {
                function_id,
                arguments,
            } => arguments.iter().fold(
                Element::new("Apply").with_attribute("FunctionId", function_id.as_str()),
                |apply, argument| apply.with_child(argument.to_element()),
            ),
            Expression::Value(value) => attribute_value_to_element(value),
            Expression::Designator(designator) => designator.to_element(),
            Expression::Selector(selector) => selector.to_element(),
            Expression::VariableReference(id) => {
                Element::new("VariableReference").with_attribute("VariableId", id.as_str())
            }
            Expression::Function(id) => Element::new("Function").with_attribute("FunctionId", id.as_str()),
        }
    }
}

fn expressions_from_children(element: &Element) -> Result<Vec<Expression>, XmlError> {
    element
        .child_elements()
        .filter(|child| child.local_name() != "Description")
        .map(Expression::from_element)
        .collect()
}

fn single_expression(element: &Element) -> Result<Expression, XmlError> {
    let mut children = element.child_elements();
    match (children.next(), children.next()) {
        (Some(expression), None) => Expression::from_element(expression),
        (None, _) => Err(XmlError::missing_element(&format!(
            "{} expression",
            element.local_name()
        ))),
        (Some(_), Some(extra)) => Err(XmlError::unexpected(
            &format!("end of {}", element.local_name()),
            extra.local_name(),
        )),
    }
}

fn condition_from_element(element: &Element) -> Result<Expression, XmlError> {
    // XACML 1.x conditions carry the function themselves
    if let Some(function_id) = element.attribute("FunctionId") {
        return Ok(Expression::Apply {
            function_id: function_id.to_string(),
            arguments: expressions_from_children(element)?,
        });
    }
    single_expression(element)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDefinition {
    pub variable_id: String,
    pub expression: Expression,
}

impl VariableDefinition {
    fn from_element(element: &Element) -> Result<Self, XmlError> {
        Ok(Self {
            variable_id: element.required_attribute("VariableId")?.to_string(),
            expression: single_expression(element)?,
        })
    }

    fn to_element(&self) -> Element {
        Element::new("VariableDefinition")
            .with_attribute("VariableId", self.variable_id.as_str())
            .with_child(self.expression.to_element())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub rule_id: String,
    pub effect: Effect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub target: Target,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Expression>,
}

impl Rule {
    pub fn new(rule_id: impl Into<String>, effect: Effect) -> Self {
        Self {
            rule_id: rule_id.into(),
            effect,
            description: None,
            target: Target::default(),
            condition: None,
        }
    }

    fn from_element(element: &Element) -> Result<Self, XmlError> {
        let effect_value = element.required_attribute("Effect")?;
        let effect = effect_value
            .parse::<Effect>()
            .map_err(|value: String| XmlError::invalid(ElementPath::attribute("Rule", "Effect"), value))?;
        let mut rule = Rule::new(element.required_attribute("RuleId")?, effect);
        for child in element.child_elements() {
            match child.local_name() {
                "Description" => rule.description = Some(child.text().trim().to_string()),
                "Target" => rule.target = Target::from_element(child)?,
                "Condition" => rule.condition = Some(condition_from_element(child)?),
                other => debug!("rule {}: ignoring {other}", rule.rule_id),
            }
        }
        Ok(rule)
    }

    fn to_element(&self) -> Element {
        let mut element = Element::new("Rule")
            .with_attribute("RuleId", self.rule_id.as_str())
            .with_attribute("Effect", self.effect.as_str());
        if let Some(description) = &self.description {
            element.push_child(Element::new("Description").with_text(description.as_str()));
        }
        if !self.target.is_empty() {
            element.push_child(self.target.to_element());
        }
        if let Some(condition) = &self.condition {
            element.push_child(Element::new("Condition").with_child(condition.to_element()));
        }
        element
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeAssignment {
    pub attribute_id: String,
    pub value: AttributeValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Obligation {
    pub obligation_id: String,
    pub fulfill_on: Effect,
    #[serde(default)]
    pub assignments: Vec<AttributeAssignment>,
}

impl Obligation {
    pub fn from_element(element: &Element) -> Result<Self, XmlError> {
        element.expect_name("Obligation")?;
        let fulfill_on = element
            .required_attribute("FulfillOn")?
            .parse::<Effect>()
            .map_err(|value: String| {
                XmlError::invalid(ElementPath::attribute("Obligation", "FulfillOn"), value)
            })?;
        let assignments = element
            .children_named("AttributeAssignment")
            .map(|assignment| {
                Ok(AttributeAssignment {
                    attribute_id: assignment.required_attribute("AttributeId")?.to_string(),
                    value: attribute_value_from_element(assignment),
                })
            })
            .collect::<Result<Vec<_>, XmlError>>()?;
        Ok(Self {
            obligation_id: element.required_attribute("ObligationId")?.to_string(),
            fulfill_on,
            assignments,
        })
    }

    pub fn to_element(&self) -> Element {
        let mut element = Element::new("Obligation")
            .with_attribute("ObligationId", self.obligation_id.as_str())
            .with_attribute("FulfillOn", self.fulfill_on.as_str());
        for assignment in &self.assignments {
            let mut child = Element::new("AttributeAssignment")
                .with_attribute("AttributeId", assignment.attribute_id.as_str())
                .with_attribute("DataType", assignment.value.data_type.uri());
            if !assignment.value.value.is_empty() {
                child = child.with_text(assignment.value.value.as_str());
            }
            element.push_child(child);
        }
        element
    }
}

pub(crate) fn obligations_from_element(element: &Element) -> Result<Vec<Obligation>, XmlError> {
    element
        .children_named("Obligation")
        .map(Obligation::from_element)
        .collect()
}

pub(crate) fn obligations_to_element(obligations: &[Obligation]) -> Element {
    obligations.iter().fold(Element::new("Obligations"), |element, obligation| {
        element.with_child(obligation.to_element())
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDocument {
    pub policy_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub rule_combining_alg_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub target: Target,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<VariableDefinition>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub obligations: Vec<Obligation>,
}

impl PolicyDocument {
    pub fn new(policy_id: impl Into<String>, rule_combining_alg_id: impl Into<String>) -> Self {
        Self {
            policy_id: policy_id.into(),
            version: None,
            rule_combining_alg_id: rule_combining_alg_id.into(),
            description: None,
            target: Target::default(),
            variables: Vec::new(),
            rules: Vec::new(),
            obligations: Vec::new(),
        }
    }

    pub fn from_element(element: &Element) -> Result<Self, XmlError> {
        element.expect_name("Policy")?;
        let mut policy = PolicyDocument::new(
            element.required_attribute("PolicyId")?,
            element.required_attribute("RuleCombiningAlgId")?,
        );
        policy.version = element.attribute("Version").map(str::to_string);
        for child in element.child_elements() {
            match child.local_name() {
                "Description" => policy.description = Some(child.text().trim().to_string()),
                "Target" => policy.target = Target::from_element(child)?,
                "VariableDefinition" => policy.variables.push(VariableDefinition::from_element(child)?),
                "Rule" => policy.rules.push(Rule::from_element(child)?),
                "Obligations" => policy.obligations = obligations_from_element(child)?,
                other => debug!("policy {}: ignoring {other}", policy.policy_id),
            }
        }
        Ok(policy)
    }

    pub fn to_element(&self) -> Element {
        let mut element = Element::new("Policy")
            .with_attribute("PolicyId", self.policy_id.as_str())
            .with_optional_attribute("Version", self.version.as_deref())
            .with_attribute("RuleCombiningAlgId", self.rule_combining_alg_id.as_str());
        if let Some(description) = &self.description {
            element.push_child(Element::new("Description").with_text(description.as_str()));
        }
        element.push_child(self.target.to_element());
        for variable in &self.variables {
            element.push_child(variable.to_element());
        }
        for rule in &self.rules {
            element.push_child(rule.to_element());
        }
        if !self.obligations.is_empty() {
            element.push_child(obligations_to_element(&self.obligations));
        }
        element
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PolicySetMember {
    Policy(PolicyDocument),
    PolicySet(PolicySetDocument),
    PolicyIdReference(String),
    PolicySetIdReference(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicySetDocument {
    pub policy_set_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub policy_combining_alg_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub target: Target,
    #[serde(default)]
    pub members: Vec<PolicySetMember>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub obligations: Vec<Obligation>,
}

impl PolicySetDocument {
    pub fn new(policy_set_id: impl Into<String>, policy_combining_alg_id: impl Into<String>) -> Self {
        Self {
            policy_set_id: policy_set_id.into(),
            version: None,
            policy_combining_alg_id: policy_combining_alg_id.into(),
            description: None,
            target: Target::default(),
            members: Vec::new(),
            obligations: Vec::new(),
        }
    }

    pub fn from_element(element: &Element) -> Result<Self, XmlError> {
        element.expect_name("PolicySet")?;
        let mut set = PolicySetDocument::new(
            element.required_attribute("PolicySetId")?,
            element.required_attribute("PolicyCombiningAlgId")?,
        );
        set.version = element.attribute("Version").map(str::to_string);
        for child in element.child_elements() {
            match child.local_name() {
                "Description" => set.description = Some(child.text().trim().to_string()),
                "Target" => set.target = Target::from_element(child)?,
                "Policy" => set
                    .members
                    .push(PolicySetMember::Policy(PolicyDocument::from_element(child)?)),
                "PolicySet" => set
                    .members
                    .push(PolicySetMember::PolicySet(PolicySetDocument::from_element(child)?)),
                "PolicyIdReference" => set
                    .members
                    .push(PolicySetMember::PolicyIdReference(reference_text(child)?)),
                "PolicySetIdReference" => set
                    .members
                    .push(PolicySetMember::PolicySetIdReference(reference_text(child)?)),
                "Obligations" => set.obligations = obligations_from_element(child)?,
                other => debug!("policy set {}: ignoring {other}", set.policy_set_id),
            }
        }
        Ok(set)
    }

    pub fn to_element(&self) -> Element {
        let mut element = Element::new("PolicySet")
            .with_attribute("PolicySetId", self.policy_set_id.as_str())
            .with_optional_attribute("Version", self.version.as_deref())
            .with_attribute("PolicyCombiningAlgId", self.policy_combining_alg_id.as_str());
        if let Some(description) = &self.description {
            element.push_child(Element::new("Description").with_text(description.as_str()));
        }
        element.push_child(self.target.to_element());
        for member in &self.members {
            let child = match member {
                PolicySetMember::Policy(policy) => policy.to_element(),
                PolicySetMember::PolicySet(set) => set.to_element(),
                PolicySetMember::PolicyIdReference(id) => {
                    Element::new("PolicyIdReference").with_text(id.as_str())
                }
                PolicySetMember::PolicySetIdReference(id) => {
                    Element::new("PolicySetIdReference").with_text(id.as_str())
                }
            };
            element.push_child(child);
        }
        if !self.obligations.is_empty() {
            element.push_child(obligations_to_element(&self.obligations));
        }
        element
    }
}

fn reference_text(element: &Element) -> Result<String, XmlError> {
    let id = element.text().trim().to_string();
    if id.is_empty() {
        return Err(XmlError::invalid(ElementPath::element(element.local_name()), id));
    }
    Ok(id)
}

/// Root of a policy document: either a `Policy` or a `PolicySet`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PolicyElement {
    Policy(PolicyDocument),
    PolicySet(PolicySetDocument),
}

impl PolicyElement {
    pub fn id(&self) -> &str {
        match self {
            PolicyElement::Policy(policy) => &policy.policy_id,
            PolicyElement::PolicySet(set) => &set.policy_set_id,
        }
    }

    pub fn target(&self) -> &Target {
        match self {
            PolicyElement::Policy(policy) => &policy.target,
            PolicyElement::PolicySet(set) => &set.target,
        }
    }

    pub fn from_element(element: &Element) -> Result<Self, XmlError> {
        match element.local_name() {
            "Policy" => Ok(PolicyElement::Policy(PolicyDocument::from_element(element)?)),
            "PolicySet" => Ok(PolicyElement::PolicySet(PolicySetDocument::from_element(element)?)),
            other => Err(XmlError::unexpected("Policy or PolicySet", other)),
        }
    }

    /// Document root element, namespace declaration included.
    pub fn to_element(&self) -> Element {
        let element = match self {
            PolicyElement::Policy(policy) => policy.to_element(),
            PolicyElement::PolicySet(set) => set.to_element(),
        };
        element.with_attribute("xmlns", POLICY_NAMESPACE)
    }
}

pub(crate) fn attribute_value_from_element(element: &Element) -> AttributeValue {
    let data_type: DataType = element
        .attribute("DataType")
        .map(DataType::from_uri)
        .unwrap_or_default();
    let value = data_type.normalize(element.text());
    AttributeValue { data_type, value }
}

pub(crate) fn attribute_value_to_element(value: &AttributeValue) -> Element {
    let element = Element::new("AttributeValue").with_attribute("DataType", value.data_type.uri());
    if value.value.is_empty() {
        element
    } else {
        element.with_text(value.value.as_str())
    }
}

fn parse_bool(element: &Element, name: &str) -> Result<bool, XmlError> {
    match element.attribute(name) {
        None | Some("false") | Some("0") => Ok(false),
        Some("true") | Some("1") => Ok(true),
        Some(other) => Err(XmlError::invalid(
            ElementPath::attribute(element.local_name(), name),
            other,
        )),
    }
}
