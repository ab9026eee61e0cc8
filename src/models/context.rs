use super::common::{
    AttributeCategory, AttributeValue, DataType, Decision, StatusCode, ACCESS_SUBJECT, ACTION_ID,
    CONTEXT_NAMESPACE, RESOURCE_ID, SUBJECT_ID,
};
use super::policy::{obligations_from_element, obligations_to_element, Obligation};
use crate::error::{ElementPath, XmlError};
use crate::xml::Element;
use serde::{Deserialize, Serialize};

/// A request attribute. Several values form a bag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub attribute_id: String,
    pub data_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    pub values: Vec<String>,
}

impl Attribute {
    pub fn new(attribute_id: impl Into<String>, data_type: DataType, value: impl Into<String>) -> Self {
        Self {
            attribute_id: attribute_id.into(),
            data_type,
            issuer: None,
            values: vec![value.into()],
        }
    }

    pub fn string(attribute_id: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(attribute_id, DataType::String, value)
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.values.push(value.into());
        self
    }

    pub fn typed_values(&self) -> impl Iterator<Item = AttributeValue> + '_ {
        self.values
            .iter()
            .map(|value| AttributeValue::new(self.data_type.clone(), value.as_str()))
    }

    fn from_element(element: &Element) -> Result<Self, XmlError> {
        element.expect_name("Attribute")?;
        let data_type = DataType::from_uri(element.required_attribute("DataType")?);
        let values = element
            .children_named("AttributeValue")
            .map(|value| data_type.normalize(value.text()))
            .collect();
        Ok(Self {
            attribute_id: element.required_attribute("AttributeId")?.to_string(),
            data_type,
            issuer: element.attribute("Issuer").map(str::to_string),
            values,
        })
    }

    fn to_element(&self) -> Element {
        let mut element = Element::new("Attribute")
            .with_attribute("AttributeId", self.attribute_id.as_str())
            .with_attribute("DataType", self.data_type.uri())
            .with_optional_attribute("Issuer", self.issuer.as_deref());
        for value in &self.values {
            let mut child = Element::new("AttributeValue");
            if !value.is_empty() {
                child = child.with_text(value.as_str());
            }
            element.push_child(child);
        }
        element
    }
}

fn attributes_from_element(element: &Element) -> Result<Vec<Attribute>, XmlError> {
    element
        .children_named("Attribute")
        .map(Attribute::from_element)
        .collect()
}

fn group_to_element(name: &str, attributes: &[Attribute]) -> Element {
    attributes.iter().fold(Element::new(name), |element, attribute| {
        element.with_child(attribute.to_element())
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub category: String,
    pub attributes: Vec<Attribute>,
}

impl Subject {
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Self {
            category: ACCESS_SUBJECT.to_string(),
            attributes,
        }
    }
}

/// Structured XACML request: subject, resource, action and environment
/// attribute groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub subjects: Vec<Subject>,
    pub resources: Vec<Vec<Attribute>>,
    pub action: Vec<Attribute>,
    pub environment: Vec<Attribute>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an attribute to the access subject, creating it when absent.
    pub fn with_subject_attribute(mut self, attribute: Attribute) -> Self {
        match self
            .subjects
            .iter_mut()
            .find(|subject| subject.category == ACCESS_SUBJECT)
        {
            Some(subject) => subject.attributes.push(attribute),
            None => self.subjects.push(Subject::new(vec![attribute])),
        }
        self
    }

    pub fn with_resource_attribute(mut self, attribute: Attribute) -> Self {
        match self.resources.first_mut() {
            Some(resource) => resource.push(attribute),
            None => self.resources.push(vec![attribute]),
        }
        self
    }

    pub fn with_action_attribute(mut self, attribute: Attribute) -> Self {
        self.action.push(attribute);
        self
    }

    pub fn with_environment_attribute(mut self, attribute: Attribute) -> Self {
        self.environment.push(attribute);
        self
    }

    pub fn with_subject_id(self, subject_id: &str) -> Self {
        self.with_subject_attribute(Attribute::string(SUBJECT_ID, subject_id))
    }

    pub fn with_resource_id(self, resource_id: &str) -> Self {
        self.with_resource_attribute(Attribute::string(RESOURCE_ID, resource_id))
    }

    pub fn with_action_id(self, action_id: &str) -> Self {
        self.with_action_attribute(Attribute::string(ACTION_ID, action_id))
    }

    /// All attributes of a category; resource groups are flattened.
    pub fn attributes(&self, category: AttributeCategory) -> Vec<&Attribute> {
        match category {
            AttributeCategory::Subject => self
                .subjects
                .iter()
                .flat_map(|subject| subject.attributes.iter())
                .collect(),
            AttributeCategory::Resource => self.resources.iter().flatten().collect(),
            AttributeCategory::Action => self.action.iter().collect(),
            AttributeCategory::Environment => self.environment.iter().collect(),
        }
    }

    /// First value of the resource-id attribute, reported back in results.
    pub fn resource_id(&self) -> Option<&str> {
        self.resources
            .iter()
            .flatten()
            .find(|attribute| attribute.attribute_id == RESOURCE_ID)
            .and_then(|attribute| attribute.values.first())
            .map(String::as_str)
    }

    pub fn from_element(element: &Element) -> Result<Self, XmlError> {
        element.expect_name("Request")?;
        let mut request = Request::new();
        let mut saw_action = false;
        for child in element.child_elements() {
            match child.local_name() {
                "Subject" => request.subjects.push(Subject {
                    category: child
                        .attribute("SubjectCategory")
                        .unwrap_or(ACCESS_SUBJECT)
                        .to_string(),
                    attributes: attributes_from_element(child)?,
                }),
                "Resource" => request.resources.push(attributes_from_element(child)?),
                "Action" => {
                    saw_action = true;
                    request.action.extend(attributes_from_element(child)?);
                }
                "Environment" => request.environment.extend(attributes_from_element(child)?),
                other => return Err(XmlError::unexpected("request attribute group", other)),
            }
        }
        if request.subjects.is_empty() {
            return Err(XmlError::missing_element("Subject"));
        }
        if request.resources.is_empty() {
            return Err(XmlError::missing_element("Resource"));
        }
        if !saw_action {
            return Err(XmlError::missing_element("Action"));
        }
        Ok(request)
    }

    pub fn to_element(&self) -> Element {
        let mut element = Element::new("Request").with_attribute("xmlns", CONTEXT_NAMESPACE);
        // Subject, Resource and Action are mandatory in the schema even when empty
        if self.subjects.is_empty() {
            element.push_child(Element::new("Subject"));
        }
        for subject in &self.subjects {
            let mut child = group_to_element("Subject", &subject.attributes);
            if subject.category != ACCESS_SUBJECT {
                child.set_attribute("SubjectCategory", subject.category.as_str());
            }
            element.push_child(child);
        }
        if self.resources.is_empty() {
            element.push_child(Element::new("Resource"));
        }
        for resource in &self.resources {
            element.push_child(group_to_element("Resource", resource));
        }
        element.push_child(group_to_element("Action", &self.action));
        element.push_child(group_to_element("Environment", &self.environment));
        element
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub code: StatusCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Status {
    pub fn ok() -> Self {
        Self {
            code: StatusCode::Ok,
            message: None,
        }
    }

    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == StatusCode::Ok
    }

    fn from_element(element: &Element) -> Result<Self, XmlError> {
        let code = element
            .first_child("StatusCode")
            .ok_or_else(|| XmlError::missing_element("StatusCode"))?
            .required_attribute("Value")?;
        Ok(Self {
            code: StatusCode::from_uri(code),
            message: element.first_child("StatusMessage").map(Element::text),
        })
    }

    fn to_element(&self) -> Element {
        let mut element =
            Element::new("Status").with_child(Element::new("StatusCode").with_attribute("Value", self.code.uri()));
        if let Some(message) = &self.message {
            element.push_child(Element::new("StatusMessage").with_text(message.as_str()));
        }
        element
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::ok()
    }
}

/// One `Result` of a response: the decision with its status and obligations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    pub decision: Decision,
    #[serde(default)]
    pub status: Status,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub obligations: Vec<Obligation>,
}

impl DecisionResult {
    pub fn new(decision: Decision, status: Status) -> Self {
        Self {
            resource_id: None,
            decision,
            status,
            obligations: Vec::new(),
        }
    }

    pub fn from_element(element: &Element) -> Result<Self, XmlError> {
        element.expect_name("Result")?;
        let decision_text = element
            .first_child("Decision")
            .ok_or_else(|| XmlError::missing_element("Decision"))?
            .text();
        let decision = decision_text
            .trim()
            .parse::<Decision>()
            .map_err(|value| XmlError::invalid(ElementPath::element("Decision"), value))?;
        let status = match element.first_child("Status") {
            Some(status) => Status::from_element(status)?,
            None => Status::ok(),
        };
        let obligations = match element.first_child("Obligations") {
            Some(obligations) => obligations_from_element(obligations)?,
            None => Vec::new(),
        };
        Ok(Self {
            resource_id: element.attribute("ResourceId").map(str::to_string),
            decision,
            status,
            obligations,
        })
    }

    pub fn to_element(&self) -> Element {
        let mut element = Element::new("Result")
            .with_optional_attribute("ResourceId", self.resource_id.as_deref())
            .with_child(Element::new("Decision").with_text(self.decision.as_str()))
            .with_child(self.status.to_element());
        if !self.obligations.is_empty() {
            element.push_child(obligations_to_element(&self.obligations));
        }
        element
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub results: Vec<DecisionResult>,
}

impl Response {
    pub fn from_element(element: &Element) -> Result<Self, XmlError> {
        element.expect_name("Response")?;
        let results = element
            .children_named("Result")
            .map(DecisionResult::from_element)
            .collect::<Result<Vec<_>, _>>()?;
        if results.is_empty() {
            return Err(XmlError::missing_element("Result"));
        }
        Ok(Self { results })
    }

    pub fn to_element(&self) -> Element {
        self.results.iter().fold(
            Element::new("Response").with_attribute("xmlns", CONTEXT_NAMESPACE),
            |element, result| element.with_child(result.to_element()),
        )
    }
}
