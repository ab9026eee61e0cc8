use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub(crate) const POLICY_NAMESPACE: &str = "urn:oasis:names:tc:xacml:2.0:policy:schema:os";
pub(crate) const CONTEXT_NAMESPACE: &str = "urn:oasis:names:tc:xacml:2.0:context:schema:os";

pub const SUBJECT_ID: &str = "urn:oasis:names:tc:xacml:1.0:subject:subject-id";
pub const RESOURCE_ID: &str = "urn:oasis:names:tc:xacml:1.0:resource:resource-id";
pub const ACTION_ID: &str = "urn:oasis:names:tc:xacml:1.0:action:action-id";
pub const CURRENT_TIME: &str = "urn:oasis:names:tc:xacml:1.0:environment:current-time";
pub const CURRENT_DATE: &str = "urn:oasis:names:tc:xacml:1.0:environment:current-date";
pub const CURRENT_DATE_TIME: &str = "urn:oasis:names:tc:xacml:1.0:environment:current-dateTime";
pub const ACCESS_SUBJECT: &str = "urn:oasis:names:tc:xacml:1.0:subject-category:access-subject";

const XSD: &str = "http://www.w3.org/2001/XMLSchema#";

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataType {
    #[default]
    String,
    Boolean,
    Integer,
    Double,
    AnyUri,
    Date,
    Time,
    DateTime,
    Other(String),
}

impl DataType {
    pub fn from_uri(uri: &str) -> Self {
        match uri.strip_prefix(XSD) {
            Some(short) => {
                Self::from_short_name(short).unwrap_or_else(|| Self::Other(uri.to_string()))
            }
            None => Self::Other(uri.to_string()),
        }
    }

    /// Maps the type token used inside function identifiers (`string`, `anyURI`, ...).
    pub fn from_short_name(short: &str) -> Option<Self> {
        let data_type = match short {
            "string" => Self::String,
            "boolean" => Self::Boolean,
            "integer" => Self::Integer,
            "double" => Self::Double,
            "anyURI" => Self::AnyUri,
            "date" => Self::Date,
            "time" => Self::Time,
            "dateTime" => Self::DateTime,
            _ => return None,
        };
        Some(data_type)
    }

    pub fn uri(&self) -> String {
        match self {
            Self::Other(uri) => uri.clone(),
            known => format!("{XSD}{}", known.short_name().unwrap_or_default()),
        }
    }

    /// Lexical form of a value read from a document: string values are kept
    /// verbatim, other types drop surrounding whitespace.
    pub(crate) fn normalize(&self, raw: String) -> String {
        match self {
            Self::String | Self::Other(_) => raw,
            _ => raw.trim().to_string(),
        }
    }

    pub fn short_name(&self) -> Option<&'static str> {
        match self {
            Self::String => Some("string"),
            Self::Boolean => Some("boolean"),
            Self::Integer => Some("integer"),
            Self::Double => Some("double"),
            Self::AnyUri => Some("anyURI"),
            Self::Date => Some("date"),
            Self::Time => Some("time"),
            Self::DateTime => Some("dateTime"),
            Self::Other(_) => None,
        }
    }
}

impl From<String> for DataType {
    fn from(uri: String) -> Self {
        DataType::from_uri(&uri)
    }
}

impl From<DataType> for String {
    fn from(data_type: DataType) -> Self {
        data_type.uri()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeValue {
    pub data_type: DataType,
    pub value: String,
}

impl AttributeValue {
    pub fn new(data_type: DataType, value: impl Into<String>) -> Self {
        Self {
            data_type,
            value: value.into(),
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(DataType::String, value)
    }

    pub fn boolean(value: bool) -> Self {
        Self::new(DataType::Boolean, value.to_string())
    }

    pub fn integer(value: i64) -> Self {
        Self::new(DataType::Integer, value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    Permit,
    Deny,
}

impl Effect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Effect::Permit => "Permit",
            Effect::Deny => "Deny",
        }
    }

    pub fn decision(&self) -> Decision {
        match self {
            Effect::Permit => Decision::Permit,
            Effect::Deny => Decision::Deny,
        }
    }
}

impl FromStr for Effect {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Permit" => Ok(Effect::Permit),
            "Deny" => Ok(Effect::Deny),
            other => Err(other.to_string()),
        }
    }
}

/// XACML decision vocabulary. The integer codes follow the classic
/// `Result` constants (Permit=0, Deny=1, Indeterminate=2, NotApplicable=3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    Permit,
    Deny,
    Indeterminate,
    NotApplicable,
}

impl Decision {
    pub fn code(&self) -> i32 {
        match self {
            Decision::Permit => 0,
            Decision::Deny => 1,
            Decision::Indeterminate => 2,
            Decision::NotApplicable => 3,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Decision::Permit),
            1 => Some(Decision::Deny),
            2 => Some(Decision::Indeterminate),
            3 => Some(Decision::NotApplicable),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Permit => "Permit",
            Decision::Deny => "Deny",
            Decision::Indeterminate => "Indeterminate",
            Decision::NotApplicable => "NotApplicable",
        }
    }

    pub(crate) fn effect(&self) -> Option<Effect> {
        match self {
            Decision::Permit => Some(Effect::Permit),
            Decision::Deny => Some(Effect::Deny),
            Decision::Indeterminate | Decision::NotApplicable => None,
        }
    }
}

impl FromStr for Decision {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Permit" => Ok(Decision::Permit),
            "Deny" => Ok(Decision::Deny),
            "Indeterminate" => Ok(Decision::Indeterminate),
            "NotApplicable" => Ok(Decision::NotApplicable),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StatusCode {
    Ok,
    MissingAttribute,
    SyntaxError,
    ProcessingError,
    Other(String),
}

const STATUS_PREFIX: &str = "urn:oasis:names:tc:xacml:1.0:status:";

impl StatusCode {
    pub fn from_uri(uri: &str) -> Self {
        match uri.strip_prefix(STATUS_PREFIX) {
            Some("ok") => StatusCode::Ok,
            Some("missing-attribute") => StatusCode::MissingAttribute,
            Some("syntax-error") => StatusCode::SyntaxError,
            Some("processing-error") => StatusCode::ProcessingError,
            _ => StatusCode::Other(uri.to_string()),
        }
    }

    pub fn uri(&self) -> String {
        let suffix = match self {
            StatusCode::Ok => "ok",
            StatusCode::MissingAttribute => "missing-attribute",
            StatusCode::SyntaxError => "syntax-error",
            StatusCode::ProcessingError => "processing-error",
            StatusCode::Other(uri) => return uri.clone(),
        };
        format!("{STATUS_PREFIX}{suffix}")
    }
}

impl From<String> for StatusCode {
    fn from(uri: String) -> Self {
        StatusCode::from_uri(&uri)
    }
}

impl From<StatusCode> for String {
    fn from(code: StatusCode) -> Self {
        code.uri()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeCategory {
    Subject,
    Resource,
    Action,
    Environment,
}

impl AttributeCategory {
    pub const ALL: [AttributeCategory; 4] = [
        AttributeCategory::Subject,
        AttributeCategory::Resource,
        AttributeCategory::Action,
        AttributeCategory::Environment,
    ];

    /// Element name of one attribute group, e.g. `Subject`.
    pub fn entry_name(&self) -> &'static str {
        match self {
            AttributeCategory::Subject => "Subject",
            AttributeCategory::Resource => "Resource",
            AttributeCategory::Action => "Action",
            AttributeCategory::Environment => "Environment",
        }
    }

    pub(crate) fn section_name(&self) -> &'static str {
        match self {
            AttributeCategory::Subject => "Subjects",
            AttributeCategory::Resource => "Resources",
            AttributeCategory::Action => "Actions",
            AttributeCategory::Environment => "Environments",
        }
    }

    pub(crate) fn any_name(&self) -> &'static str {
        match self {
            AttributeCategory::Subject => "AnySubject",
            AttributeCategory::Resource => "AnyResource",
            AttributeCategory::Action => "AnyAction",
            AttributeCategory::Environment => "AnyEnvironment",
        }
    }

    pub(crate) fn match_name(&self) -> &'static str {
        match self {
            AttributeCategory::Subject => "SubjectMatch",
            AttributeCategory::Resource => "ResourceMatch",
            AttributeCategory::Action => "ActionMatch",
            AttributeCategory::Environment => "EnvironmentMatch",
        }
    }

    pub(crate) fn designator_name(&self) -> &'static str {
        match self {
            AttributeCategory::Subject => "SubjectAttributeDesignator",
            AttributeCategory::Resource => "ResourceAttributeDesignator",
            AttributeCategory::Action => "ActionAttributeDesignator",
            AttributeCategory::Environment => "EnvironmentAttributeDesignator",
        }
    }

    pub(crate) fn from_designator_name(name: &str) -> Option<Self> {
        AttributeCategory::ALL
            .into_iter()
            .find(|category| category.designator_name() == name)
    }
}
