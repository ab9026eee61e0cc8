use crate::policy::PolicyKind;
use std::fmt;

/// Location of a structural problem inside an XML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementPath {
    pub element: String,
    pub attribute: Option<String>,
}

impl ElementPath {
    pub(crate) fn element(element: &str) -> Self {
        Self {
            element: element.to_string(),
            attribute: None,
        }
    }

    pub(crate) fn attribute(element: &str, attribute: &str) -> Self {
        Self {
            element: element.to_string(),
            attribute: Some(attribute.to_string()),
        }
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attribute {
            Some(attribute) => write!(f, "{}@{}", self.element, attribute),
            None => write!(f, "{}", self.element),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    #[error("xml syntax error: {0}")]
    Syntax(#[from] quick_xml::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid utf-8 in document: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("document has no root element")]
    EmptyDocument,
    #[error("unbalanced closing tag: {0}")]
    UnbalancedTag(String),
    #[error("unexpected element {found}, expected {expected}")]
    UnexpectedElement { expected: String, found: String },
    #[error("missing mandatory {0}")]
    Missing(ElementPath),
    #[error("invalid value for {path}: {value}")]
    InvalidValue { path: ElementPath, value: String },
}

impl XmlError {
    pub(crate) fn unexpected(expected: &str, found: &str) -> Self {
        XmlError::UnexpectedElement {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub(crate) fn missing_attribute(element: &str, attribute: &str) -> Self {
        XmlError::Missing(ElementPath::attribute(element, attribute))
    }

    pub(crate) fn missing_element(element: &str) -> Self {
        XmlError::Missing(ElementPath::element(element))
    }

    pub(crate) fn invalid(path: ElementPath, value: impl Into<String>) -> Self {
        XmlError::InvalidValue {
            path,
            value: value.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    #[error("unable to read policy source: {0}")]
    Io(#[from] std::io::Error),
    #[error("unable to parse policy document: {0}")]
    Parse(#[from] XmlError),
    #[error("expected a {expected} document, found {found}")]
    KindMismatch {
        expected: PolicyKind,
        found: PolicyKind,
    },
    #[error("policy builder failed: {message}")]
    Builder {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

#[derive(Debug, thiserror::Error)]
#[error("malformed {document} document: {source}")]
pub struct MalformedRequestError {
    pub document: &'static str,
    #[source]
    pub source: XmlError,
}

impl MalformedRequestError {
    pub(crate) fn request(source: impl Into<XmlError>) -> Self {
        Self {
            document: "request",
            source: source.into(),
        }
    }

    pub(crate) fn response(source: impl Into<XmlError>) -> Self {
        Self {
            document: "response",
            source: source.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EvaluateError {
    #[error("request context carries no request")]
    MissingRequest,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unable to read configuration {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unable to load policy {path}: {source}")]
    Policy {
        path: String,
        #[source]
        source: FactoryError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Xml(#[from] XmlError),
    #[error(transparent)]
    Factory(#[from] FactoryError),
    #[error(transparent)]
    MalformedRequest(#[from] MalformedRequestError),
    #[error(transparent)]
    Evaluate(#[from] EvaluateError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
