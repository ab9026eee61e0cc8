//! Request and response contexts exchanged with the decision point.

use crate::error::{MalformedRequestError, XmlError};
use crate::models::{Decision, DecisionResult, Obligation, Request, Response, Status};
use crate::xml::Element;
use std::collections::BTreeMap;
use std::io::{Read, Write};

#[cfg(test)]
mod tests;

/// An authorization request, optionally remembering the document it was read from.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    document: Option<Element>,
    request: Option<Request>,
    properties: BTreeMap<String, String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_request(request: Request) -> Self {
        Self {
            request: Some(request),
            ..Self::default()
        }
    }

    /// Parses a request document. On failure the context is left untouched.
    pub fn read_request<R: Read>(&mut self, source: R) -> Result<(), MalformedRequestError> {
        let root = Element::parse(source).map_err(MalformedRequestError::request)?;
        self.read_request_element(root)
    }

    /// Reads an already parsed `Request` element and keeps it as the document root.
    pub fn read_request_element(&mut self, root: Element) -> Result<(), MalformedRequestError> {
        let request = Request::from_element(&root).map_err(MalformedRequestError::request)?;
        self.request = Some(request);
        self.document = Some(root);
        Ok(())
    }

    /// Installs a programmatically built request; there is no originating document afterwards.
    pub fn set_request(&mut self, request: Request) {
        self.request = Some(request);
        self.document = None;
    }

    pub fn request(&self) -> Option<&Request> {
        self.request.as_ref()
    }

    pub fn document_element(&self) -> Option<&Element> {
        self.document.as_ref()
    }

    pub fn to_element(&self) -> Option<Element> {
        self.request.as_ref().map(Request::to_element)
    }

    /// Writes the structured request as XML. An empty context writes an empty request.
    pub fn marshall<W: Write>(&self, out: W) -> Result<(), XmlError> {
        let element = match &self.request {
            Some(request) => request.to_element(),
            None => Request::new().to_element(),
        };
        element.write_to(out)
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(name.into(), value.into());
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }
}

/// The decision rendered for a request.
#[derive(Debug, Clone)]
pub struct ResponseContext {
    document: Option<Element>,
    result: DecisionResult,
    properties: BTreeMap<String, String>,
}

impl ResponseContext {
    pub fn new(result: DecisionResult) -> Self {
        Self {
            document: None,
            result,
            properties: BTreeMap::new(),
        }
    }

    /// Parses a response document; only its first `Result` is kept.
    pub fn read_response<R: Read>(source: R) -> Result<Self, MalformedRequestError> {
        let root = Element::parse(source).map_err(MalformedRequestError::response)?;
        Self::from_element(root)
    }

    pub fn from_element(root: Element) -> Result<Self, MalformedRequestError> {
        let response = Response::from_element(&root).map_err(MalformedRequestError::response)?;
        let Some(result) = response.results.into_iter().next() else {
            return Err(MalformedRequestError::response(XmlError::missing_element("Result")));
        };
        Ok(Self {
            document: Some(root),
            result,
            properties: BTreeMap::new(),
        })
    }

    pub fn decision(&self) -> Decision {
        self.result.decision
    }

    /// Integer form of [`ResponseContext::decision`].
    pub fn decision_code(&self) -> i32 {
        self.result.decision.code()
    }

    pub fn result(&self) -> &DecisionResult {
        &self.result
    }

    pub fn status(&self) -> &Status {
        &self.result.status
    }

    pub fn obligations(&self) -> &[Obligation] {
        &self.result.obligations
    }

    pub fn document_element(&self) -> Option<&Element> {
        self.document.as_ref()
    }

    pub fn to_element(&self) -> Element {
        Response {
            results: vec![self.result.clone()],
        }
        .to_element()
    }

    pub fn marshall<W: Write>(&self, out: W) -> Result<(), XmlError> {
        self.to_element().write_to(out)
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(name.into(), value.into());
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }
}
