//! Per-request routing input.
//!
//! # Responsibilities
//! - Carry the resolved lookup path and HTTP verb
//! - Expose submitted parameters (zero, one or many values per name)
//! - Build descriptors from live axum requests
//!
//! # Design Decisions
//! - A parameter submitted with an empty value is present, not absent
//! - Query strings are decoded with `url::form_urlencoded`
//! - Descriptors are owned per call; nothing here is shared between requests

use std::collections::HashMap;

use axum::http::{Method, Request, Uri};

/// Submitted request parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    values: HashMap<String, Vec<String>>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode an `application/x-www-form-urlencoded` query string.
    pub fn from_query(query: &str) -> Self {
        let mut params = Self::new();
        for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params.insert(name.into_owned(), value.into_owned());
        }
        params
    }

    /// Append a value, keeping earlier values for the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.entry(name.into()).or_default().push(value.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// All values for `name`; `None` when the parameter was not submitted.
    pub fn values(&self, name: &str) -> Option<&[String]> {
        self.values.get(name).map(Vec::as_slice)
    }

    /// First value for `name`, as a servlet `getParameter` would return it.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.values(name).and_then(|values| values.first()).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Everything the route resolver needs to know about one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    lookup_path: String,
    method: Method,
    params: RequestParams,
}

impl RequestDescriptor {
    pub fn new(lookup_path: impl Into<String>, method: Method) -> Self {
        Self {
            lookup_path: lookup_path.into(),
            method,
            params: RequestParams::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name, value);
        self
    }

    pub fn with_params(mut self, params: RequestParams) -> Self {
        self.params = params;
        self
    }

    /// Build from a URI; the query string becomes the parameter set.
    pub fn from_uri(method: Method, uri: &Uri) -> Self {
        let params = uri.query().map(RequestParams::from_query).unwrap_or_default();
        Self::new(uri.path(), method).with_params(params)
    }

    pub fn from_request<B>(request: &Request<B>) -> Self {
        Self::from_uri(request.method().clone(), request.uri())
    }

    pub fn lookup_path(&self) -> &str {
        &self.lookup_path
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn params(&self) -> &RequestParams {
        &self.params
    }
}
