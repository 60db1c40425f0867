//! HTTP verb ordering and binding option keys
//!
//! Maps HTTP verbs, parameter locations and media types to the `api.*`
//! options that record how a method or field binds to the wire.

use crate::openapi::{Operation, PathItem};
use std::fmt;

/// HTTP verbs in the order operations of one path are visited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpVerb {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpVerb {
    pub const ALL: [HttpVerb; 8] = [
        HttpVerb::Get,
        HttpVerb::Put,
        HttpVerb::Post,
        HttpVerb::Delete,
        HttpVerb::Options,
        HttpVerb::Head,
        HttpVerb::Patch,
        HttpVerb::Trace,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HttpVerb::Get => "get",
            HttpVerb::Put => "put",
            HttpVerb::Post => "post",
            HttpVerb::Delete => "delete",
            HttpVerb::Options => "options",
            HttpVerb::Head => "head",
            HttpVerb::Patch => "patch",
            HttpVerb::Trace => "trace",
        }
    }

    /// Verb with a leading capital, used in synthesized method names
    pub fn title(self) -> String {
        openapi2idl_common::naming::upper_first(self.as_str())
    }

    /// Method option key, e.g. `api.get`
    pub fn option_key(self) -> String {
        format!("api.{}", self.as_str())
    }

    pub fn operation(self, item: &PathItem) -> Option<&Operation> {
        match self {
            HttpVerb::Get => item.get.as_ref(),
            HttpVerb::Put => item.put.as_ref(),
            HttpVerb::Post => item.post.as_ref(),
            HttpVerb::Delete => item.delete.as_ref(),
            HttpVerb::Options => item.options.as_ref(),
            HttpVerb::Head => item.head.as_ref(),
            HttpVerb::Patch => item.patch.as_ref(),
            HttpVerb::Trace => item.trace.as_ref(),
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

/// Operations of a path item, in visiting order
///
/// # Examples
/// ```
/// use openapi2idl_parser::openapi::{Operation, PathItem};
/// use openapi2idl_parser::{operations, HttpVerb};
///
/// let item = PathItem {
///     post: Some(Operation::default()),
///     get: Some(Operation::default()),
///     ..Default::default()
/// };
/// let verbs: Vec<HttpVerb> = operations(&item).map(|(verb, _)| verb).collect();
/// assert_eq!(verbs, vec![HttpVerb::Get, HttpVerb::Post]);
/// ```
pub fn operations(item: &PathItem) -> impl Iterator<Item = (HttpVerb, &Operation)> {
    HttpVerb::ALL
        .into_iter()
        .filter_map(move |verb| verb.operation(item).map(|op| (verb, op)))
}

/// Field option key for a parameter location, e.g. `api.query`
pub fn parameter_option_key(location: &str) -> String {
    format!("api.{}", location)
}

/// Field option key for a request body media type
///
/// JSON bodies bind as `api.body`, form encodings as `api.form`; other media
/// types carry no binding.
pub fn body_option_key(media_type: &str) -> Option<&'static str> {
    match media_type {
        "application/json" => Some("api.body"),
        "application/x-www-form-urlencoded" | "multipart/form-data" => Some("api.form"),
        _ => None,
    }
}

/// Field option key for a response media type
pub fn response_option_key(media_type: &str) -> Option<&'static str> {
    match media_type {
        "application/json" => Some("api.body"),
        _ => None,
    }
}

/// Field option key for response headers
pub const HEADER_OPTION: &str = "api.header";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verb_option_keys() {
        assert_eq!(HttpVerb::Get.option_key(), "api.get");
        assert_eq!(HttpVerb::Delete.option_key(), "api.delete");
        assert_eq!(HttpVerb::Patch.title(), "Patch");
        assert_eq!(HttpVerb::Head.to_string(), "HEAD");
    }

    #[test]
    fn test_operations_follow_fixed_verb_order() {
        let item = PathItem {
            patch: Some(Operation::default()),
            delete: Some(Operation::default()),
            put: Some(Operation::default()),
            ..Default::default()
        };
        let verbs: Vec<HttpVerb> = operations(&item).map(|(verb, _)| verb).collect();
        assert_eq!(verbs, vec![HttpVerb::Put, HttpVerb::Delete, HttpVerb::Patch]);
    }

    #[test]
    fn test_media_bindings() {
        assert_eq!(body_option_key("application/json"), Some("api.body"));
        assert_eq!(body_option_key("multipart/form-data"), Some("api.form"));
        assert_eq!(body_option_key("application/x-www-form-urlencoded"), Some("api.form"));
        assert_eq!(body_option_key("text/plain"), None);
        assert_eq!(response_option_key("application/xml"), None);
    }

    #[test]
    fn test_parameter_option_key() {
        assert_eq!(parameter_option_key("query"), "api.query");
        assert_eq!(parameter_option_key("path"), "api.path");
        assert_eq!(parameter_option_key("cookie"), "api.cookie");
    }
}
