//! Methods an endpoint can be registered with.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// The verb of a registered endpoint.
///
/// Besides naming the request verb, the method decides where the non-path
/// parameters of a call travel and whether a success may be served from the
/// response cache later.
///
/// ```rust
/// use apimap_lib::RestMethod;
///
/// let create: RestMethod = "post".parse().unwrap();
/// assert_eq!(create, RestMethod::Post);
/// assert!(create.has_body());
/// assert!(!create.is_cacheable());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum RestMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl RestMethod {
    /// Returns `true` when leftover parameters form a JSON body.
    ///
    /// GET and DELETE put them in the query string instead.
    pub fn has_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }

    /// Only GET results are stored in the response cache.
    pub fn is_cacheable(&self) -> bool {
        *self == Self::Get
    }

    pub(crate) fn as_http(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_leftover_params_route_by_method() {
        let with_body: Vec<_> = RestMethod::iter().filter(RestMethod::has_body).collect();
        assert_eq!(with_body, vec![RestMethod::Post, RestMethod::Put, RestMethod::Patch]);
    }

    #[test]
    fn test_only_get_is_cacheable() {
        let cacheable: Vec<_> = RestMethod::iter().filter(RestMethod::is_cacheable).collect();
        assert_eq!(cacheable, vec![RestMethod::Get]);
    }

    #[test]
    fn test_definitions_spelling() {
        assert_eq!("delete".parse::<RestMethod>().unwrap(), RestMethod::Delete);
        assert!("OPTIONS".parse::<RestMethod>().is_err());

        let row: Vec<RestMethod> = serde_json::from_str(r#"["GET", "PATCH"]"#).unwrap();
        assert_eq!(row, vec![RestMethod::Get, RestMethod::Patch]);
        assert!(serde_json::from_str::<RestMethod>(r#""get""#).is_err());
        assert_eq!(RestMethod::Put.to_string(), "PUT");
    }

    #[test]
    fn test_as_http() {
        let names: Vec<String> = RestMethod::iter().map(|m| m.as_http().to_string()).collect();
        let display: Vec<String> = RestMethod::iter().map(|m| m.to_string()).collect();
        assert_eq!(names, display);
    }
}
