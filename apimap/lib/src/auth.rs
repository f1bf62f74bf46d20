use serde::{Deserialize, Serialize};

/// How credentials are attached to outgoing requests.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "name", rename_all = "snake_case")]
pub enum ApiAuthMethod {
    /// `Authorization: Bearer <key>`
    BearerToken,
    /// Key sent in the named header (e.g. `X-API-Key`).
    ApiKey(String),
    /// Key sent as the named query parameter (e.g. `?key=<key>`).
    QueryParam(String),
    #[default]
    None,
}

impl ApiAuthMethod {
    /// Returns `true` if the method needs a credential.
    pub fn needs_key(&self) -> bool {
        !matches!(self, Self::None)
    }
}
