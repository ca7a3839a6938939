//! Block rule construction.

use serde::{Deserialize, Serialize};
use url::Url;

/// Resource classes a block rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// Top-level document navigation.
    MainFrame,
    /// Sub-frame (iframe) navigation.
    SubFrame,
    /// Script loads.
    Script,
    /// XHR/fetch requests.
    XmlHttpRequest,
}

/// Scope every dynamic block rule covers.
pub const BLOCKED_RESOURCE_TYPES: [ResourceType; 4] = [
    ResourceType::MainFrame,
    ResourceType::SubFrame,
    ResourceType::XmlHttpRequest,
    ResourceType::Script,
];

/// A standing instruction to the enforcement substrate to refuse requests
/// matching `url_filter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRule {
    /// Unique within the process; never reused.
    pub id: u32,
    pub priority: u32,
    /// `scheme://host/path`, query and fragment discarded.
    pub url_filter: String,
    pub resource_types: Vec<ResourceType>,
}

/// Reduce a URL to its `scheme://host/path` filter form.
///
/// Two URLs differing only in query string or fragment collapse to the same
/// filter. A URL that does not parse is used verbatim.
pub fn url_to_filter(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return url.to_string();
    };
    let Some(host) = parsed.host_str() else {
        return url.to_string();
    };

    match parsed.port() {
        Some(port) => format!("{}://{}:{}{}", parsed.scheme(), host, port, parsed.path()),
        None => format!("{}://{}{}", parsed.scheme(), host, parsed.path()),
    }
}
