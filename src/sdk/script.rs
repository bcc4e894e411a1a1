use serde::{Deserialize, Serialize};

/// A vendor SDK script and the global it defines once initialized
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScriptAsset {
    pub url: String,
    /// Dotted global path probed for readiness, e.g. `google.maps`
    pub global: String,
}

impl ScriptAsset {
    pub fn new(url: impl Into<String>, global: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            global: global.into(),
        }
    }

    /// Appends `key=value` to the script URL query string
    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        self.url = format!("{}{}{}={}", self.url, separator, key, encode_component(value));
        self
    }
}

/// Percent-encodes everything outside the URL unreserved set
fn encode_component(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}
