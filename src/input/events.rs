use crate::layers::marker::MarkerInput;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// External command topics, namespaced per provider as `<namespace>:<suffix>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    AddMarker,
    ClearMarkers,
    FitToAllMarkers,
}

impl Topic {
    pub const ALL: [Topic; 3] = [Topic::AddMarker, Topic::ClearMarkers, Topic::FitToAllMarkers];

    pub fn suffix(&self) -> &'static str {
        match self {
            Topic::AddMarker => "add_marker",
            Topic::ClearMarkers => "clear_markers",
            Topic::FitToAllMarkers => "fit_to_all_markers",
        }
    }

    /// Full topic name under `namespace`
    pub fn qualified(&self, namespace: &str) -> String {
        format!("{}:{}", namespace, self.suffix())
    }

    /// Parses a full topic name, `None` when it belongs elsewhere
    pub fn parse(namespace: &str, topic: &str) -> Option<Topic> {
        let (prefix, suffix) = topic.split_once(':')?;
        if prefix != namespace {
            return None;
        }
        Topic::ALL.into_iter().find(|t| t.suffix() == suffix)
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.suffix())
    }
}

/// An event delivered by the host pub/sub runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostEvent {
    pub topic: String,
    #[serde(default)]
    pub payload: Value,
}

impl HostEvent {
    pub fn new(topic: impl Into<String>, payload: Value) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }
}

/// A decoded command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddMarkers(Vec<MarkerInput>),
    ClearMarkers,
    FitToAllMarkers,
}

impl Command {
    /// Decodes the payload for `topic`. Payloads of the other topics are ignored.
    pub fn decode(topic: Topic, payload: &Value) -> Command {
        match topic {
            Topic::AddMarker => Command::AddMarkers(
                flatten_payload(payload)
                    .into_iter()
                    .filter_map(|value| match MarkerInput::from_value(value) {
                        Ok(input) => Some(input),
                        Err(e) => {
                            log::warn!("ignoring marker in add_marker payload: {e}");
                            None
                        }
                    })
                    .collect(),
            ),
            Topic::ClearMarkers => Command::ClearMarkers,
            Topic::FitToAllMarkers => Command::FitToAllMarkers,
        }
    }
}

/// Flattens arbitrarily nested arrays into their leaf values, in order.
/// `null` flattens to nothing; any other scalar or object to itself.
pub fn flatten_payload(value: &Value) -> Vec<&Value> {
    fn walk<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
        match value {
            Value::Array(items) => items.iter().for_each(|item| walk(item, out)),
            Value::Null => {}
            other => out.push(other),
        }
    }

    let mut out = Vec::new();
    walk(value, &mut out);
    out
}
