use crate::{core::geo::LatLng, MapError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque marker identifier, assigned once at registration and never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarkerId(u64);

impl MarkerId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for MarkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "marker-{}", self.0)
    }
}

/// How a vendor should draw the marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MarkerKind {
    /// Custom element: the marker icon if any, otherwise a plain dot
    #[default]
    Element,
    /// The vendor's default pin glyph (`type: "pin"`)
    Pin,
}

impl MarkerKind {
    fn from_type(value: Option<&str>) -> Self {
        match value {
            Some(t) if t.eq_ignore_ascii_case("pin") => Self::Pin,
            _ => Self::Element,
        }
    }
}

/// A marker description before registration
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MarkerInput {
    pub position: LatLng,
    pub title: Option<String>,
    pub icon: Option<String>,
    pub fly: bool,
    pub kind: MarkerKind,
}

impl MarkerInput {
    pub fn at(lat: f64, lng: f64) -> Self {
        Self {
            position: LatLng::new(lat, lng),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_fly(mut self, fly: bool) -> Self {
        self.fly = fly;
        self
    }

    pub fn with_kind(mut self, kind: MarkerKind) -> Self {
        self.kind = kind;
        self
    }

    /// Reads a free-form marker object.
    ///
    /// Accepts `latitude`/`longitude` or `lat`/`lng`, numbers or numeric
    /// strings. Missing or unparseable coordinates become `0.0`. Only a
    /// payload that is not an object at all is rejected.
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| MapError::InvalidMarker(format!("expected an object, got {value}")))?;

        let coordinate = |keys: [&str; 2]| -> f64 {
            let raw = keys
                .iter()
                .filter_map(|key| object.get(*key))
                .find(|value| !value.is_null());
            match raw.and_then(coerce_f64) {
                Some(v) => v,
                None => {
                    log::warn!("marker {} is not a number ({:?}), using 0", keys[0], raw);
                    0.0
                }
            }
        };

        let text = |key: &str| -> Option<String> {
            match object.get(key) {
                Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            }
        };

        Ok(Self {
            position: LatLng::new(
                coordinate(["latitude", "lat"]),
                coordinate(["longitude", "lng"]),
            ),
            title: text("title"),
            icon: text("icon"),
            fly: object.get("fly").and_then(coerce_bool).unwrap_or(false),
            kind: MarkerKind::from_type(object.get("type").and_then(Value::as_str)),
        })
    }
}

/// A placed marker. Immutable; moving one is a remove followed by an add.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    id: MarkerId,
    position: LatLng,
    title: Option<String>,
    icon: Option<String>,
    fly: bool,
    kind: MarkerKind,
}

impl Marker {
    pub(crate) fn from_input(id: MarkerId, input: MarkerInput) -> Self {
        Self {
            id,
            position: input.position.sanitized(),
            title: input.title,
            icon: input.icon,
            fly: input.fly,
            kind: input.kind,
        }
    }

    pub fn id(&self) -> MarkerId {
        self.id
    }

    pub fn position(&self) -> LatLng {
        self.position
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    pub fn fly(&self) -> bool {
        self.fly
    }

    pub fn kind(&self) -> MarkerKind {
        self.kind
    }
}

/// Loose numeric reading: numbers, or strings that parse as a finite float.
pub(crate) fn coerce_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Loose boolean reading: booleans, `"true"`/`"false"` strings, or numbers.
pub(crate) fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_f64().map(|v| v != 0.0),
        _ => None,
    }
}
