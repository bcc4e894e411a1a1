//! Configuration resolution for map widgets
//!
//! Widget configuration arrives as a loose JSON object edited by page
//! authors. `ConfigResolver` turns it into an immutable [`Settings`] record
//! where every option has an explicit default. Nothing here fails: values of
//! the wrong shape are logged and replaced by their default.

use crate::{
    core::{
        constants::{DEFAULT_LATITUDE, DEFAULT_LONGITUDE, MAX_ZOOM},
        geo::LatLng,
    },
    input::events::flatten_payload,
    layers::marker::{coerce_bool, coerce_f64, MarkerInput},
    tiles::source::TileLayerSpec,
    MapError,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Supported map vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provider {
    GoogleMaps,
    Mapbox,
    HereMaps,
    Leaflet,
}

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::GoogleMaps,
        Provider::Mapbox,
        Provider::HereMaps,
        Provider::Leaflet,
    ];

    /// Prefix of the command topics this vendor's widget listens to
    pub fn namespace(&self) -> &'static str {
        match self {
            Provider::GoogleMaps => "google_maps",
            Provider::Mapbox => "mapbox",
            Provider::HereMaps => "here_maps",
            Provider::Leaflet => "leaflet",
        }
    }

    pub fn default_zoom(&self) -> u8 {
        match self {
            Provider::GoogleMaps | Provider::Leaflet => 13,
            Provider::Mapbox => 15,
            Provider::HereMaps => 10,
        }
    }

    pub fn default_style(&self) -> &'static str {
        match self {
            Provider::GoogleMaps => "roadmap",
            Provider::Mapbox => "streets-v11",
            Provider::HereMaps => "normal",
            Provider::Leaflet => "default",
        }
    }

    /// Whether initialization must fail without an access token / API key
    pub fn requires_credential(&self) -> bool {
        matches!(self, Provider::Mapbox | Provider::HereMaps)
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::GoogleMaps => write!(f, "google-maps"),
            Provider::Mapbox => write!(f, "mapbox"),
            Provider::HereMaps => write!(f, "here-maps"),
            Provider::Leaflet => write!(f, "leaflet"),
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Provider::ALL
            .into_iter()
            .find(|p| p.to_string() == wanted)
            .ok_or_else(|| MapError::Host(format!("unknown map provider '{s}'")))
    }
}

/// Where the base map imagery comes from
#[derive(Debug, Clone, PartialEq)]
pub enum StyleSource {
    /// A vendor style or named tile layer
    Named(String),
    /// A raw tile layer supplied through `customMapTyleLayer`
    Custom(TileLayerSpec),
}

/// Resolved, immutable widget settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub provider: Provider,
    pub credential: Option<String>,
    pub center: LatLng,
    pub zoom: u8,
    pub style: StyleSource,
    pub markers: Vec<MarkerInput>,
    pub show_default_markers: bool,
    /// Draw a "Configured Location" marker at the center on startup.
    /// Set for Google when no marker list is configured.
    pub mark_center: bool,
    pub show_user_location: bool,
    pub script_url: Option<String>,
    pub default_marker_icon: Option<String>,
}

impl Settings {
    /// All defaults for `provider`
    pub fn defaults(provider: Provider) -> Self {
        ConfigResolver::new(provider).resolve(&Map::new())
    }
}

/// Normalizes raw widget configuration into [`Settings`]
#[derive(Debug, Clone, Copy)]
pub struct ConfigResolver {
    provider: Provider,
}

impl ConfigResolver {
    pub fn new(provider: Provider) -> Self {
        Self { provider }
    }

    /// Resolves any JSON value; anything but an object yields the defaults
    pub fn resolve_value(&self, raw: &Value) -> Settings {
        match raw {
            Value::Object(map) => self.resolve(map),
            Value::Null => self.resolve(&Map::new()),
            other => {
                log::warn!("{} configuration is not an object: {}", self.provider, other);
                self.resolve(&Map::new())
            }
        }
    }

    pub fn resolve(&self, raw: &Map<String, Value>) -> Settings {
        let provider = self.provider;
        let reader = Reader { raw, provider };

        let center = LatLng::new(
            reader.number("latitude").unwrap_or(DEFAULT_LATITUDE),
            reader.number("longitude").unwrap_or(DEFAULT_LONGITUDE),
        );

        let zoom = reader
            .number("zoom")
            .map(|z| z.trunc().clamp(0.0, MAX_ZOOM as f64) as u8)
            .unwrap_or_else(|| provider.default_zoom());

        let markers_raw = reader.first(&["markersJSON", "markersJson"]);
        let markers = markers_raw.map(parse_markers).unwrap_or_default();

        Settings {
            provider,
            credential: reader.text(&["accessToken", "apiKey"]),
            center,
            zoom,
            style: self.resolve_style(&reader),
            markers,
            show_default_markers: reader
                .flag(&["showMarker", "showDefaultMarkers"])
                .unwrap_or(true),
            mark_center: provider == Provider::GoogleMaps && markers_raw.is_none(),
            show_user_location: reader.flag(&["showUserLocation"]).unwrap_or(false),
            script_url: reader.text(&["googleMapsScriptURL"]),
            default_marker_icon: reader.text(&["defaultMarkerIconURL"]),
        }
    }

    fn resolve_style(&self, reader: &Reader<'_>) -> StyleSource {
        let name = reader
            .text(&["mapStyle", "mapTileLayer", "tileLayer"])
            .unwrap_or_else(|| self.provider.default_style().to_string());

        if name != "other" {
            return StyleSource::Named(name);
        }

        let custom = reader.text(&["customMapTyleLayer", "customTileLayer"]);
        match custom.as_deref().map(serde_json::from_str::<TileLayerSpec>) {
            Some(Ok(spec)) => StyleSource::Custom(spec),
            Some(Err(e)) => {
                log::warn!("invalid custom tile layer, using default style: {e}");
                StyleSource::Named(self.provider.default_style().to_string())
            }
            None => {
                log::warn!("style 'other' selected without a custom tile layer");
                StyleSource::Named(self.provider.default_style().to_string())
            }
        }
    }
}

struct Reader<'a> {
    raw: &'a Map<String, Value>,
    provider: Provider,
}

impl Reader<'_> {
    fn first(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter()
            .filter_map(|key| self.raw.get(*key))
            .find(|value| !value.is_null())
    }

    fn number(&self, key: &str) -> Option<f64> {
        let value = self.first(&[key])?;
        let number = coerce_f64(value);
        if number.is_none() {
            log::warn!("{} option {key} is not a number: {value}", self.provider);
        }
        number
    }

    fn flag(&self, keys: &[&str]) -> Option<bool> {
        let value = self.first(keys)?;
        let flag = coerce_bool(value);
        if flag.is_none() {
            log::warn!("{} option {} is not a boolean: {value}", self.provider, keys[0]);
        }
        flag
    }

    fn text(&self, keys: &[&str]) -> Option<String> {
        match self.first(keys)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        }
    }
}

/// Parses the JSON-encoded initial marker list. Never fails.
fn parse_markers(raw: &Value) -> Vec<MarkerInput> {
    let parsed = match raw {
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Invalid JSON in markers: {e}");
                return Vec::new();
            }
        },
        // Already decoded by the host
        Value::Array(_) => raw.clone(),
        other => {
            log::warn!("markers must be a JSON string, got {other}");
            return Vec::new();
        }
    };

    if !parsed.is_array() {
        log::warn!("markers JSON is not a list: {parsed}");
        return Vec::new();
    }

    flatten_payload(&parsed)
        .into_iter()
        .filter_map(|value| match MarkerInput::from_value(value) {
            Ok(input) => Some(input),
            Err(e) => {
                log::warn!("skipping configured marker: {e}");
                None
            }
        })
        .collect()
}
