use fxhash::FxHashMap as HashMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// A raster tile layer: URL template plus vendor options (attribution, zoom range…)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileLayerSpec {
    pub url: String,
    #[serde(default)]
    pub options: Map<String, Value>,
}

impl TileLayerSpec {
    fn new(url: &str, options: Value) -> Self {
        Self {
            url: url.to_string(),
            options: options.as_object().cloned().unwrap_or_default(),
        }
    }
}

const OSM_ATTRIBUTION: &str = "&copy; OpenStreetMap contributors";
const STADIA_ATTRIBUTION: &str =
    "&copy; Stadia Maps &copy; OpenMapTiles &copy; OpenStreetMap contributors";

/// Named tile layers selectable through `mapTileLayer`
static TILE_LAYERS: Lazy<HashMap<&'static str, TileLayerSpec>> = Lazy::new(|| {
    let mut layers = HashMap::default();
    layers.insert(
        "default",
        TileLayerSpec::new(
            "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
            json!({ "attribution": OSM_ATTRIBUTION }),
        ),
    );
    layers.insert(
        "cartodb.light_all",
        TileLayerSpec::new(
            "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png",
            json!({ "attribution": "&copy; CartoDB, OpenStreetMap contributors" }),
        ),
    );
    layers.insert(
        "stadia.alidadesatellite",
        TileLayerSpec::new(
            "https://tiles.stadiamaps.com/tiles/alidade_satellite/{z}/{x}/{y}{r}.{ext}",
            json!({
                "minZoom": 0,
                "maxZoom": 20,
                "attribution": format!("&copy; CNES, Distribution Airbus DS | {STADIA_ATTRIBUTION}"),
                "ext": "jpg"
            }),
        ),
    );
    for (name, path) in [
        ("stadia.alidadesmooth", "alidade_smooth"),
        ("stadia.outdoors", "outdoors"),
    ] {
        layers.insert(
            name,
            TileLayerSpec::new(
                &format!("https://tiles.stadiamaps.com/tiles/{path}/{{z}}/{{x}}/{{y}}{{r}}.{{ext}}"),
                json!({ "minZoom": 0, "maxZoom": 20, "attribution": STADIA_ATTRIBUTION, "ext": "png" }),
            ),
        );
    }
    layers
});

/// Looks up a named tile layer, falling back to OpenStreetMap
pub fn named_tile_layer(name: &str) -> TileLayerSpec {
    match TILE_LAYERS.get(name) {
        Some(spec) => spec.clone(),
        None => {
            if name != "default" {
                log::debug!("unknown tile layer '{name}', using default");
            }
            TILE_LAYERS["default"].clone()
        }
    }
}
