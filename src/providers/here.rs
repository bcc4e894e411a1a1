//! HERE Maps adapter
//!
//! Requires an API key. Popups are info bubbles added to the shared UI, one
//! at a time.

use super::{
    ensure_uninitialized,
    host::{element_ref, object_ref, VendorCall, VendorHost},
    live, LiveMap, ProviderAdapter, VendorHandle,
};
use crate::{
    core::{
        config::{Provider, Settings, StyleSource},
        constants::MARKER_ICON_SIZE,
        geo::{LatLng, LatLngBounds},
    },
    layers::marker::Marker,
    sdk::script::ScriptAsset,
    ui::popup::popup_text,
    MapError, Result,
};
use serde_json::{json, Value};

const SCRIPT_URL: &str = "https://js.api.here.com/v3/3.1/mapsjs.bundle.js";
const CONTAINER_ID: &str = "maps-toolkit-here-map";

fn lat_lng(position: LatLng) -> Value {
    json!({ "lat": position.lat, "lng": position.lng })
}

/// Default layer path for a style name; unknown names use `normal`
fn base_layer(style: &StyleSource) -> &'static str {
    let name = match style {
        StyleSource::Named(name) => name.as_str(),
        StyleSource::Custom(_) => "normal",
    };
    match name {
        "satellite" => "defaultLayers.raster.satellite.map",
        "terrain" => "defaultLayers.raster.terrain.map",
        "standard" => "defaultLayers.vector.normal.map",
        _ => "defaultLayers.raster.normal.map",
    }
}

#[derive(Debug, Default)]
pub struct HereAdapter {
    map: Option<LiveMap>,
    default_icon: Option<String>,
}

impl HereAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProviderAdapter for HereAdapter {
    fn provider(&self) -> Provider {
        Provider::HereMaps
    }

    fn script(&self, _settings: &Settings) -> ScriptAsset {
        ScriptAsset::new(SCRIPT_URL, "H.service")
    }

    fn initialize(&mut self, settings: &Settings, host: &mut dyn VendorHost) -> Result<()> {
        ensure_uninitialized(&self.map)?;
        let api_key = settings
            .credential
            .as_deref()
            .ok_or(MapError::MissingCredential(Provider::HereMaps))?;

        host.call(
            VendorCall::construct("H.service.Platform", vec![json!({ "apikey": api_key })])
                .bind("platform"),
        )?;
        host.call(VendorCall::new("platform", "createDefaultLayers", vec![]).bind("defaultLayers"))?;
        host.call(
            VendorCall::construct(
                "H.Map",
                vec![
                    element_ref(CONTAINER_ID),
                    object_ref(base_layer(&settings.style)),
                    json!({
                        "center": lat_lng(settings.center),
                        "zoom": settings.zoom,
                        "pixelRatio": 1,
                    }),
                ],
            )
            .bind("map"),
        )?;
        host.call(
            VendorCall::new(
                "H.ui.UI",
                "createDefault",
                vec![object_ref("map"), object_ref("defaultLayers")],
            )
            .bind("ui"),
        )?;
        host.call(VendorCall::new("map", "getViewModel", vec![]).bind("viewModel"))?;

        self.default_icon = settings.default_marker_icon.clone();
        self.map = Some(LiveMap::new(settings));
        Ok(())
    }

    fn place_marker(
        &mut self,
        marker: &Marker,
        host: &mut dyn VendorHost,
    ) -> Result<VendorHandle> {
        live(&mut self.map, "place a marker")?;
        let handle = VendorHandle::for_marker(marker);

        let mut options = json!({});
        if let Some(icon) = marker.icon().or(self.default_icon.as_deref()) {
            let icon_name = handle.part("icon");
            host.call(
                VendorCall::construct(
                    "H.map.Icon",
                    vec![
                        json!(icon),
                        json!({
                            "size": { "w": MARKER_ICON_SIZE, "h": MARKER_ICON_SIZE },
                            "anchor": { "x": MARKER_ICON_SIZE / 2, "y": MARKER_ICON_SIZE },
                        }),
                    ],
                )
                .bind(icon_name.as_str()),
            )?;
            options = json!({ "icon": object_ref(&icon_name) });
        }

        host.call(
            VendorCall::construct("H.map.Marker", vec![lat_lng(marker.position()), options])
                .bind(handle.as_str()),
        )?;

        if marker.title().is_some() {
            host.call(VendorCall::new(handle.as_str(), "setData", vec![json!(popup_text(marker))]))?;
            host.call(VendorCall::new(handle.as_str(), "addEventListener", vec![json!("tap")]))?;
        }

        host.call(VendorCall::new("map", "addObject", vec![object_ref(handle.as_str())]))?;

        if marker.fly() {
            host.call(VendorCall::new(
                "map",
                "setCenter",
                vec![lat_lng(marker.position()), json!(true)],
            ))?;
        }

        Ok(handle)
    }

    fn open_popup(
        &mut self,
        marker: &Marker,
        handle: &VendorHandle,
        host: &mut dyn VendorHost,
    ) -> Result<()> {
        let map = live(&mut self.map, "open a popup")?;
        if map.popups.is_open(handle) {
            return Ok(());
        }
        if let Some(previous) = map.popups.open(handle) {
            host.call(VendorCall::new("ui", "removeBubble", vec![object_ref(&previous.part("bubble"))]))?;
        }

        let bubble = handle.part("bubble");
        host.call(
            VendorCall::construct(
                "H.ui.InfoBubble",
                vec![lat_lng(marker.position()), json!({ "content": popup_text(marker) })],
            )
            .bind(bubble.as_str()),
        )?;
        host.call(VendorCall::new("ui", "addBubble", vec![object_ref(&bubble)]))
    }

    fn remove_all_markers(
        &mut self,
        handles: &[VendorHandle],
        host: &mut dyn VendorHost,
    ) -> Result<()> {
        let map = live(&mut self.map, "remove markers")?;
        if let Some(open) = map.popups.current().filter(|open| handles.contains(open)) {
            host.call(VendorCall::new("ui", "removeBubble", vec![object_ref(&open.part("bubble"))]))?;
        }
        map.popups.forget(handles);

        if handles.is_empty() {
            return Ok(());
        }
        let objects: Vec<Value> = handles.iter().map(|h| object_ref(h.as_str())).collect();
        host.call(VendorCall::new("map", "removeObjects", vec![Value::Array(objects)]))
    }

    fn apply_fit_bounds(&mut self, bounds: &LatLngBounds, host: &mut dyn VendorHost) -> Result<()> {
        let map = live(&mut self.map, "fit bounds")?;
        if bounds.is_degenerate() {
            host.call(VendorCall::new("map", "setCenter", vec![lat_lng(bounds.center()), json!(true)]))?;
            return host.call(VendorCall::new("map", "setZoom", vec![json!(map.zoom), json!(true)]));
        }

        // H.geo.Rect(top, left, bottom, right)
        host.call(
            VendorCall::construct(
                "H.geo.Rect",
                vec![
                    json!(bounds.north()),
                    json!(bounds.west()),
                    json!(bounds.south()),
                    json!(bounds.east()),
                ],
            )
            .bind("fitRect"),
        )?;
        host.call(VendorCall::new(
            "viewModel",
            "setLookAtData",
            vec![json!({ "bounds": object_ref("fitRect") }), json!(true)],
        ))
    }

    fn teardown(&mut self, host: &mut dyn VendorHost) -> Result<()> {
        if self.map.take().is_some() {
            host.call(VendorCall::new("map", "dispose", vec![]))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::config::ConfigResolver,
        layers::{manager::MarkerRegistry, marker::MarkerInput},
        providers::host::RecordingHost,
    };

    fn initialized(raw: Value) -> (HereAdapter, RecordingHost) {
        let settings = ConfigResolver::new(Provider::HereMaps).resolve_value(&raw);
        let mut host = RecordingHost::new();
        let mut adapter = HereAdapter::new();
        adapter.initialize(&settings, &mut host).unwrap();
        (adapter, host)
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let settings = Settings::defaults(Provider::HereMaps);
        let mut host = RecordingHost::new();
        assert!(matches!(
            HereAdapter::new().initialize(&settings, &mut host),
            Err(MapError::MissingCredential(Provider::HereMaps))
        ));
    }

    #[test]
    fn test_style_selects_base_layer_and_single_ui() {
        let (_, host) = initialized(json!({"apiKey": "k", "mapStyle": "terrain"}));
        let map = &host.calls_to("H.Map", "new")[0];
        assert_eq!(map.args[1], object_ref("defaultLayers.raster.terrain.map"));
        assert_eq!(host.calls_to("H.ui.UI", "createDefault").len(), 1);
    }

    #[test]
    fn test_default_icon_applies_to_markers_without_one() {
        let (mut adapter, mut host) =
            initialized(json!({"apiKey": "k", "defaultMarkerIconURL": "https://x/pin.svg"}));
        let mut registry = MarkerRegistry::new();
        let marker = registry.add(MarkerInput::at(1.0, 1.0));
        adapter.place_marker(&marker, &mut host).unwrap();

        let icon = &host.calls_to("H.map.Icon", "new")[0];
        assert_eq!(icon.args[0], json!("https://x/pin.svg"));
    }

    #[test]
    fn test_bubbles_replace_each_other_and_clear_with_markers() {
        let (mut adapter, mut host) = initialized(json!({"apiKey": "k"}));
        let mut registry = MarkerRegistry::new();
        let a = registry.add(MarkerInput::at(1.0, 1.0).with_title("A"));
        let b = registry.add(MarkerInput::at(2.0, 2.0).with_title("B"));
        let ha = adapter.place_marker(&a, &mut host).unwrap();
        let hb = adapter.place_marker(&b, &mut host).unwrap();

        adapter.open_popup(&a, &ha, &mut host).unwrap();
        adapter.open_popup(&b, &hb, &mut host).unwrap();
        assert_eq!(host.calls_to("ui", "addBubble").len(), 2);
        assert_eq!(
            host.calls_to("ui", "removeBubble")[0].args[0],
            object_ref("marker-1.bubble")
        );

        adapter.remove_all_markers(&[ha, hb], &mut host).unwrap();
        assert_eq!(host.calls_to("ui", "removeBubble").len(), 2);
        assert_eq!(host.calls_to("map", "removeObjects").len(), 1);
    }

    #[test]
    fn test_fit_bounds_uses_rect() {
        let (mut adapter, mut host) = initialized(json!({"apiKey": "k"}));
        adapter
            .apply_fit_bounds(&LatLngBounds::from_coords(-5.0, -5.0, 20.0, 20.0), &mut host)
            .unwrap();

        let rect = &host.calls_to("H.geo.Rect", "new")[0];
        assert_eq!(rect.args, vec![json!(20.0), json!(-5.0), json!(-5.0), json!(20.0)]);
        assert_eq!(host.calls_to("viewModel", "setLookAtData").len(), 1);
    }
}
