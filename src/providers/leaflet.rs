//! Leaflet adapter
//!
//! Leaflet needs no credential. Its base layer is a raster tile layer picked
//! from the named table, or the custom JSON layer for style `other`.

use super::{
    call_all, ensure_uninitialized,
    host::{element_ref, object_ref, VendorCall, VendorHost},
    live, LiveMap, ProviderAdapter, VendorHandle,
};
use crate::{
    core::{
        config::{Provider, Settings, StyleSource},
        constants::{FIT_PADDING, MARKER_ICON_SIZE},
        geo::LatLngBounds,
    },
    layers::marker::Marker,
    sdk::script::ScriptAsset,
    tiles::source::named_tile_layer,
    ui::popup::popup_text,
    Result,
};
use serde_json::json;

const SCRIPT_URL: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
const CONTAINER_ID: &str = "maps-toolkit-leaflet-map";

#[derive(Debug, Default)]
pub struct LeafletAdapter {
    map: Option<LiveMap>,
}

impl LeafletAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProviderAdapter for LeafletAdapter {
    fn provider(&self) -> Provider {
        Provider::Leaflet
    }

    fn script(&self, _settings: &Settings) -> ScriptAsset {
        ScriptAsset::new(SCRIPT_URL, "L")
    }

    fn initialize(&mut self, settings: &Settings, host: &mut dyn VendorHost) -> Result<()> {
        ensure_uninitialized(&self.map)?;

        host.call(VendorCall::new("L", "map", vec![element_ref(CONTAINER_ID)]).bind("map"))?;
        host.call(VendorCall::new(
            "map",
            "setView",
            vec![json!(settings.center.to_lat_lng()), json!(settings.zoom)],
        ))?;

        let tiles = match &settings.style {
            StyleSource::Named(name) => named_tile_layer(name),
            StyleSource::Custom(spec) => spec.clone(),
        };
        host.call(
            VendorCall::new("L", "tileLayer", vec![json!(tiles.url), json!(tiles.options)])
                .bind("tileLayer"),
        )?;
        host.call(VendorCall::new("tileLayer", "addTo", vec![object_ref("map")]))?;

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
        let position = json!(marker.position().to_lat_lng());

        let mut options = json!({});
        if let Some(icon) = marker.icon() {
            let icon_name = handle.part("icon");
            host.call(
                VendorCall::new(
                    "L",
                    "icon",
                    vec![json!({
                        "iconUrl": icon,
                        "iconSize": [MARKER_ICON_SIZE, MARKER_ICON_SIZE],
                    })],
                )
                .bind(icon_name.as_str()),
            )?;
            options = json!({ "icon": object_ref(&icon_name) });
        }

        host.call(VendorCall::new("L", "marker", vec![position.clone(), options]).bind(handle.as_str()))?;
        host.call(VendorCall::new(handle.as_str(), "addTo", vec![object_ref("map")]))?;

        if marker.title().is_some() {
            host.call(VendorCall::new(
                handle.as_str(),
                "bindPopup",
                vec![json!(popup_text(marker))],
            ))?;
        }

        if marker.fly() {
            host.call(VendorCall::new("map", "panTo", vec![position]))?;
        }

        Ok(handle)
    }

    fn open_popup(
        &mut self,
        _marker: &Marker,
        handle: &VendorHandle,
        host: &mut dyn VendorHost,
    ) -> Result<()> {
        let map = live(&mut self.map, "open a popup")?;
        if map.popups.is_open(handle) {
            return Ok(());
        }
        if let Some(previous) = map.popups.open(handle) {
            host.call(VendorCall::new(previous.as_str(), "closePopup", vec![]))?;
        }
        host.call(VendorCall::new(handle.as_str(), "openPopup", vec![]))
    }

    fn remove_all_markers(
        &mut self,
        handles: &[VendorHandle],
        host: &mut dyn VendorHost,
    ) -> Result<()> {
        let map = live(&mut self.map, "remove markers")?;
        map.popups.forget(handles);
        call_all(
            host,
            handles
                .iter()
                .map(|h| VendorCall::new("map", "removeLayer", vec![object_ref(h.as_str())])),
        )
    }

    fn apply_fit_bounds(&mut self, bounds: &LatLngBounds, host: &mut dyn VendorHost) -> Result<()> {
        let map = live(&mut self.map, "fit bounds")?;
        if bounds.is_degenerate() {
            return host.call(VendorCall::new(
                "map",
                "setView",
                vec![json!(bounds.center().to_lat_lng()), json!(map.zoom)],
            ));
        }

        host.call(VendorCall::new(
            "map",
            "fitBounds",
            vec![
                json!([
                    bounds.south_west.to_lat_lng(),
                    bounds.north_east.to_lat_lng()
                ]),
                json!({ "padding": [FIT_PADDING, FIT_PADDING] }),
            ],
        ))
    }

    fn teardown(&mut self, host: &mut dyn VendorHost) -> Result<()> {
        if self.map.take().is_some() {
            return call_all(
                host,
                [
                    VendorCall::new("map", "off", vec![]),
                    VendorCall::new("map", "remove", vec![]),
                ],
            );
        }
        Ok(())
    }
}
