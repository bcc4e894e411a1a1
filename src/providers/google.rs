//! Google Maps adapter
//!
//! The API key is optional: when present it is appended to the script URL.
//! A single shared info window shows marker popups.

use super::{
    call_all, ensure_uninitialized,
    host::{element_ref, object_ref, VendorCall, VendorHost},
    live, LiveMap, ProviderAdapter, VendorHandle,
};
use crate::{
    core::{
        config::{Provider, Settings},
        constants::FIT_PADDING,
        geo::{LatLng, LatLngBounds},
    },
    layers::marker::{Marker, MarkerKind},
    sdk::script::ScriptAsset,
    ui::popup::popup_text,
    Result,
};
use serde_json::{json, Value};

const DEFAULT_SCRIPT_URL: &str = "https://maps.googleapis.com/maps/api/js";
const CONTAINER_ID: &str = "maps-toolkit-google-maps";
const INFO_WINDOW: &str = "infoWindow";

fn lat_lng(position: LatLng) -> Value {
    json!({ "lat": position.lat, "lng": position.lng })
}

#[derive(Debug, Default)]
pub struct GoogleAdapter {
    map: Option<LiveMap>,
}

impl GoogleAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProviderAdapter for GoogleAdapter {
    fn provider(&self) -> Provider {
        Provider::GoogleMaps
    }

    fn script(&self, settings: &Settings) -> ScriptAsset {
        let url = settings.script_url.as_deref().unwrap_or(DEFAULT_SCRIPT_URL);
        let asset = ScriptAsset::new(url, "google.maps");
        match &settings.credential {
            Some(key) => asset.with_query("key", key),
            None => asset,
        }
    }

    fn initialize(&mut self, settings: &Settings, host: &mut dyn VendorHost) -> Result<()> {
        ensure_uninitialized(&self.map)?;

        host.call(
            VendorCall::construct(
                "google.maps.Map",
                vec![
                    element_ref(CONTAINER_ID),
                    json!({ "center": lat_lng(settings.center), "zoom": settings.zoom }),
                ],
            )
            .bind("map"),
        )?;
        host.call(VendorCall::construct("google.maps.InfoWindow", vec![json!({})]).bind(INFO_WINDOW))?;

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

        let mut options = json!({
            "position": lat_lng(marker.position()),
            "map": object_ref("map"),
        });
        if let Some(title) = marker.title() {
            options["title"] = json!(title);
        }
        // Pins keep the stock glyph
        if let (Some(icon), MarkerKind::Element) = (marker.icon(), marker.kind()) {
            options["icon"] = json!(icon);
        }

        host.call(VendorCall::construct("google.maps.Marker", vec![options]).bind(handle.as_str()))?;

        if marker.title().is_some() {
            host.call(VendorCall::new(handle.as_str(), "addListener", vec![json!("click")]))?;
        }

        if marker.fly() {
            host.call(VendorCall::new("map", "panTo", vec![lat_lng(marker.position())]))?;
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
        if map.popups.open(handle).is_some() {
            host.call(VendorCall::new(INFO_WINDOW, "close", vec![]))?;
        }
        host.call(VendorCall::new(INFO_WINDOW, "setContent", vec![json!(popup_text(marker))]))?;
        host.call(VendorCall::new(
            INFO_WINDOW,
            "open",
            vec![object_ref("map"), object_ref(handle.as_str())],
        ))
    }

    fn remove_all_markers(
        &mut self,
        handles: &[VendorHandle],
        host: &mut dyn VendorHost,
    ) -> Result<()> {
        let map = live(&mut self.map, "remove markers")?;
        if map.popups.current().is_some_and(|open| handles.contains(open)) {
            host.call(VendorCall::new(INFO_WINDOW, "close", vec![]))?;
        }
        map.popups.forget(handles);

        call_all(
            host,
            handles
                .iter()
                .map(|h| VendorCall::new(h.as_str(), "setMap", vec![Value::Null])),
        )
    }

    fn apply_fit_bounds(&mut self, bounds: &LatLngBounds, host: &mut dyn VendorHost) -> Result<()> {
        let map = live(&mut self.map, "fit bounds")?;
        if bounds.is_degenerate() {
            host.call(VendorCall::new("map", "setCenter", vec![lat_lng(bounds.center())]))?;
            return host.call(VendorCall::new("map", "setZoom", vec![json!(map.zoom)]));
        }

        host.call(VendorCall::new(
            "map",
            "fitBounds",
            vec![
                json!({
                    "south": bounds.south(),
                    "west": bounds.west(),
                    "north": bounds.north(),
                    "east": bounds.east(),
                }),
                json!(FIT_PADDING),
            ],
        ))
    }

    fn teardown(&mut self, host: &mut dyn VendorHost) -> Result<()> {
        if self.map.take().is_some() {
            return call_all(
                host,
                [
                    VendorCall::new(INFO_WINDOW, "close", vec![]),
                    VendorCall::new(
                        "google.maps.event",
                        "clearInstanceListeners",
                        vec![object_ref("map")],
                    ),
                ],
            );
        }
        Ok(())
    }
}
