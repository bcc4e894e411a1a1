//! Mapbox GL adapter
//!
//! Requires an access token. Markers are DOM elements unless they ask for
//! the stock pin; every titled marker owns its own popup.

use super::{
    call_all, ensure_uninitialized,
    host::{element_ref, object_ref, VendorCall, VendorHost},
    live, LiveMap, ProviderAdapter, VendorHandle,
};
use crate::{
    core::{
        config::{Provider, Settings, StyleSource},
        constants::{
            FIT_PADDING, FLY_CURVE, FLY_SPEED, MARKER_DOT_COLOR, MARKER_DOT_SIZE,
            MARKER_ICON_SIZE, POPUP_OFFSET,
        },
        geo::{LatLng, LatLngBounds},
    },
    layers::marker::{Marker, MarkerKind},
    sdk::script::ScriptAsset,
    ui::popup::popup_text,
    MapError, Result,
};
use serde_json::{json, Value};

const SCRIPT_URL: &str = "https://api.mapbox.com/mapbox-gl-js/v2.15.0/mapbox-gl.js";
const CONTAINER_ID: &str = "maps-toolkit-mapbox-map";

/// `mapbox://` URL for a named style; full URLs pass through
fn style_url(style: &StyleSource) -> String {
    match style {
        StyleSource::Named(name) if name.contains("://") => name.clone(),
        StyleSource::Named(name) => format!("mapbox://styles/mapbox/{name}"),
        StyleSource::Custom(spec) => spec.url.clone(),
    }
}

/// Marker element description, `None` for the stock pin
fn marker_element(marker: &Marker) -> Option<Value> {
    if marker.kind() == MarkerKind::Pin {
        return None;
    }

    let style = match marker.icon() {
        Some(icon) => json!({
            "backgroundImage": format!("url({icon})"),
            "width": format!("{MARKER_ICON_SIZE}px"),
            "height": format!("{MARKER_ICON_SIZE}px"),
            "backgroundSize": "cover",
            "borderRadius": "50%",
        }),
        None => json!({
            "backgroundColor": MARKER_DOT_COLOR,
            "width": format!("{MARKER_DOT_SIZE}px"),
            "height": format!("{MARKER_DOT_SIZE}px"),
            "borderRadius": "50%",
        }),
    };

    Some(json!({ "tag": "div", "className": "mapbox-marker", "style": style }))
}

fn fly_to(center: LatLng, zoom: u8) -> VendorCall {
    VendorCall::new(
        "map",
        "flyTo",
        vec![json!({
            "center": center.to_lng_lat(),
            "zoom": zoom,
            "speed": FLY_SPEED,
            "curve": FLY_CURVE,
        })],
    )
}

#[derive(Debug, Default)]
pub struct MapboxAdapter {
    map: Option<LiveMap>,
}

impl MapboxAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProviderAdapter for MapboxAdapter {
    fn provider(&self) -> Provider {
        Provider::Mapbox
    }

    fn script(&self, _settings: &Settings) -> ScriptAsset {
        ScriptAsset::new(SCRIPT_URL, "mapboxgl")
    }

    fn initialize(&mut self, settings: &Settings, host: &mut dyn VendorHost) -> Result<()> {
        ensure_uninitialized(&self.map)?;
        let token = settings
            .credential
            .as_deref()
            .ok_or(MapError::MissingCredential(Provider::Mapbox))?;

        host.call(VendorCall::assign("mapboxgl", "accessToken", json!(token)))?;
        host.call(
            VendorCall::construct(
                "mapboxgl.Map",
                vec![json!({
                    "container": element_ref(CONTAINER_ID),
                    "style": style_url(&settings.style),
                    "center": settings.center.to_lng_lat(),
                    "zoom": settings.zoom,
                })],
            )
            .bind("map"),
        )?;
        host.call(VendorCall::construct("mapboxgl.NavigationControl", vec![]).bind("navigation"))?;
        host.call(VendorCall::new("map", "addControl", vec![object_ref("navigation")]))?;

        self.map = Some(LiveMap::new(settings));
        Ok(())
    }

    fn place_marker(
        &mut self,
        marker: &Marker,
        host: &mut dyn VendorHost,
    ) -> Result<VendorHandle> {
        let map = live(&mut self.map, "place a marker")?;
        let handle = VendorHandle::for_marker(marker);

        let args = marker_element(marker).into_iter().collect();
        host.call(VendorCall::construct("mapboxgl.Marker", args).bind(handle.as_str()))?;
        host.call(VendorCall::new(
            handle.as_str(),
            "setLngLat",
            vec![json!(marker.position().to_lng_lat())],
        ))?;
        host.call(VendorCall::new(handle.as_str(), "addTo", vec![object_ref("map")]))?;

        if marker.fly() {
            host.call(fly_to(marker.position(), map.zoom))?;
        }

        if marker.title().is_some() {
            let popup = handle.part("popup");
            host.call(
                VendorCall::construct("mapboxgl.Popup", vec![json!({ "offset": POPUP_OFFSET })])
                    .bind(popup.as_str()),
            )?;
            host.call(VendorCall::new(popup.as_str(), "setText", vec![json!(popup_text(marker))]))?;
            host.call(VendorCall::new(handle.as_str(), "setPopup", vec![object_ref(&popup)]))?;
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
            host.call(VendorCall::new(previous.part("popup"), "remove", vec![]))?;
        }
        host.call(VendorCall::new(handle.part("popup"), "addTo", vec![object_ref("map")]))
    }

    fn remove_all_markers(
        &mut self,
        handles: &[VendorHandle],
        host: &mut dyn VendorHost,
    ) -> Result<()> {
        let map = live(&mut self.map, "remove markers")?;
        map.popups.forget(handles);
        // Removing a marker also detaches its popup
        call_all(
            host,
            handles
                .iter()
                .map(|h| VendorCall::new(h.as_str(), "remove", vec![])),
        )
    }

    fn apply_fit_bounds(&mut self, bounds: &LatLngBounds, host: &mut dyn VendorHost) -> Result<()> {
        let map = live(&mut self.map, "fit bounds")?;
        if bounds.is_degenerate() {
            return host.call(fly_to(bounds.center(), map.zoom));
        }

        host.call(VendorCall::new(
            "map",
            "fitBounds",
            vec![
                json!([
                    bounds.south_west.to_lng_lat(),
                    bounds.north_east.to_lng_lat()
                ]),
                json!({ "padding": FIT_PADDING }),
            ],
        ))
    }

    fn teardown(&mut self, host: &mut dyn VendorHost) -> Result<()> {
        if self.map.take().is_some() {
            host.call(VendorCall::new("map", "remove", vec![]))?;
        }
        Ok(())
    }
}
