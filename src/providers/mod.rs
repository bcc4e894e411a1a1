//! Vendor adapters
//!
//! Every vendor widget does the same four things (draw a marker, clear
//! markers, fit the view, locate the user) against a different SDK. Those
//! operations form the [`ProviderAdapter`] capability set; the variant is
//! picked once, when the surface is built.

pub mod google;
pub mod here;
pub mod host;
pub mod leaflet;
pub mod mapbox;

use crate::{
    core::{
        config::{Provider, Settings},
        geo::LatLngBounds,
        surface::SurfaceState,
    },
    layers::marker::Marker,
    sdk::script::ScriptAsset,
    ui::popup::PopupTracker,
    MapError, Result,
};
use host::{VendorCall, VendorHost};
use serde::{Deserialize, Serialize};

pub use google::GoogleAdapter;
pub use here::HereAdapter;
pub use leaflet::LeafletAdapter;
pub use mapbox::MapboxAdapter;

/// Name under which a drawn marker is bound on the vendor side
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VendorHandle(String);

impl VendorHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub(crate) fn for_marker(marker: &Marker) -> Self {
        Self(marker.id().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of an object attached to this marker (popup, icon, bubble)
    pub(crate) fn part(&self, suffix: &str) -> String {
        format!("{}.{}", self.0, suffix)
    }
}

impl std::fmt::Display for VendorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Translates registry operations into vendor draw calls
pub trait ProviderAdapter: Send {
    fn provider(&self) -> Provider;

    /// The SDK script to inject and the global proving it is ready
    fn script(&self, settings: &Settings) -> ScriptAsset;

    /// Creates the vendor map with the configured center, zoom and style.
    /// Valid once per adapter.
    fn initialize(&mut self, settings: &Settings, host: &mut dyn VendorHost) -> Result<()>;

    /// Draws one marker, flying to it and wiring its popup trigger as asked
    fn place_marker(&mut self, marker: &Marker, host: &mut dyn VendorHost)
        -> Result<VendorHandle>;

    /// Click/tap on a titled marker: shows its popup, closing the open one
    fn open_popup(
        &mut self,
        marker: &Marker,
        handle: &VendorHandle,
        host: &mut dyn VendorHost,
    ) -> Result<()>;

    /// Un-draws every handle and releases its vendor objects
    fn remove_all_markers(
        &mut self,
        handles: &[VendorHandle],
        host: &mut dyn VendorHost,
    ) -> Result<()>;

    /// Moves the view onto `bounds`; zero-area bounds become center + zoom
    fn apply_fit_bounds(&mut self, bounds: &LatLngBounds, host: &mut dyn VendorHost)
        -> Result<()>;

    /// Releases the map and its listeners
    fn teardown(&mut self, host: &mut dyn VendorHost) -> Result<()>;
}

/// Builds the adapter for `provider`
pub fn adapter_for(provider: Provider) -> Box<dyn ProviderAdapter> {
    match provider {
        Provider::GoogleMaps => Box::new(GoogleAdapter::new()),
        Provider::Mapbox => Box::new(MapboxAdapter::new()),
        Provider::HereMaps => Box::new(HereAdapter::new()),
        Provider::Leaflet => Box::new(LeafletAdapter::new()),
    }
}

/// Per-map state every adapter keeps once initialized
#[derive(Debug, Default)]
pub(crate) struct LiveMap {
    /// Zoom used when flying to a marker or fitting a single point
    pub zoom: u8,
    pub popups: PopupTracker,
}

impl LiveMap {
    pub fn new(settings: &Settings) -> Self {
        Self {
            zoom: settings.zoom,
            popups: PopupTracker::new(),
        }
    }
}

/// Rejects a second `initialize`
pub(crate) fn ensure_uninitialized(map: &Option<LiveMap>) -> Result<()> {
    match map {
        Some(_) => Err(MapError::InvalidState {
            operation: "initialize",
            state: SurfaceState::Initialized,
        }),
        None => Ok(()),
    }
}

/// The live map, or `InvalidState` before `initialize`
pub(crate) fn live<'a>(
    map: &'a mut Option<LiveMap>,
    operation: &'static str,
) -> Result<&'a mut LiveMap> {
    map.as_mut().ok_or(MapError::InvalidState {
        operation,
        state: SurfaceState::Uninitialized,
    })
}

/// Issues every call even when some fail, returning the first failure.
/// Used where a half-done release would leave vendor objects unreachable.
pub(crate) fn call_all<I>(host: &mut dyn VendorHost, calls: I) -> Result<()>
where
    I: IntoIterator<Item = VendorCall>,
{
    let mut first = None;
    for call in calls {
        let shown = call.to_string();
        if let Err(e) = host.call(call) {
            log::warn!("vendor call {shown} failed: {e}");
            first.get_or_insert(e);
        }
    }
    first.map_or(Ok(()), Err)
}
