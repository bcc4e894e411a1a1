//! The live map surface
//!
//! A [`MapSurface`] owns the resolved settings, the vendor adapter and its
//! host, and the marker registry. Every registry mutation is mirrored onto
//! the vendor map through the adapter, so the map never shows a marker the
//! registry does not know about.

use crate::{
    core::{
        bounds::BoundsCalculator,
        config::{Provider, Settings},
        constants::{CONFIGURED_LOCATION_TITLE, USER_LOCATION_TITLE},
        geo::LatLngBounds,
    },
    layers::{
        manager::MarkerRegistry,
        marker::{Marker, MarkerId, MarkerInput},
    },
    providers::{host::VendorHost, ProviderAdapter, VendorHandle},
    runtime::Scheduler,
    sdk::loader::{Ready, ScriptLoader},
    traits::Geolocator,
    MapError, Result,
};
use fxhash::FxHashMap as HashMap;
use serde::{Deserialize, Serialize};

/// Lifecycle of a surface. `Failed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceState {
    Uninitialized,
    Loading,
    Ready,
    Initialized,
    Listening,
    Failed,
}

impl SurfaceState {
    pub fn is_failed(&self) -> bool {
        matches!(self, SurfaceState::Failed)
    }

    /// The vendor map exists and accepts marker operations
    pub fn is_live(&self) -> bool {
        matches!(self, SurfaceState::Initialized | SurfaceState::Listening)
    }
}

impl std::fmt::Display for SurfaceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SurfaceState::Uninitialized => "uninitialized",
            SurfaceState::Loading => "loading",
            SurfaceState::Ready => "ready",
            SurfaceState::Initialized => "initialized",
            SurfaceState::Listening => "listening",
            SurfaceState::Failed => "failed",
        };
        f.write_str(name)
    }
}

pub struct MapSurface {
    settings: Settings,
    state: SurfaceState,
    adapter: Box<dyn ProviderAdapter>,
    host: Box<dyn VendorHost>,
    registry: MarkerRegistry,
    handles: HashMap<MarkerId, VendorHandle>,
    failure: Option<String>,
}

impl MapSurface {
    pub fn new(
        settings: Settings,
        adapter: Box<dyn ProviderAdapter>,
        host: Box<dyn VendorHost>,
    ) -> Self {
        Self {
            settings,
            state: SurfaceState::Uninitialized,
            adapter,
            host,
            registry: MarkerRegistry::new(),
            handles: HashMap::default(),
            failure: None,
        }
    }

    pub fn provider(&self) -> Provider {
        self.adapter.provider()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn registry(&self) -> &MarkerRegistry {
        &self.registry
    }

    /// Vendor handle of a drawn marker
    pub fn handle(&self, id: MarkerId) -> Option<&VendorHandle> {
        self.handles.get(&id)
    }

    /// Why the surface failed, once it has
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Injects the vendor SDK and waits until it is usable.
    ///
    /// A missing required credential or an exhausted probe budget leaves the
    /// surface `Failed`.
    pub async fn load<S: Scheduler>(&mut self, loader: &ScriptLoader<S>) -> Result<Ready> {
        self.expect_state("load", SurfaceState::Uninitialized)?;
        self.state = SurfaceState::Loading;

        let provider = self.provider();
        if provider.requires_credential() && self.settings.credential.is_none() {
            return Err(self.fail(MapError::MissingCredential(provider)));
        }

        let asset = self.adapter.script(&self.settings);
        match loader.load(&asset, self.host.as_mut()).await {
            Ok(ready) => {
                log::debug!("{} SDK ready after {} probes", provider, ready.probes);
                self.state = SurfaceState::Ready;
                Ok(ready)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Creates the vendor map and draws the configured markers when asked to
    pub fn initialize(&mut self) -> Result<()> {
        self.expect_state("initialize", SurfaceState::Ready)?;

        if let Err(e) = self.adapter.initialize(&self.settings, self.host.as_mut()) {
            return Err(self.fail(e));
        }
        self.state = SurfaceState::Initialized;

        if self.settings.show_default_markers {
            let mut initial = Vec::with_capacity(self.settings.markers.len() + 1);
            if self.settings.mark_center {
                let center = self.settings.center;
                initial.push(
                    MarkerInput::at(center.lat, center.lng).with_title(CONFIGURED_LOCATION_TITLE),
                );
            }
            initial.extend(self.settings.markers.iter().cloned());
            log::debug!("drawing {} configured markers", initial.len());
            for input in initial {
                self.add_marker(input)?;
            }
        }
        Ok(())
    }

    /// Marks the surface as driven by a command bus
    pub fn mark_listening(&mut self) -> Result<()> {
        self.expect_state("listen", SurfaceState::Initialized)?;
        self.state = SurfaceState::Listening;
        Ok(())
    }

    /// Back to `Initialized` once the bus is detached
    pub fn stop_listening(&mut self) {
        if self.state == SurfaceState::Listening {
            self.state = SurfaceState::Initialized;
        }
    }

    /// Registers `input` and draws it.
    ///
    /// The marker stays registered, with its handle, even if the vendor draw
    /// fails partway, so a later clear still un-draws whatever was drawn.
    pub fn add_marker(&mut self, input: MarkerInput) -> Result<Marker> {
        self.expect_live("add a marker")?;

        let marker = self.registry.add(input);
        self.handles
            .insert(marker.id(), VendorHandle::for_marker(&marker));

        match self.adapter.place_marker(&marker, self.host.as_mut()) {
            Ok(handle) => {
                log::debug!("placed {} at {:?}", marker.id(), marker.position());
                self.handles.insert(marker.id(), handle);
                Ok(marker)
            }
            Err(e) => {
                log::warn!("drawing {} failed: {}", marker.id(), e);
                Err(e)
            }
        }
    }

    /// Un-draws everything, then empties the registry. Returns how many
    /// markers were removed.
    ///
    /// When the vendor refuses a removal the registry and handles are kept,
    /// so the clear can be retried.
    pub fn clear_markers(&mut self) -> Result<usize> {
        self.expect_live("clear markers")?;

        let handles: Vec<VendorHandle> = self
            .registry
            .list()
            .filter_map(|marker| self.handles.get(&marker.id()).cloned())
            .collect();

        if !handles.is_empty() {
            self.adapter
                .remove_all_markers(&handles, self.host.as_mut())?;
        }

        let removed = self.registry.remove_all();
        for id in &removed {
            self.handles.remove(id);
        }
        log::debug!("cleared {} markers", removed.len());
        Ok(removed.len())
    }

    /// Fits the view to every registered marker.
    ///
    /// An empty registry is a no-op and yields `None`.
    pub fn fit_to_all_markers(&mut self) -> Result<Option<LatLngBounds>> {
        self.expect_live("fit to markers")?;

        match BoundsCalculator::fit_bounds(self.registry.list()) {
            Ok(bounds) => {
                self.adapter.apply_fit_bounds(&bounds, self.host.as_mut())?;
                Ok(Some(bounds))
            }
            Err(MapError::EmptyRegistry) => {
                log::debug!("fit requested with no markers, ignoring");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Click or tap on a marker. Untitled markers have no popup.
    pub fn click_marker(&mut self, id: MarkerId) -> Result<()> {
        self.expect_live("open a popup")?;

        let marker = self
            .registry
            .get(id)
            .ok_or_else(|| MapError::InvalidMarker(format!("no marker {id}")))?;
        if marker.title().is_none() {
            return Ok(());
        }
        let handle = self
            .handles
            .get(&id)
            .ok_or_else(|| MapError::InvalidMarker(format!("{id} was never drawn")))?;

        self.adapter.open_popup(marker, handle, self.host.as_mut())
    }

    /// Asks for the user's position once and drops a flying "My Location"
    /// marker there. Denial goes to `on_denied` and leaves the map usable.
    pub async fn locate_user<F>(
        &mut self,
        geolocator: &dyn Geolocator,
        on_denied: F,
    ) -> Result<Option<Marker>>
    where
        F: FnOnce(&MapError),
    {
        self.expect_live("locate the user")?;

        match geolocator.current_position().await {
            Ok(position) => {
                let input = MarkerInput::at(position.lat, position.lng)
                    .with_title(USER_LOCATION_TITLE)
                    .with_fly(true);
                self.add_marker(input).map(Some)
            }
            Err(e) => {
                log::warn!("{} user location unavailable: {}", self.provider(), e);
                on_denied(&e);
                Ok(None)
            }
        }
    }

    /// Un-draws every marker and releases the vendor map and its listeners
    pub fn teardown(mut self) -> Result<()> {
        if !self.state.is_live() {
            log::debug!("tearing down a {} surface, nothing to release", self.state);
            return Ok(());
        }

        // The map is released even when some markers could not be removed
        let cleared = self.clear_markers().map(|_| ());
        let released = self.adapter.teardown(self.host.as_mut());
        cleared.and(released)
    }

    fn fail(&mut self, error: MapError) -> MapError {
        log::error!("{} map unavailable: {}", self.provider(), error);
        self.state = SurfaceState::Failed;
        self.failure = Some(error.to_string());
        error
    }

    fn expect_state(&self, operation: &'static str, expected: SurfaceState) -> Result<()> {
        self.ensure_not_failed()?;
        if self.state == expected {
            Ok(())
        } else {
            Err(MapError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    fn expect_live(&self, operation: &'static str) -> Result<()> {
        self.ensure_not_failed()?;
        if self.state.is_live() {
            Ok(())
        } else {
            Err(MapError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    fn ensure_not_failed(&self) -> Result<()> {
        match (&self.state, &self.failure) {
            (SurfaceState::Failed, Some(reason)) => Err(MapError::SurfaceFailed(reason.clone())),
            (SurfaceState::Failed, None) => Err(MapError::SurfaceFailed("unknown".to_string())),
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for MapSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapSurface")
            .field("provider", &self.provider())
            .field("state", &self.state)
            .field("markers", &self.registry.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::geo::LatLng,
        providers::{
            adapter_for,
            host::{object_ref, RecordingHost},
        },
        runtime::ManualScheduler,
        traits::StaticGeolocator,
    };
    use futures::executor::block_on;
    use std::time::Duration;

    fn loader() -> ScriptLoader<ManualScheduler> {
        ScriptLoader::new(ManualScheduler::new())
            .with_interval(Duration::from_millis(10))
            .with_max_attempts(3)
    }

    fn leaflet(host: &RecordingHost) -> MapSurface {
        let mut settings = Settings::defaults(Provider::Leaflet);
        settings.markers = vec![MarkerInput::at(1.0, 2.0).with_title("Start")];
        MapSurface::new(settings, adapter_for(Provider::Leaflet), Box::new(host.clone()))
    }

    fn ready_surface(host: &RecordingHost) -> MapSurface {
        let mut surface = leaflet(host);
        block_on(surface.load(&loader())).unwrap();
        surface.initialize().unwrap();
        surface
    }

    #[test]
    fn test_lifecycle_draws_configured_markers() {
        let host = RecordingHost::new().with_global("L");
        let mut surface = leaflet(&host);
        assert_eq!(surface.state(), SurfaceState::Uninitialized);

        let ready = block_on(surface.load(&loader())).unwrap();
        assert_eq!(ready.probes, 1);
        assert_eq!(surface.state(), SurfaceState::Ready);

        surface.initialize().unwrap();
        assert_eq!(surface.state(), SurfaceState::Initialized);
        assert_eq!(surface.registry().len(), 1);
        assert_eq!(host.calls_to("L", "marker").len(), 1);

        surface.mark_listening().unwrap();
        assert_eq!(surface.state(), SurfaceState::Listening);
    }

    #[test]
    fn test_hidden_default_markers_are_not_drawn() {
        let host = RecordingHost::new().with_global("L");
        let mut surface = leaflet(&host);
        let mut settings = surface.settings().clone();
        settings.show_default_markers = false;
        surface.settings = settings;

        block_on(surface.load(&loader())).unwrap();
        surface.initialize().unwrap();
        assert!(surface.registry().is_empty());
    }

    #[test]
    fn test_timeout_fails_surface() {
        let host = RecordingHost::new();
        let mut surface = leaflet(&host);

        let result = block_on(surface.load(&loader()));
        assert!(matches!(result, Err(MapError::LoadTimeout { attempts: 3 })));
        assert_eq!(surface.state(), SurfaceState::Failed);
        assert!(surface.failure().is_some());

        assert!(matches!(surface.initialize(), Err(MapError::SurfaceFailed(_))));
        assert!(matches!(
            surface.add_marker(MarkerInput::at(0.0, 0.0)),
            Err(MapError::SurfaceFailed(_))
        ));
    }

    #[test]
    fn test_missing_credential_skips_script() {
        let host = RecordingHost::new().with_global("mapboxgl");
        let mut surface = MapSurface::new(
            Settings::defaults(Provider::Mapbox),
            adapter_for(Provider::Mapbox),
            Box::new(host.clone()),
        );

        let result = block_on(surface.load(&loader()));
        assert!(matches!(result, Err(MapError::MissingCredential(Provider::Mapbox))));
        assert_eq!(surface.state(), SurfaceState::Failed);
        assert!(host.scripts().is_empty());
    }

    #[test]
    fn test_operations_before_initialize_are_rejected() {
        let host = RecordingHost::new().with_global("L");
        let mut surface = leaflet(&host);

        assert!(matches!(
            surface.clear_markers(),
            Err(MapError::InvalidState { state: SurfaceState::Uninitialized, .. })
        ));
        assert!(matches!(
            surface.initialize(),
            Err(MapError::InvalidState { operation: "initialize", .. })
        ));

        block_on(surface.load(&loader())).unwrap();
        surface.initialize().unwrap();
        assert!(matches!(
            surface.initialize(),
            Err(MapError::InvalidState { state: SurfaceState::Initialized, .. })
        ));
    }

    #[test]
    fn test_clear_mirrors_registry() {
        let host = RecordingHost::new().with_global("L");
        let mut surface = ready_surface(&host);
        surface.add_marker(MarkerInput::at(3.0, 4.0)).unwrap();

        assert_eq!(surface.clear_markers().unwrap(), 2);
        assert!(surface.registry().is_empty());
        assert_eq!(host.calls_to("map", "removeLayer").len(), 2);

        host.clear();
        assert_eq!(surface.clear_markers().unwrap(), 0);
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_fit_on_empty_registry_is_noop() {
        let host = RecordingHost::new().with_global("L");
        let mut surface = ready_surface(&host);
        surface.clear_markers().unwrap();
        host.clear();

        assert_eq!(surface.fit_to_all_markers().unwrap(), None);
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_fit_spans_markers() {
        let host = RecordingHost::new().with_global("L");
        let mut surface = ready_surface(&host);
        surface.add_marker(MarkerInput::at(-5.0, 10.0)).unwrap();

        let bounds = surface.fit_to_all_markers().unwrap().unwrap();
        assert_eq!(bounds.south(), -5.0);
        assert_eq!(bounds.north(), 1.0);
        assert_eq!(bounds.west(), 2.0);
        assert_eq!(bounds.east(), 10.0);
        assert_eq!(host.calls_to("map", "fitBounds").len(), 1);
    }

    #[test]
    fn test_click_untitled_marker_opens_nothing() {
        let host = RecordingHost::new().with_global("L");
        let mut surface = ready_surface(&host);
        let plain = surface.add_marker(MarkerInput::at(5.0, 5.0)).unwrap();
        host.clear();

        surface.click_marker(plain.id()).unwrap();
        assert!(host.calls().is_empty());

        let titled = surface.registry().list().next().unwrap().id();
        surface.click_marker(titled).unwrap();
        assert_eq!(host.calls_to(&titled.to_string(), "openPopup").len(), 1);
    }

    #[test]
    fn test_locate_user() {
        let host = RecordingHost::new().with_global("L");
        let mut surface = ready_surface(&host);

        let found = block_on(surface.locate_user(
            &StaticGeolocator::at(LatLng::new(48.85, 2.35)),
            |_| panic!("not denied"),
        ))
        .unwrap()
        .unwrap();
        assert_eq!(found.title(), Some(USER_LOCATION_TITLE));
        assert!(found.fly());
        assert_eq!(host.calls_to("map", "panTo").len(), 1);

        let mut denied = false;
        let none = block_on(surface.locate_user(&StaticGeolocator::denied(), |e| {
            denied = matches!(e, MapError::GeolocationDenied(_));
        }))
        .unwrap();
        assert!(none.is_none());
        assert!(denied);
        assert_eq!(surface.registry().len(), 2);
    }

    #[test]
    fn test_teardown_releases_map() {
        let host = RecordingHost::new().with_global("L");
        let surface = ready_surface(&host);

        surface.teardown().unwrap();
        assert_eq!(host.calls_to("map", "removeLayer").len(), 1);
        assert_eq!(host.calls_to("map", "remove").len(), 1);
    }

    #[test]
    fn test_google_marks_configured_center() {
        let host = RecordingHost::new().with_global("google.maps");
        let mut surface = MapSurface::new(
            Settings::defaults(Provider::GoogleMaps),
            adapter_for(Provider::GoogleMaps),
            Box::new(host.clone()),
        );
        block_on(surface.load(&loader())).unwrap();
        surface.initialize().unwrap();

        let marker = surface.registry().list().next().unwrap();
        assert_eq!(marker.title(), Some(CONFIGURED_LOCATION_TITLE));
        assert_eq!(marker.position(), surface.settings().center);
        assert_eq!(surface.registry().len(), 1);
    }

    #[test]
    fn test_partly_drawn_marker_is_still_cleared() {
        let host = RecordingHost::new().with_global("L");
        let mut surface = ready_surface(&host);
        let _ = host.clone().fail_on("bindPopup");

        let result = surface.add_marker(MarkerInput::at(5.0, 5.0).with_title("Late"));
        assert!(matches!(result, Err(MapError::Host(_))));
        assert_eq!(host.calls_to("marker-2", "addTo").len(), 1);
        assert_eq!(surface.registry().len(), 2);

        host.recover();
        assert_eq!(surface.clear_markers().unwrap(), 2);
        let removed: Vec<_> = host
            .calls_to("map", "removeLayer")
            .into_iter()
            .map(|call| call.args[0].clone())
            .collect();
        assert_eq!(removed, vec![object_ref("marker-1"), object_ref("marker-2")]);
    }

    #[test]
    fn test_refused_clear_can_be_retried() {
        let host = RecordingHost::new().with_global("L");
        let mut surface = ready_surface(&host);
        surface.add_marker(MarkerInput::at(3.0, 4.0)).unwrap();
        let _ = host.clone().fail_on("removeLayer");

        assert!(surface.clear_markers().is_err());
        assert_eq!(surface.registry().len(), 2);
        assert!(surface.registry().list().all(|m| surface.handle(m.id()).is_some()));

        host.recover();
        assert_eq!(surface.clear_markers().unwrap(), 2);
        assert!(surface.registry().is_empty());
        assert_eq!(host.calls_to("map", "removeLayer").len(), 2);
    }

    #[test]
    fn test_teardown_releases_map_when_clear_fails() {
        let host = RecordingHost::new().with_global("L");
        let surface = ready_surface(&host);
        let _ = host.clone().fail_on("removeLayer");

        assert!(matches!(surface.teardown(), Err(MapError::Host(_))));
        assert_eq!(host.calls_to("map", "off").len(), 1);
        assert_eq!(host.calls_to("map", "remove").len(), 1);
    }
}
