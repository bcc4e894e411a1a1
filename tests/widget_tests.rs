use maps_toolkit::prelude::*;

/// End-to-end tests driving widgets through the host pub/sub, the way a
/// page embedding the toolkit would
#[cfg(test)]
mod widget_tests {
    use super::*;

    fn loader(max_attempts: u32) -> ScriptLoader<ManualScheduler> {
        ScriptLoader::new(ManualScheduler::new())
            .with_interval(Duration::from_millis(10))
            .with_max_attempts(max_attempts)
    }

    async fn leaflet_widget(host: &RecordingHost) -> MapWidget {
        WidgetBuilder::new(Provider::Leaflet)
            .config(json!({ "showMarker": false }))
            .host(host.clone())
            .launch(&loader(10))
            .await
            .unwrap()
    }

    fn titles(widget: &MapWidget) -> Vec<String> {
        widget
            .surface()
            .registry()
            .list()
            .map(|m| m.title().unwrap_or_default().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_add_marker_command_keeps_order() {
        let host = RecordingHost::new().with_global("L");
        let mut widget = leaflet_widget(&host).await;

        widget
            .publish(
                "leaflet:add_marker",
                json!([{"lat": 1, "lng": 1, "title": "A"}, {"lat": 2, "lng": 2, "title": "B"}]),
            )
            .unwrap();
        assert_eq!(widget.pump(), 1);

        let registry = widget.surface().registry();
        assert_eq!(registry.len(), 2);
        let ids: Vec<MarkerId> = registry.list().map(|m| m.id()).collect();
        assert_ne!(ids[0], ids[1]);
        assert_eq!(titles(&widget), vec!["A", "B"]);
        assert_eq!(host.calls_to("L", "marker").len(), 2);
    }

    #[tokio::test]
    async fn test_nested_payload_is_flattened() {
        let host = RecordingHost::new().with_global("L");
        let mut widget = leaflet_widget(&host).await;

        widget
            .publish(
                "leaflet:add_marker",
                json!([[{"latitude": "3.5", "longitude": 4, "title": "C"}], [[{"lat": 5, "lng": 6}]]]),
            )
            .unwrap();
        widget.pump();

        let positions: Vec<LatLng> = widget
            .surface()
            .registry()
            .list()
            .map(|m| m.position())
            .collect();
        assert_eq!(positions, vec![LatLng::new(3.5, 4.0), LatLng::new(5.0, 6.0)]);
    }

    #[tokio::test]
    async fn test_fit_to_all_markers_command() {
        let host = RecordingHost::new().with_global("L");
        let mut widget = leaflet_widget(&host).await;

        widget
            .publish(
                "leaflet:add_marker",
                json!([{"lat": 10, "lng": 10}, {"lat": 20, "lng": 20}, {"lat": -5, "lng": -5}]),
            )
            .unwrap();
        widget.publish("leaflet:fit_to_all_markers", Value::Null).unwrap();
        assert_eq!(widget.pump(), 2);

        let bounds = BoundsCalculator::fit_bounds(widget.surface().registry().list()).unwrap();
        assert_eq!(bounds.south(), -5.0);
        assert_eq!(bounds.north(), 20.0);
        assert_eq!(bounds.west(), -5.0);
        assert_eq!(bounds.east(), 20.0);

        let fits = host.calls_to("map", "fitBounds");
        assert_eq!(fits.len(), 1);
        assert_eq!(fits[0].args[0], json!([[-5.0, -5.0], [20.0, 20.0]]));
    }

    #[tokio::test]
    async fn test_fit_with_no_markers_is_a_noop() {
        let host = RecordingHost::new().with_global("L");
        let mut widget = leaflet_widget(&host).await;

        widget.publish("leaflet:fit_to_all_markers", Value::Null).unwrap();
        assert_eq!(widget.pump(), 1);
        assert!(host.calls_to("map", "fitBounds").is_empty());
        assert_eq!(widget.surface().state(), SurfaceState::Listening);
    }

    #[tokio::test]
    async fn test_clear_markers_is_idempotent() {
        let host = RecordingHost::new().with_global("L");
        let mut widget = leaflet_widget(&host).await;

        widget
            .publish("leaflet:add_marker", json!([{"lat": 1, "lng": 1}, {"lat": 2, "lng": 2}]))
            .unwrap();
        widget.publish("leaflet:clear_markers", Value::Null).unwrap();
        widget.publish("leaflet:clear_markers", Value::Null).unwrap();
        assert_eq!(widget.pump(), 3);

        assert!(widget.surface().registry().is_empty());
        assert_eq!(host.calls_to("map", "removeLayer").len(), 2);
    }

    #[tokio::test]
    async fn test_configured_markers_are_drawn_on_start() {
        let host = RecordingHost::new().with_global("mapboxgl");
        let widget = WidgetBuilder::new(Provider::Mapbox)
            .config(json!({
                "accessToken": "pk.test",
                "markersJSON": r#"[{"lat": 1, "lng": 2, "type": "pin"}, {"lat": 3, "lng": 4}]"#,
            }))
            .host(host.clone())
            .launch(&loader(10))
            .await
            .unwrap();

        assert_eq!(widget.surface().registry().len(), 2);
        assert_eq!(host.calls_to("mapboxgl", "=accessToken").len(), 1);
        assert_eq!(host.scripts().len(), 1);
    }

    #[tokio::test]
    async fn test_sdk_never_ready_fails_launch() {
        let host = RecordingHost::new();
        let result = WidgetBuilder::new(Provider::Leaflet)
            .host(host.clone())
            .launch(&loader(3))
            .await;

        assert!(matches!(result, Err(MapError::LoadTimeout { attempts: 3 })));
        assert_eq!(host.probes(), 3);
        assert!(host.calls().is_empty());
    }

    #[tokio::test]
    async fn test_slow_sdk_is_waited_for() {
        let host = RecordingHost::new().ready_after("H.service", 4);
        let loader = loader(10);
        let widget = WidgetBuilder::new(Provider::HereMaps)
            .config(json!({ "apiKey": "here-key" }))
            .host(host.clone())
            .launch(&loader)
            .await
            .unwrap();

        assert_eq!(host.probes(), 5);
        assert_eq!(loader.scheduler().sleeps(), 5);
        assert_eq!(widget.surface().state(), SurfaceState::Listening);
    }

    #[tokio::test]
    async fn test_missing_credential_fails_before_loading() {
        let host = RecordingHost::new().with_global("H.service");
        let result = WidgetBuilder::new(Provider::HereMaps)
            .host(host.clone())
            .launch(&loader(10))
            .await;

        assert!(matches!(result, Err(MapError::MissingCredential(Provider::HereMaps))));
        assert!(host.scripts().is_empty());
        assert_eq!(host.probes(), 0);
    }

    #[tokio::test]
    async fn test_denied_geolocation_leaves_map_usable() {
        let host = RecordingHost::new().with_global("L");
        let mut widget = WidgetBuilder::new(Provider::Leaflet)
            .config(json!({ "showUserLocation": "true", "showMarker": false }))
            .host(host.clone())
            .geolocator(StaticGeolocator::denied())
            .launch(&loader(10))
            .await
            .unwrap();

        assert!(widget.surface().registry().is_empty());

        widget
            .publish("leaflet:add_marker", json!({"lat": 1, "lng": 1}))
            .unwrap();
        widget.pump();
        assert_eq!(widget.surface().registry().len(), 1);
    }

    #[tokio::test]
    async fn test_found_geolocation_flies_to_user() {
        let host = RecordingHost::new().with_global("L");
        let widget = WidgetBuilder::new(Provider::Leaflet)
            .config(json!({ "showUserLocation": true, "showMarker": false }))
            .host(host.clone())
            .geolocator(StaticGeolocator::at(LatLng::new(52.52, 13.405)))
            .launch(&loader(10))
            .await
            .unwrap();

        assert_eq!(titles(&widget), vec!["My Location"]);
        assert_eq!(host.calls_to("map", "panTo").len(), 1);
    }

    #[tokio::test]
    async fn test_only_one_popup_is_open() {
        let host = RecordingHost::new().with_global("L");
        let mut widget = leaflet_widget(&host).await;

        widget
            .publish(
                "leaflet:add_marker",
                json!([{"lat": 1, "lng": 1, "title": "A"}, {"lat": 2, "lng": 2, "title": "B"}]),
            )
            .unwrap();
        widget.pump();
        let ids: Vec<MarkerId> = widget.surface().registry().list().map(|m| m.id()).collect();

        let surface = widget.surface_mut();
        surface.click_marker(ids[0]).unwrap();
        surface.click_marker(ids[0]).unwrap();
        surface.click_marker(ids[1]).unwrap();

        let first = ids[0].to_string();
        let second = ids[1].to_string();
        assert_eq!(host.calls_to(&first, "openPopup").len(), 1);
        assert_eq!(host.calls_to(&first, "closePopup").len(), 1);
        assert_eq!(host.calls_to(&second, "openPopup").len(), 1);
    }

    #[tokio::test]
    async fn test_events_for_other_providers_are_ignored() {
        let host = RecordingHost::new().with_global("L");
        let mut widget = leaflet_widget(&host).await;

        widget
            .publish("google_maps:add_marker", json!({"lat": 1, "lng": 1}))
            .unwrap();
        assert_eq!(widget.pump(), 0);
        assert!(widget.surface().registry().is_empty());
    }

    #[tokio::test]
    async fn test_teardown_releases_everything() {
        let host = RecordingHost::new().with_global("google.maps");
        let mut widget = WidgetBuilder::new(Provider::GoogleMaps)
            .host(host.clone())
            .launch(&loader(10))
            .await
            .unwrap();

        // The default "Configured Location" marker plus one more
        widget
            .publish("google_maps:add_marker", json!({"lat": 1, "lng": 1}))
            .unwrap();
        widget.pump();
        assert_eq!(widget.surface().registry().len(), 2);

        widget.teardown().unwrap();
        assert_eq!(
            host.calls_to("google.maps.event", "clearInstanceListeners").len(),
            1
        );
        let released = host
            .calls()
            .into_iter()
            .filter(|call| call.method == "setMap" && call.args == vec![Value::Null])
            .count();
        assert_eq!(released, 2);
    }

    #[cfg(feature = "tokio-runtime")]
    #[tokio::test]
    async fn test_tokio_scheduler_polls_on_real_timers() {
        let host = RecordingHost::new().ready_after("L", 1);
        let loader = ScriptLoader::new(TokioScheduler).with_interval(Duration::from_millis(5));

        let widget = WidgetBuilder::new(Provider::Leaflet)
            .host(host.clone())
            .launch(&loader)
            .await
            .unwrap();

        assert_eq!(host.probes(), 2);
        assert_eq!(widget.surface().state(), SurfaceState::Listening);
    }
}
