//! Widget-wide defaults shared by every provider.

/// Default center latitude (San Francisco).
pub const DEFAULT_LATITUDE: f64 = 37.7749;

/// Default center longitude (San Francisco).
pub const DEFAULT_LONGITUDE: f64 = -122.4194;

/// Highest zoom level any supported vendor accepts.
pub const MAX_ZOOM: u8 = 22;

/// Interval between two readiness probes of a vendor SDK.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 300;

/// Number of failed probes tolerated before giving up on an SDK.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Label of the marker synthesized from the host geolocation.
pub const USER_LOCATION_TITLE: &str = "My Location";

/// Label of the marker Google Maps draws at the configured center.
pub const CONFIGURED_LOCATION_TITLE: &str = "Configured Location";

/// Mapbox `flyTo` animation speed.
pub const FLY_SPEED: f64 = 1.2;

/// Mapbox `flyTo` zoom curve.
pub const FLY_CURVE: f64 = 1.42;

/// Pixel offset of a Mapbox popup above its marker.
pub const POPUP_OFFSET: u32 = 25;

/// Padding in pixels kept around markers when fitting bounds.
pub const FIT_PADDING: u32 = 40;

/// Custom marker icon size (square, pixels).
pub const MARKER_ICON_SIZE: u32 = 32;

/// Default marker dot size (square, pixels).
pub const MARKER_DOT_SIZE: u32 = 12;

/// Default marker dot color.
pub const MARKER_DOT_COLOR: &str = "#3FB1CE";
