//! # maps-toolkit
//!
//! A provider-agnostic map surface for embedding third-party map SDKs
//! (Google Maps, Mapbox GL, HERE Maps, Leaflet) into a host page.
//!
//! The library resolves loose widget configuration into typed settings,
//! waits for the vendor SDK with a bounded polling retry, keeps the
//! authoritative marker registry and forwards every mutation to the active
//! provider adapter. External commands ("add marker", "clear markers",
//! "fit to all markers") arrive through a host pub/sub capability.

pub mod core;
pub mod input;
pub mod layers;
pub mod prelude;
pub mod providers;
pub mod runtime;
pub mod sdk;
pub mod tiles;
pub mod traits;
pub mod ui;
pub use crate::core::constants;

// Re-export public API
pub use core::{
    bounds::BoundsCalculator,
    builder::{MapWidget, WidgetBuilder},
    config::{ConfigResolver, Provider, Settings, StyleSource},
    geo::{LatLng, LatLngBounds},
    surface::{MapSurface, SurfaceState},
};

pub use layers::{
    manager::MarkerRegistry,
    marker::{Marker, MarkerId, MarkerInput, MarkerKind},
};

pub use input::{
    channel::ChannelPubSub,
    events::{Command, HostEvent, Topic},
    handler::CommandBus,
};

pub use providers::{
    adapter_for,
    host::{RecordingHost, VendorCall, VendorHost},
    ProviderAdapter, VendorHandle,
};

pub use sdk::{loader::ScriptLoader, script::ScriptAsset};

pub use traits::{Geolocator, PubSub, StaticGeolocator};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("vendor SDK was not ready after {attempts} attempts")]
    LoadTimeout { attempts: u32 },

    #[error("{0} credential is missing")]
    MissingCredential(Provider),

    #[error("no markers to fit")]
    EmptyRegistry,

    #[error("geolocation unavailable: {0}")]
    GeolocationDenied(String),

    #[error("invalid marker: {0}")]
    InvalidMarker(String),

    #[error("cannot {operation} while surface is {state}")]
    InvalidState {
        operation: &'static str,
        state: SurfaceState,
    },

    #[error("surface failed: {0}")]
    SurfaceFailed(String),

    #[error("host error: {0}")]
    Host(String),

    #[error("unknown topic: {0}")]
    UnknownTopic(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error type alias for convenience
pub type Error = MapError;

/// Installs `env_logger` so library diagnostics reach stderr.
#[cfg(feature = "debug")]
pub fn init_debug_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
        .try_init();
}
