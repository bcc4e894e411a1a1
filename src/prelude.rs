//! Prelude module for common toolkit types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use maps_toolkit::prelude::*;`

pub use crate::core::{
    bounds::BoundsCalculator,
    builder::{MapWidget, WidgetBuilder},
    config::{ConfigResolver, Provider, Settings, StyleSource},
    geo::{LatLng, LatLngBounds},
    surface::{MapSurface, SurfaceState},
};

pub use crate::layers::{
    manager::MarkerRegistry,
    marker::{Marker, MarkerId, MarkerInput, MarkerKind},
};

pub use crate::input::{
    channel::{ChannelPubSub, Publisher},
    events::{Command, HostEvent, Topic},
    handler::CommandBus,
};

pub use crate::providers::{
    adapter_for,
    host::{RecordingHost, VendorCall, VendorHost},
    ProviderAdapter, VendorHandle,
};

pub use crate::runtime::{ManualScheduler, Scheduler};

#[cfg(feature = "tokio-runtime")]
pub use crate::runtime::TokioScheduler;

pub use crate::sdk::{
    loader::{Ready, ScriptLoader},
    script::ScriptAsset,
};

pub use crate::tiles::source::{named_tile_layer, TileLayerSpec};

pub use crate::traits::{Geolocator, PubSub, StaticGeolocator};

pub use crate::{MapError, Result};

// Common external types
pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
pub use serde_json::{json, Value};
pub use std::time::Duration;
