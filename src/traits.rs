//! Capabilities provided by the host page
//!
//! The toolkit never reaches for globals. Everything it needs from the
//! embedding runtime (pub/sub events, the geolocation API) is injected
//! through these traits.

use crate::{core::geo::LatLng, input::events::HostEvent, MapError, Result};
use async_trait::async_trait;
use serde_json::Value;

/// Host publish/subscribe runtime
pub trait PubSub {
    /// Starts delivering events published on `topic`
    fn subscribe(&mut self, topic: &str) -> Result<()>;

    /// Stops delivering events published on `topic`
    fn unsubscribe(&mut self, topic: &str);

    /// Publishes `payload` on `topic`
    fn publish(&self, topic: &str, payload: Value) -> Result<()>;

    /// Next pending event on a subscribed topic, in arrival order
    fn next_event(&mut self) -> Option<HostEvent>;
}

/// One-shot access to the host geolocation API
#[async_trait]
pub trait Geolocator: Send + Sync {
    /// Current position, or `GeolocationDenied` when refused or unavailable
    async fn current_position(&self) -> Result<LatLng>;
}

/// Geolocator answering with a fixed position, or always denying
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticGeolocator {
    position: Option<LatLng>,
}

impl StaticGeolocator {
    pub fn at(position: LatLng) -> Self {
        Self {
            position: Some(position),
        }
    }

    pub fn denied() -> Self {
        Self { position: None }
    }
}

#[async_trait]
impl Geolocator for StaticGeolocator {
    async fn current_position(&self) -> Result<LatLng> {
        self.position.ok_or_else(|| {
            MapError::GeolocationDenied("permission denied or unavailable".to_string())
        })
    }
}
