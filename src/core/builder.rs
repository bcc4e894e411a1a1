//! Widget builder for fluent configuration
//!
//! [`WidgetBuilder`] collects the raw configuration and the host
//! capabilities, then [`WidgetBuilder::launch`] runs the whole startup:
//! resolve settings, load the SDK, create the map, locate the user when
//! asked, and attach the command bus.

use crate::{
    core::{
        config::{ConfigResolver, Provider},
        surface::MapSurface,
    },
    input::{channel::ChannelPubSub, handler::CommandBus},
    providers::{adapter_for, host::VendorHost},
    runtime::Scheduler,
    sdk::loader::ScriptLoader,
    traits::{Geolocator, PubSub},
    MapError, Result,
};
use serde_json::Value;

/// Builder for creating and configuring map widgets
pub struct WidgetBuilder {
    provider: Provider,
    /// Raw widget configuration
    raw: Value,
    host: Option<Box<dyn VendorHost>>,
    pubsub: Option<Box<dyn PubSub>>,
    geolocator: Option<Box<dyn Geolocator>>,
}

impl WidgetBuilder {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            raw: Value::Null,
            host: None,
            pubsub: None,
            geolocator: None,
        }
    }

    /// Raw configuration object, resolved at launch
    pub fn config(mut self, raw: Value) -> Self {
        self.raw = raw;
        self
    }

    /// The runtime executing vendor calls. Required.
    pub fn host(mut self, host: impl VendorHost + 'static) -> Self {
        self.host = Some(Box::new(host));
        self
    }

    /// Host pub/sub runtime; defaults to an in-process [`ChannelPubSub`]
    pub fn pubsub(mut self, pubsub: impl PubSub + 'static) -> Self {
        self.pubsub = Some(Box::new(pubsub));
        self
    }

    pub fn geolocator(mut self, geolocator: impl Geolocator + 'static) -> Self {
        self.geolocator = Some(Box::new(geolocator));
        self
    }

    /// Runs the startup sequence and returns the listening widget
    pub async fn launch<S: Scheduler>(self, loader: &ScriptLoader<S>) -> Result<MapWidget> {
        let provider = self.provider;
        let settings = ConfigResolver::new(provider).resolve_value(&self.raw);

        let host = self.host.ok_or_else(|| {
            let e = MapError::Host("no vendor host configured".to_string());
            log::error!("{provider} widget cannot start: {e}");
            e
        })?;
        let mut pubsub = self
            .pubsub
            .unwrap_or_else(|| Box::new(ChannelPubSub::new()) as Box<dyn PubSub>);

        let show_user_location = settings.show_user_location;
        let mut surface = MapSurface::new(settings, adapter_for(provider), host);

        surface.load(loader).await?;
        surface.initialize()?;

        if show_user_location {
            match self.geolocator.as_deref() {
                Some(geolocator) => {
                    if let Err(e) = surface.locate_user(geolocator, |_| {}).await {
                        log::warn!("{provider} user location marker not drawn: {e}");
                    }
                }
                None => log::warn!("{provider} user location requested without a geolocator"),
            }
        }

        let bus = CommandBus::new(provider);
        bus.attach(pubsub.as_mut(), &mut surface)?;
        log::info!("{provider} widget ready");

        Ok(MapWidget {
            surface,
            bus,
            pubsub,
        })
    }
}

/// A launched widget: the surface, its command bus and the host pub/sub
pub struct MapWidget {
    surface: MapSurface,
    bus: CommandBus,
    pubsub: Box<dyn PubSub>,
}

impl MapWidget {
    pub fn surface(&self) -> &MapSurface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut MapSurface {
        &mut self.surface
    }

    pub fn bus(&self) -> &CommandBus {
        &self.bus
    }

    /// Publishes on the widget's own pub/sub
    pub fn publish(&self, topic: &str, payload: Value) -> Result<()> {
        self.pubsub.publish(topic, payload)
    }

    /// Handles every pending host event, in arrival order
    pub fn pump(&mut self) -> usize {
        self.bus.drain(self.pubsub.as_mut(), &mut self.surface)
    }

    pub fn teardown(mut self) -> Result<()> {
        self.bus.detach(self.pubsub.as_mut(), &mut self.surface);
        self.surface.teardown()
    }
}
