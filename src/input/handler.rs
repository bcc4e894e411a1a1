use crate::{
    core::{config::Provider, surface::MapSurface},
    input::events::{Command, HostEvent, Topic},
    traits::PubSub,
    MapError, Result,
};

/// Wires the namespaced host topics onto one map surface
#[derive(Debug, Clone)]
pub struct CommandBus {
    namespace: String,
}

impl CommandBus {
    pub fn new(provider: Provider) -> Self {
        Self::with_namespace(provider.namespace())
    }

    /// Bus listening under a custom topic prefix
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Full names of the topics this bus consumes
    pub fn topics(&self) -> Vec<String> {
        Topic::ALL
            .iter()
            .map(|topic| topic.qualified(&self.namespace))
            .collect()
    }

    /// Subscribes to every command topic and moves the surface to `Listening`
    pub fn attach(&self, pubsub: &mut dyn PubSub, surface: &mut MapSurface) -> Result<()> {
        surface.mark_listening()?;
        for topic in self.topics() {
            pubsub.subscribe(&topic)?;
        }
        log::debug!("command bus listening on {}:*", self.namespace);
        Ok(())
    }

    pub fn detach(&self, pubsub: &mut dyn PubSub, surface: &mut MapSurface) {
        for topic in self.topics() {
            pubsub.unsubscribe(&topic);
        }
        surface.stop_listening();
    }

    pub fn decode(&self, event: &HostEvent) -> Result<Command> {
        let topic = Topic::parse(&self.namespace, &event.topic)
            .ok_or_else(|| MapError::UnknownTopic(event.topic.clone()))?;
        Ok(Command::decode(topic, &event.payload))
    }

    /// Runs one event against the surface
    pub fn dispatch(&self, surface: &mut MapSurface, event: &HostEvent) -> Result<()> {
        let command = self.decode(event)?;
        log::debug!("{} -> {:?}", event.topic, command);

        match command {
            Command::AddMarkers(inputs) => {
                // One bad marker does not drop the rest of the payload
                let mut first = None;
                for input in inputs {
                    if let Err(e) = surface.add_marker(input) {
                        log::warn!("{}: marker skipped: {}", event.topic, e);
                        first.get_or_insert(e);
                    }
                }
                if let Some(e) = first {
                    return Err(e);
                }
            }
            Command::ClearMarkers => {
                surface.clear_markers()?;
            }
            Command::FitToAllMarkers => {
                surface.fit_to_all_markers()?;
            }
        }
        Ok(())
    }

    /// Dispatches every pending event in arrival order and returns how many
    /// were handled. Command errors are logged; a failed surface stops the drain.
    pub fn drain(&self, pubsub: &mut dyn PubSub, surface: &mut MapSurface) -> usize {
        let mut handled = 0;

        while let Some(event) = pubsub.next_event() {
            if surface.state().is_failed() {
                log::error!("surface failed, dropping {} and later commands", event.topic);
                break;
            }
            if let Err(e) = self.dispatch(surface, &event) {
                log::warn!("command {} failed: {}", event.topic, e);
            }
            handled += 1;
        }

        handled
    }
}
