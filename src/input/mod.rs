pub mod channel;
pub mod events;
pub mod handler;

pub use channel::{ChannelPubSub, Publisher};
pub use events::{Command, HostEvent, Topic};
pub use handler::CommandBus;
