pub mod loader;
pub mod script;

pub use loader::{Ready, ScriptLoader};
pub use script::ScriptAsset;
