pub mod popup;

pub use popup::{popup_text, PopupTracker};
