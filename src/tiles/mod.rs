pub mod source;

// Re-exports for convenience
pub use source::{named_tile_layer, TileLayerSpec};
