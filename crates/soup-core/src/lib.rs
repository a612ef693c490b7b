//! Tile-and-agent "living forest" simulation core.
//!
//! Emotional agents wander a grid, their joy and sorrow settle into tile mood,
//! and tiles grow, shade each other, trade water and nutrients, and burn.

pub mod agent;
pub mod config;
pub mod diffusion;
pub mod grid;
pub mod spatial;
pub mod tile;
pub mod world;

pub use agent::{Agent, Emotion};
pub use config::{Layout, SimConfigError, SoupConfig};
pub use grid::Grid;
pub use tile::{GrowthStage, Tile, TileKind, TileSnapshot};
pub use world::{
    ExperimentError, ExportRecord, RunSummary, StepMetrics, StepTimings, World, WorldInitError,
    WorldStats,
};
