use super::World;
use crate::agent::Emotion;
use crate::grid::Grid;
use crate::tile::TileKind;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Tiles above this fire risk count as "at risk" in samples.
const AT_RISK_THRESHOLD: f32 = 0.05;

#[derive(Clone, Debug)]
pub struct StepTimings {
    pub kinematics_us: u64,
    pub influence_us: u64,
    pub growth_us: u64,
    pub diffusion_us: u64,
    pub fire_us: u64,
    pub total_us: u64,
}

/// Headline counters shown to the user.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldStats {
    pub avg_mood: f32,
    pub mature_tiles: usize,
    pub total_visits: u64,
}

impl WorldStats {
    pub fn aggregate(grid: &Grid, mature_threshold: f32) -> Self {
        let mut mood_sum = 0.0f64;
        let mut mature_tiles = 0;
        let mut total_visits = 0u64;
        for tile in grid.tiles() {
            mood_sum += tile.mood() as f64;
            if tile.growth() > mature_threshold {
                mature_tiles += 1;
            }
            total_visits = total_visits.saturating_add(tile.visits());
        }
        Self {
            avg_mood: (mood_sum / grid.len().max(1) as f64) as f32,
            mature_tiles,
            total_visits,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct StepMetrics {
    pub tick: u64,
    pub clock_ms: f64,
    pub stats: WorldStats,
    /// Tiles with any growth.
    pub active_tiles: usize,
    /// Tiles with 0 < growth < 1.
    pub growing_tiles: usize,
    pub at_risk_tiles: usize,
    pub mean_water: f32,
    pub mean_nutrients: f32,
    pub mean_light: f32,
    pub mean_growth: f32,
    /// Indexed like [`TileKind::ALL`].
    pub kind_counts: [usize; 6],
    pub joy_agents: usize,
    pub sorrow_agents: usize,
    pub fires_last_tick: usize,
    pub spawns_last_tick: usize,
    pub seeds_last_tick: usize,
}

impl StepMetrics {
    pub fn kind_count(&self, kind: TileKind) -> usize {
        self.kind_counts[kind.ordinal()]
    }
}

fn default_schema_version() -> u32 {
    1
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub ticks: usize,
    pub dt_ms: f64,
    pub sample_every: usize,
    pub final_agent_count: usize,
    pub final_stats: WorldStats,
    #[serde(default)]
    pub total_fires: usize,
    pub samples: Vec<StepMetrics>,
}

/// Point-in-time export of the headline counters.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExportRecord {
    /// Wall-clock Unix time of the export.
    pub timestamp_ms: u64,
    /// Simulation clock.
    pub clock_ms: f64,
    pub tick: u64,
    pub stats: WorldStats,
    pub agent_count: usize,
    pub mature_tiles: usize,
    pub avg_mood: f32,
}

impl ExportRecord {
    pub(crate) fn now_unix_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl World {
    pub fn collect_step_metrics(&self) -> StepMetrics {
        let tiles = self.grid.tiles();
        let denom = tiles.len().max(1) as f64;

        let mut water_sum = 0.0f64;
        let mut nutrient_sum = 0.0f64;
        let mut light_sum = 0.0f64;
        let mut growth_sum = 0.0f64;
        let mut active_tiles = 0;
        let mut growing_tiles = 0;
        let mut at_risk_tiles = 0;
        let mut kind_counts = [0usize; 6];
        for tile in tiles {
            water_sum += tile.water() as f64;
            nutrient_sum += tile.nutrients() as f64;
            light_sum += tile.light() as f64;
            growth_sum += tile.growth() as f64;
            if tile.growth() > 0.0 {
                active_tiles += 1;
                if tile.growth() < 1.0 {
                    growing_tiles += 1;
                }
            }
            if tile.fire_risk() > AT_RISK_THRESHOLD {
                at_risk_tiles += 1;
            }
            kind_counts[tile.kind().ordinal()] += 1;
        }
        let joy_agents = self
            .agents
            .iter()
            .filter(|a| a.emotion == Emotion::Joy)
            .count();

        StepMetrics {
            tick: self.tick_index,
            clock_ms: self.clock_ms,
            stats: self.query_stats(),
            active_tiles,
            growing_tiles,
            at_risk_tiles,
            mean_water: (water_sum / denom) as f32,
            mean_nutrients: (nutrient_sum / denom) as f32,
            mean_light: (light_sum / denom) as f32,
            mean_growth: (growth_sum / denom) as f32,
            kind_counts,
            joy_agents,
            sorrow_agents: self.agents.len() - joy_agents,
            fires_last_tick: self.fires_last_tick,
            spawns_last_tick: self.spawns_last_tick,
            seeds_last_tick: self.seeds_last_tick,
        }
    }
}
