pub mod fire;
pub mod growth;
pub mod influence;
pub mod kinematics;
pub mod lifecycle;
pub mod metrics;
#[cfg(test)]
mod tests;

pub use metrics::*;

use crate::agent::{Agent, Emotion};
use crate::config::{Layout, SimConfigError, SoupConfig};
use crate::grid::Grid;
use crate::spatial;
use crate::tile::{Tile, TileSnapshot};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use thiserror::Error;
use tracing::{debug, info};

/// The whole simulation: grid, agents, clock and the single RNG stream that
/// drives every stochastic decision.
#[derive(Clone, Debug, PartialEq)]
pub struct World {
    pub agents: Vec<Agent>,
    pub(crate) grid: Grid,
    pub(crate) config: SoupConfig,
    pub(crate) rng: ChaCha12Rng,
    pub(crate) clock_ms: f64,
    pub(crate) tick_index: u64,
    pub(crate) next_agent_id: u32,
    pub(crate) fires_last_tick: usize,
    pub(crate) total_fires: usize,
    pub(crate) spawns_last_tick: usize,
    pub(crate) seeds_last_tick: usize,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorldInitError {
    #[error(transparent)]
    Config(#[from] SimConfigError),
    #[error("grid geometry is fixed for a world's lifetime (width, height, layout, ground_row)")]
    GeometryChanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExperimentError {
    #[error("sample_every must be positive")]
    InvalidSampleEvery,
    #[error("dt_ms must be finite and non-negative")]
    InvalidTimestep,
    #[error("ticks ({actual}) exceed supported maximum ({max})")]
    TooManyTicks { max: usize, actual: usize },
    #[error("sample count ({actual}) exceeds supported maximum ({max})")]
    TooManySamples { max: usize, actual: usize },
}

impl World {
    pub const MAX_EXPERIMENT_TICKS: usize = 1_000_000;
    pub const MAX_EXPERIMENT_SAMPLES: usize = 50_000;

    pub fn new(config: SoupConfig) -> Self {
        Self::try_new(config).unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn try_new(config: SoupConfig) -> Result<Self, WorldInitError> {
        config.validate()?;
        let mut rng = ChaCha12Rng::seed_from_u64(config.seed);
        let grid = Grid::generate(&config, &mut rng);
        let mut world = Self {
            agents: Vec::with_capacity(config.initial_agents),
            grid,
            config,
            rng,
            clock_ms: 0.0,
            tick_index: 0,
            next_agent_id: 0,
            fires_last_tick: 0,
            total_fires: 0,
            spawns_last_tick: 0,
            seeds_last_tick: 0,
        };
        world.populate();
        info!(
            width = world.config.width,
            height = world.config.height,
            layout = ?world.config.layout,
            agents = world.agents.len(),
            seed = world.config.seed,
            "world initialized"
        );
        Ok(world)
    }

    pub fn config(&self) -> &SoupConfig {
        &self.config
    }

    /// Swap tunables at runtime. Geometry must stay the same; the RNG stream is
    /// not reseeded.
    pub fn set_config(&mut self, config: SoupConfig) -> Result<(), WorldInitError> {
        config.validate()?;
        if config.width != self.config.width
            || config.height != self.config.height
            || config.layout != self.config.layout
            || (config.layout == Layout::SideView && config.ground_row != self.config.ground_row)
        {
            return Err(WorldInitError::GeometryChanged);
        }
        self.config = config;
        Ok(())
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Direct tile access for drivers and debugging tools. Setters keep every
    /// value inside its documented range.
    pub fn tile_mut(&mut self, x: usize, y: usize) -> Option<&mut Tile> {
        self.grid.get_mut(x, y)
    }

    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    pub fn tick_index(&self) -> u64 {
        self.tick_index
    }

    pub fn total_fires(&self) -> usize {
        self.total_fires
    }

    pub fn fires_last_tick(&self) -> usize {
        self.fires_last_tick
    }

    /// Discard the grid and agents and build fresh ones. The RNG stream and the
    /// agent id counter carry on, so ids are never handed out twice.
    pub fn reset(&mut self) {
        self.grid = Grid::generate(&self.config, &mut self.rng);
        self.agents.clear();
        self.clock_ms = 0.0;
        self.tick_index = 0;
        self.fires_last_tick = 0;
        self.total_fires = 0;
        self.spawns_last_tick = 0;
        self.seeds_last_tick = 0;
        self.populate();
        info!(agents = self.agents.len(), "world reset");
    }

    fn populate(&mut self) {
        for _ in 0..self.config.initial_agents {
            if self.spawn_random_agent().is_none() {
                break;
            }
        }
    }

    fn random_emotion(&mut self) -> Emotion {
        if self.rng.random::<bool>() {
            Emotion::Joy
        } else {
            Emotion::Sorrow
        }
    }

    /// Add an agent at a continuous grid position with a random emotion.
    /// `None` when the position is outside the grid, blocked, or the population
    /// is full.
    pub fn spawn_agent(&mut self, x: f64, y: f64) -> Option<u32> {
        self.grid.tile_at(x, y)?;
        let emotion = self.random_emotion();
        self.spawn_agent_with(x, y, emotion)
    }

    /// Side-view positions inside ground or other blocking tiles are refused,
    /// since an agent placed there could never move.
    pub fn spawn_agent_with(&mut self, x: f64, y: f64, emotion: Emotion) -> Option<u32> {
        let tile = self.grid.tile_at(x, y)?;
        if self.config.layout == Layout::SideView && kinematics::blocks(Some(tile)) {
            return None;
        }
        if self.agents.len() >= SoupConfig::MAX_TOTAL_AGENTS {
            return None;
        }
        let id = self.next_agent_id_checked()?;
        let mut agent = Agent::new(id, [x, y], emotion);
        agent.velocity = [
            (self.rng.random::<f64>() - 0.5) * 2.0,
            (self.rng.random::<f64>() - 0.5) * 2.0,
        ];
        debug!(id, x, y, ?emotion, "spawned agent");
        self.agents.push(agent);
        Some(id)
    }

    /// Spawn at a random position. Side-view agents start in the air above the
    /// ground row and fall into place.
    pub fn spawn_random_agent(&mut self) -> Option<u32> {
        let width = self.grid.width() as f64;
        let rows = match self.config.layout {
            Layout::Flat => self.grid.height(),
            Layout::SideView => self.config.ground_row,
        };
        let x = self.rng.random::<f64>() * width;
        let y = self.rng.random::<f64>() * rows as f64;
        let emotion = self.random_emotion();
        self.spawn_agent_with(x, y, emotion)
    }

    /// Ids of agents within Euclidean `radius` of a continuous position.
    pub fn agents_near(&self, x: f64, y: f64, radius: f64) -> Vec<u32> {
        let tree = spatial::build_index(&self.agents);
        spatial::query_neighbors(&tree, [x, y], radius)
    }

    pub fn query_tile(&self, x: usize, y: usize) -> Option<TileSnapshot> {
        let tile = self.grid.get(x, y)?;
        let mut snapshot = tile.snapshot();
        snapshot.nearby_agents = self
            .agents_near(
                x as f64 + 0.5,
                y as f64 + 0.5,
                self.config.influence.radius as f64,
            )
            .len();
        Some(snapshot)
    }

    pub fn query_stats(&self) -> WorldStats {
        WorldStats::aggregate(&self.grid, self.config.mature_threshold)
    }

    pub fn export_summary(&self) -> ExportRecord {
        let stats = self.query_stats();
        ExportRecord {
            timestamp_ms: ExportRecord::now_unix_ms(),
            clock_ms: self.clock_ms,
            tick: self.tick_index,
            agent_count: self.agents.len(),
            mature_tiles: stats.mature_tiles,
            avg_mood: stats.avg_mood,
            stats,
        }
    }

    pub fn run(&mut self, ticks: usize, dt_ms: f64, sample_every: usize) -> RunSummary {
        self.try_run(ticks, dt_ms, sample_every)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    /// Advance `ticks` fixed-size ticks, sampling metrics every `sample_every`
    /// ticks and always on the last one.
    pub fn try_run(
        &mut self,
        ticks: usize,
        dt_ms: f64,
        sample_every: usize,
    ) -> Result<RunSummary, ExperimentError> {
        if sample_every == 0 {
            return Err(ExperimentError::InvalidSampleEvery);
        }
        if !dt_ms.is_finite() || dt_ms < 0.0 {
            return Err(ExperimentError::InvalidTimestep);
        }
        if ticks > Self::MAX_EXPERIMENT_TICKS {
            return Err(ExperimentError::TooManyTicks {
                max: Self::MAX_EXPERIMENT_TICKS,
                actual: ticks,
            });
        }
        let estimated_samples = if ticks == 0 {
            0
        } else {
            ((ticks - 1) / sample_every) + 1
        };
        if estimated_samples > Self::MAX_EXPERIMENT_SAMPLES {
            return Err(ExperimentError::TooManySamples {
                max: Self::MAX_EXPERIMENT_SAMPLES,
                actual: estimated_samples,
            });
        }

        let fires_before = self.total_fires;
        let mut samples = Vec::with_capacity(estimated_samples);
        for tick in 1..=ticks {
            self.tick(dt_ms);
            if tick % sample_every == 0 || tick == ticks {
                samples.push(self.collect_step_metrics());
            }
        }
        Ok(RunSummary {
            schema_version: 1,
            ticks,
            dt_ms,
            sample_every,
            final_agent_count: self.agents.len(),
            final_stats: self.query_stats(),
            total_fires: self.total_fires.saturating_sub(fires_before),
            samples,
        })
    }
}
