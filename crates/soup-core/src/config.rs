use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How the grid is interpreted.
///
/// `Flat` is a top-down free-space field where every tile is soil and only the
/// scalar growth stage changes. `SideView` places air above `ground_row`, turns
/// on platformer collision and lets structure (roots, trunks, branches, leaves)
/// grow tile by tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    #[default]
    Flat,
    SideView,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KinematicsConfig {
    /// Tiles per millisecond per unit of velocity.
    pub speed_factor: f64,
    pub walk_strength: f64,
    /// Downward acceleration per millisecond. Zero disables verticality.
    pub gravity: f64,
    pub air_friction: f64,
    pub ground_friction: f64,
    pub max_speed: f64,
    pub wall_bounce: f64,
    pub ground_bounce: f64,
    pub ceiling_bounce: f64,
    pub jump_chance: f64,
    pub jump_velocity: f64,
    /// Upward acceleration per millisecond while inside a climbable tile.
    pub climb_bias: f64,
    pub climb_release_chance: f64,
    pub climb_release_impulse: f64,
    pub emotion_flip_chance: f64,
}

impl Default for KinematicsConfig {
    fn default() -> Self {
        Self {
            speed_factor: 0.004,
            walk_strength: 0.04,
            gravity: 0.0008,
            air_friction: 0.98,
            ground_friction: 0.85,
            max_speed: 2.0,
            wall_bounce: 0.8,
            ground_bounce: 0.7,
            ceiling_bounce: 0.5,
            jump_chance: 0.01,
            jump_velocity: 1.2,
            climb_bias: 0.002,
            climb_release_chance: 0.02,
            climb_release_impulse: 1.0,
            emotion_flip_chance: 0.001,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfluenceConfig {
    /// Manhattan radius, in tiles.
    pub radius: usize,
    pub falloff: f32,
    pub accumulation_rate: f32,
    pub seed_chance: f64,
    pub seed_growth: f32,
    /// Growth at or below this counts as "empty" for seed planting.
    pub seed_growth_epsilon: f32,
}

impl Default for InfluenceConfig {
    fn default() -> Self {
        Self {
            radius: 3,
            falloff: 0.5,
            accumulation_rate: 0.02,
            seed_chance: 0.002,
            seed_growth: 0.05,
            seed_growth_epsilon: 0.01,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    pub interval_ms: f64,
    pub min_water: f32,
    pub min_nutrients: f32,
    pub min_light: f32,
    pub min_mood: f32,
    pub min_visits: u64,
    pub base_rate: f32,
    pub max_growth: f32,
    pub water_cost: f32,
    pub nutrient_cost: f32,
    pub mood_decay: f32,
    pub growth_decay: f32,
    pub spread_threshold: f32,
    pub spread_amount: f32,
    pub litter_threshold: f32,
    pub litter_amount: f32,
    /// Euclidean radius, in tiles.
    pub shade_radius: usize,
    pub shade_strength: f32,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            interval_ms: 400.0,
            min_water: 0.3,
            min_nutrients: 0.2,
            min_light: 0.1,
            min_mood: 0.1,
            min_visits: 1,
            base_rate: 0.02,
            max_growth: 2.0,
            water_cost: 0.005,
            nutrient_cost: 0.003,
            mood_decay: 0.9995,
            growth_decay: 0.9998,
            spread_threshold: 0.5,
            spread_amount: 0.02,
            litter_threshold: 1.5,
            litter_amount: 0.001,
            shade_radius: 2,
            shade_strength: 0.2,
        }
    }
}

/// Structural growth rules, used only by [`Layout::SideView`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    pub sprout_threshold: f32,
    pub trunk_extend_threshold: f32,
    pub trunk_cap_threshold: f32,
    pub base_trunk_height: f32,
    pub height_resource_scale: f32,
    pub leaf_mirror_chance: f64,
    pub branch_chance: f64,
    pub branch_leaf_threshold: f32,
    pub root_extend_threshold: f32,
    pub root_extend_chance: f64,
    /// Fraction of the parent's mood and resources handed to a spawned tile.
    pub spawn_inheritance: f32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            sprout_threshold: 0.1,
            trunk_extend_threshold: 0.3,
            trunk_cap_threshold: 1.0,
            base_trunk_height: 3.0,
            height_resource_scale: 6.0,
            leaf_mirror_chance: 0.5,
            branch_chance: 0.04,
            branch_leaf_threshold: 0.5,
            root_extend_threshold: 0.5,
            root_extend_chance: 0.1,
            spawn_inheritance: 0.8,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffusionConfig {
    pub water_flow_rate: f32,
    pub nutrient_flow_rate: f32,
    pub rain_chance: f64,
    pub rain_amount: f32,
    /// Nutrients returned to each soil and root tile per pass, up to
    /// `soil_regen_ceiling`.
    pub soil_regen: f32,
    pub soil_regen_ceiling: f32,
}

impl Default for DiffusionConfig {
    fn default() -> Self {
        Self {
            water_flow_rate: 0.1,
            nutrient_flow_rate: 0.02,
            rain_chance: 0.0005,
            rain_amount: 0.1,
            soil_regen: 0.0,
            soil_regen_ceiling: 0.6,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FireConfig {
    pub mood_threshold: f32,
    pub maturity: f32,
    pub risk_rate: f32,
    pub trigger_threshold: f32,
    pub fire_chance: f64,
    pub risk_decay: f32,
    pub spread_chance: f64,
    pub mood_boost: f32,
    pub ash_nutrients: f32,
}

impl Default for FireConfig {
    fn default() -> Self {
        Self {
            mood_threshold: -0.7,
            maturity: 1.0,
            risk_rate: 0.01,
            trigger_threshold: 0.1,
            fire_chance: 0.05,
            risk_decay: 0.99,
            spread_chance: 0.3,
            mood_boost: 0.1,
            ash_nutrients: 0.2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoupConfig {
    pub seed: u64,
    pub width: usize,
    pub height: usize,
    pub initial_agents: usize,
    pub layout: Layout,
    /// First soil row in [`Layout::SideView`]; rows above it start as air.
    pub ground_row: usize,
    pub water_seed: [f32; 2],
    pub nutrient_seed: [f32; 2],
    pub light_seed: [f32; 2],
    /// Growth above which a tile counts as mature in statistics.
    pub mature_threshold: f32,
    pub kinematics: KinematicsConfig,
    pub influence: InfluenceConfig,
    pub growth: GrowthConfig,
    pub tree: TreeConfig,
    pub diffusion: DiffusionConfig,
    pub fire: FireConfig,
}

impl Default for SoupConfig {
    fn default() -> Self {
        Self::large()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimConfigError {
    #[error("grid dimensions must be non-zero (got {width}x{height})")]
    EmptyGrid { width: usize, height: usize },
    #[error("grid dimension {actual} exceeds supported maximum ({max})")]
    GridTooLarge { max: usize, actual: usize },
    #[error("initial_agents ({actual}) exceeds supported maximum ({max})")]
    TooManyAgents { max: usize, actual: usize },
    #[error("ground_row ({ground_row}) must lie inside the grid height ({height})")]
    GroundOutsideGrid { ground_row: usize, height: usize },
    #[error("side view needs at least one air row above ground_row")]
    NoAirRows,
    #[error("{name} seed range must satisfy 0 <= min <= max <= 1")]
    InvalidSeedRange { name: &'static str },
    #[error("{name} must be positive and finite")]
    NonPositive { name: &'static str },
    #[error("{name} must be non-negative and finite")]
    Negative { name: &'static str },
    #[error("{name} must be a probability in [0, 1]")]
    InvalidProbability { name: &'static str },
    #[error("influence radius must be at least 1")]
    ZeroInfluenceRadius,
}

impl SoupConfig {
    pub const MAX_GRID_DIMENSION: usize = 4096;
    pub const MAX_TOTAL_AGENTS: usize = 100_000;

    /// 8x8 free-space grid.
    pub fn compact() -> Self {
        Self {
            seed: 42,
            width: 8,
            height: 8,
            initial_agents: 3,
            layout: Layout::Flat,
            ground_row: 0,
            water_seed: [0.3, 0.6],
            nutrient_seed: [0.2, 0.6],
            light_seed: [1.0, 1.0],
            mature_threshold: 1.5,
            kinematics: KinematicsConfig {
                gravity: 0.0,
                jump_chance: 0.0,
                speed_factor: 0.002,
                ..KinematicsConfig::default()
            },
            influence: InfluenceConfig {
                radius: 2,
                ..InfluenceConfig::default()
            },
            growth: GrowthConfig {
                interval_ms: 200.0,
                ..GrowthConfig::default()
            },
            tree: TreeConfig::default(),
            diffusion: DiffusionConfig {
                rain_chance: 0.002,
                ..DiffusionConfig::default()
            },
            fire: FireConfig::default(),
        }
    }

    /// 32x32 free-space grid with gravity and a bouncing floor.
    pub fn large() -> Self {
        Self {
            seed: 42,
            width: 32,
            height: 32,
            initial_agents: 12,
            layout: Layout::Flat,
            ground_row: 0,
            water_seed: [0.3, 0.6],
            nutrient_seed: [0.2, 0.6],
            light_seed: [1.0, 1.0],
            mature_threshold: 1.5,
            kinematics: KinematicsConfig::default(),
            influence: InfluenceConfig::default(),
            growth: GrowthConfig::default(),
            tree: TreeConfig::default(),
            diffusion: DiffusionConfig::default(),
            fire: FireConfig::default(),
        }
    }

    /// Side-view grid with air above ground, collision and tree growth.
    pub fn side_view() -> Self {
        Self {
            seed: 42,
            width: 48,
            height: 32,
            initial_agents: 10,
            layout: Layout::SideView,
            ground_row: 22,
            water_seed: [0.35, 0.7],
            nutrient_seed: [0.3, 0.7],
            light_seed: [1.0, 1.0],
            mature_threshold: 1.5,
            kinematics: KinematicsConfig {
                jump_chance: 0.02,
                ..KinematicsConfig::default()
            },
            influence: InfluenceConfig::default(),
            growth: GrowthConfig::default(),
            tree: TreeConfig {
                base_trunk_height: 2.0,
                height_resource_scale: 4.0,
                ..TreeConfig::default()
            },
            diffusion: DiffusionConfig {
                rain_chance: 0.001,
                // Ground slowly recovers what roots and trunks draw out of it.
                soil_regen: 0.0002,
                ..DiffusionConfig::default()
            },
            fire: FireConfig::default(),
        }
    }

    /// Look up a preset by name (`compact`, `large`, `side_view`).
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "compact" => Some(Self::compact()),
            "large" => Some(Self::large()),
            "side_view" | "side-view" => Some(Self::side_view()),
            _ => None,
        }
    }

    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn tile_count(&self) -> usize {
        self.width * self.height
    }

    pub fn validate(&self) -> Result<(), SimConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(SimConfigError::EmptyGrid {
                width: self.width,
                height: self.height,
            });
        }
        let largest = self.width.max(self.height);
        if largest > Self::MAX_GRID_DIMENSION {
            return Err(SimConfigError::GridTooLarge {
                max: Self::MAX_GRID_DIMENSION,
                actual: largest,
            });
        }
        if self.initial_agents > Self::MAX_TOTAL_AGENTS {
            return Err(SimConfigError::TooManyAgents {
                max: Self::MAX_TOTAL_AGENTS,
                actual: self.initial_agents,
            });
        }
        if self.layout == Layout::SideView && self.ground_row >= self.height {
            return Err(SimConfigError::GroundOutsideGrid {
                ground_row: self.ground_row,
                height: self.height,
            });
        }
        if self.layout == Layout::SideView && self.ground_row == 0 {
            return Err(SimConfigError::NoAirRows);
        }
        for (name, range) in [
            ("water", self.water_seed),
            ("nutrient", self.nutrient_seed),
            ("light", self.light_seed),
        ] {
            if !(range[0].is_finite()
                && range[1].is_finite()
                && 0.0 <= range[0]
                && range[0] <= range[1]
                && range[1] <= 1.0)
            {
                return Err(SimConfigError::InvalidSeedRange { name });
            }
        }
        if self.influence.radius == 0 {
            return Err(SimConfigError::ZeroInfluenceRadius);
        }

        let k = &self.kinematics;
        positive("speed_factor", k.speed_factor)?;
        positive("max_speed", k.max_speed)?;
        non_negative("walk_strength", k.walk_strength)?;
        non_negative("gravity", k.gravity)?;
        non_negative("jump_velocity", k.jump_velocity)?;
        non_negative("climb_bias", k.climb_bias)?;
        non_negative("climb_release_impulse", k.climb_release_impulse)?;
        for (name, value) in [
            ("air_friction", k.air_friction),
            ("ground_friction", k.ground_friction),
            ("wall_bounce", k.wall_bounce),
            ("ground_bounce", k.ground_bounce),
            ("ceiling_bounce", k.ceiling_bounce),
            ("jump_chance", k.jump_chance),
            ("climb_release_chance", k.climb_release_chance),
            ("emotion_flip_chance", k.emotion_flip_chance),
            ("seed_chance", self.influence.seed_chance),
            ("leaf_mirror_chance", self.tree.leaf_mirror_chance),
            ("branch_chance", self.tree.branch_chance),
            ("root_extend_chance", self.tree.root_extend_chance),
            ("rain_chance", self.diffusion.rain_chance),
            ("fire_chance", self.fire.fire_chance),
            ("fire_spread_chance", self.fire.spread_chance),
        ] {
            probability(name, value)?;
        }

        let g = &self.growth;
        positive("growth interval_ms", g.interval_ms)?;
        positive("max_growth", g.max_growth as f64)?;
        for (name, value) in [
            ("falloff", self.influence.falloff),
            ("accumulation_rate", self.influence.accumulation_rate),
            ("seed_growth", self.influence.seed_growth),
            ("base_rate", g.base_rate),
            ("water_cost", g.water_cost),
            ("nutrient_cost", g.nutrient_cost),
            ("spread_amount", g.spread_amount),
            ("litter_amount", g.litter_amount),
            ("shade_strength", g.shade_strength),
            ("base_trunk_height", self.tree.base_trunk_height),
            ("height_resource_scale", self.tree.height_resource_scale),
            ("water_flow_rate", self.diffusion.water_flow_rate),
            ("nutrient_flow_rate", self.diffusion.nutrient_flow_rate),
            ("rain_amount", self.diffusion.rain_amount),
            ("soil_regen", self.diffusion.soil_regen),
            ("risk_rate", self.fire.risk_rate),
            ("ash_nutrients", self.fire.ash_nutrients),
        ] {
            non_negative(name, value as f64)?;
        }
        for (name, value) in [
            ("mood_decay", g.mood_decay),
            ("growth_decay", g.growth_decay),
            ("spawn_inheritance", self.tree.spawn_inheritance),
            ("fire risk_decay", self.fire.risk_decay),
            ("water_flow_rate", self.diffusion.water_flow_rate),
            ("nutrient_flow_rate", self.diffusion.nutrient_flow_rate),
            ("soil_regen_ceiling", self.diffusion.soil_regen_ceiling),
        ] {
            probability(name, value as f64)?;
        }
        Ok(())
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), SimConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimConfigError::NonPositive { name })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), SimConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimConfigError::Negative { name })
    }
}

fn probability(name: &'static str, value: f64) -> Result<(), SimConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimConfigError::InvalidProbability { name })
    }
}
