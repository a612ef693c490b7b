use serde::{Deserialize, Serialize};

/// Ambient light never drops below this, even under dense canopy.
pub const LIGHT_FLOOR: f32 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    Air,
    Soil,
    Root,
    Trunk,
    Branch,
    Leaf,
}

impl TileKind {
    pub const ALL: [TileKind; 6] = [
        TileKind::Air,
        TileKind::Soil,
        TileKind::Root,
        TileKind::Trunk,
        TileKind::Branch,
        TileKind::Leaf,
    ];

    pub fn is_solid(self) -> bool {
        match self {
            TileKind::Soil | TileKind::Root | TileKind::Trunk | TileKind::Branch => true,
            TileKind::Air | TileKind::Leaf => false,
        }
    }

    pub fn is_climbable(self) -> bool {
        match self {
            TileKind::Trunk | TileKind::Branch => true,
            TileKind::Air | TileKind::Soil | TileKind::Root | TileKind::Leaf => false,
        }
    }

    /// Leaves and branches shade what lies below them.
    pub fn canopy_density(self) -> Option<f32> {
        match self {
            TileKind::Leaf => Some(1.0),
            TileKind::Branch => Some(0.5),
            TileKind::Air | TileKind::Soil | TileKind::Root | TileKind::Trunk => None,
        }
    }

    pub fn is_structure(self) -> bool {
        match self {
            TileKind::Root | TileKind::Trunk | TileKind::Branch | TileKind::Leaf => true,
            TileKind::Air | TileKind::Soil => false,
        }
    }

    pub fn glyph(self) -> char {
        match self {
            TileKind::Air => ' ',
            TileKind::Soil => '.',
            TileKind::Root => '~',
            TileKind::Trunk => '|',
            TileKind::Branch => '-',
            TileKind::Leaf => '*',
        }
    }

    pub(crate) fn ordinal(self) -> usize {
        match self {
            TileKind::Air => 0,
            TileKind::Soil => 1,
            TileKind::Root => 2,
            TileKind::Trunk => 3,
            TileKind::Branch => 4,
            TileKind::Leaf => 5,
        }
    }
}

/// Coarse growth stage used by the flat layouts, where tile kind never changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthStage {
    Bare,
    Growing,
    Mature,
}

impl GrowthStage {
    pub fn classify(growth: f32, mature_threshold: f32) -> Self {
        if growth <= 0.0 {
            GrowthStage::Bare
        } else if growth > mature_threshold {
            GrowthStage::Mature
        } else {
            GrowthStage::Growing
        }
    }
}

/// One grid cell.
///
/// Bounded quantities are private and clamped by every setter, so mood stays in
/// [-1, 1], water and nutrients in [0, 1] and light in [`LIGHT_FLOOR`, 1].
#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    x: usize,
    y: usize,
    kind: TileKind,
    solid: bool,
    climbable: bool,
    mood: f32,
    visits: u64,
    growth: f32,
    water: f32,
    nutrients: f32,
    light: f32,
    fire_risk: f32,
    height: i32,
    last_update_ms: f64,
    influence: f32,
}

impl Tile {
    pub fn new(x: usize, y: usize, kind: TileKind, water: f32, nutrients: f32, light: f32) -> Self {
        Self {
            x,
            y,
            kind,
            solid: kind.is_solid(),
            climbable: kind.is_climbable(),
            mood: 0.0,
            visits: 0,
            growth: 0.0,
            water: water.clamp(0.0, 1.0),
            nutrients: nutrients.clamp(0.0, 1.0),
            light: light.clamp(LIGHT_FLOOR, 1.0),
            fire_risk: 0.0,
            height: 0,
            last_update_ms: 0.0,
            influence: 0.0,
        }
    }

    pub fn x(&self) -> usize {
        self.x
    }

    pub fn y(&self) -> usize {
        self.y
    }

    pub fn kind(&self) -> TileKind {
        self.kind
    }

    pub fn solid(&self) -> bool {
        self.solid
    }

    pub fn climbable(&self) -> bool {
        self.climbable
    }

    pub fn mood(&self) -> f32 {
        self.mood
    }

    pub fn visits(&self) -> u64 {
        self.visits
    }

    pub fn growth(&self) -> f32 {
        self.growth
    }

    pub fn water(&self) -> f32 {
        self.water
    }

    pub fn nutrients(&self) -> f32 {
        self.nutrients
    }

    pub fn light(&self) -> f32 {
        self.light
    }

    pub fn fire_risk(&self) -> f32 {
        self.fire_risk
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn last_update_ms(&self) -> f64 {
        self.last_update_ms
    }

    pub fn influence(&self) -> f32 {
        self.influence
    }

    /// Changing kind also refreshes the derived collision flags.
    pub fn set_kind(&mut self, kind: TileKind) {
        self.kind = kind;
        self.solid = kind.is_solid();
        self.climbable = kind.is_climbable();
    }

    pub fn set_mood(&mut self, mood: f32) {
        self.mood = mood.clamp(-1.0, 1.0);
    }

    pub fn add_mood(&mut self, delta: f32) {
        self.set_mood(self.mood + delta);
    }

    pub fn set_growth(&mut self, growth: f32) {
        self.growth = growth.max(0.0);
    }

    pub fn set_water(&mut self, water: f32) {
        self.water = water.clamp(0.0, 1.0);
    }

    pub fn add_water(&mut self, delta: f32) {
        self.set_water(self.water + delta);
    }

    pub fn set_nutrients(&mut self, nutrients: f32) {
        self.nutrients = nutrients.clamp(0.0, 1.0);
    }

    pub fn add_nutrients(&mut self, delta: f32) {
        self.set_nutrients(self.nutrients + delta);
    }

    pub fn set_light(&mut self, light: f32) {
        self.light = light.clamp(LIGHT_FLOOR, 1.0);
    }

    pub fn set_fire_risk(&mut self, risk: f32) {
        self.fire_risk = risk.max(0.0);
    }

    pub fn set_height(&mut self, height: i32) {
        self.height = height;
    }

    /// Visits never go down; a lower value is ignored.
    pub fn raise_visits(&mut self, visits: u64) {
        self.visits = self.visits.max(visits);
    }

    pub(crate) fn record_visit(&mut self) {
        self.visits = self.visits.saturating_add(1);
    }

    pub(crate) fn set_last_update_ms(&mut self, now_ms: f64) {
        self.last_update_ms = now_ms;
    }

    pub(crate) fn reset_influence(&mut self) {
        self.influence = 0.0;
    }

    pub(crate) fn add_influence(&mut self, delta: f32) {
        self.influence += delta;
    }

    pub fn stage(&self, mature_threshold: f32) -> GrowthStage {
        GrowthStage::classify(self.growth, mature_threshold)
    }

    pub fn snapshot(&self) -> TileSnapshot {
        TileSnapshot {
            x: self.x,
            y: self.y,
            kind: self.kind,
            solid: self.solid,
            climbable: self.climbable,
            mood: self.mood,
            visits: self.visits,
            growth: self.growth,
            water: self.water,
            nutrients: self.nutrients,
            light: self.light,
            fire_risk: self.fire_risk,
            height: self.height,
            influence: self.influence,
            nearby_agents: 0,
        }
    }
}

/// Read-only copy of a tile for presentation and debug overlays.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileSnapshot {
    pub x: usize,
    pub y: usize,
    pub kind: TileKind,
    pub solid: bool,
    pub climbable: bool,
    pub mood: f32,
    pub visits: u64,
    pub growth: f32,
    pub water: f32,
    pub nutrients: f32,
    pub light: f32,
    pub fire_risk: f32,
    pub height: i32,
    pub influence: f32,
    /// Agents within the influence radius of the tile centre.
    pub nearby_agents: usize,
}
