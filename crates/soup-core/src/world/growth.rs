//! Per-tile growth: rate-limited eligibility, resource-limited growth,
//! spreading, shading, decay and (side view) structural spawning.
//!
//! Structural spawning never writes another tile directly. Tiles emit
//! [`SpawnIntent`]s during the pass; intents are resolved first-wins in tile
//! order and applied once the pass is over.

use super::World;
use crate::config::Layout;
use crate::diffusion::shaded_light;
use crate::tile::{Tile, TileKind};
use rand::Rng;
use std::collections::HashSet;

/// Parent values handed down to a spawned tile, captured when the intent is
/// emitted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Inheritance {
    pub mood: f32,
    pub water: f32,
    pub nutrients: f32,
    pub light: f32,
    pub visits: u64,
}

impl Inheritance {
    fn from_parent(tile: &Tile) -> Self {
        Self {
            mood: tile.mood(),
            water: tile.water(),
            nutrients: tile.nutrients(),
            light: tile.light(),
            visits: tile.visits(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct SpawnIntent {
    pub target: usize,
    pub kind: TileKind,
    /// Kind the target must still have when the intent is applied.
    pub expected: TileKind,
    pub parent: Inheritance,
}

/// Whether a tile's kind allows growth at all in this layout.
fn kind_can_grow(layout: Layout, tile: &Tile) -> bool {
    match layout {
        Layout::Flat => true,
        Layout::SideView => match tile.kind() {
            TileKind::Air => false,
            TileKind::Soil => tile.growth() > 0.0,
            TileKind::Root | TileKind::Trunk | TileKind::Branch | TileKind::Leaf => true,
        },
    }
}

impl World {
    /// Run the growth pass over every tile whose interval has elapsed.
    /// Returns the number of spawn intents applied.
    pub(crate) fn step_growth_phase(&mut self) -> usize {
        let now = self.clock_ms;
        let interval = self.config.growth.interval_ms;
        let mut intents = Vec::new();

        for idx in 0..self.grid.len() {
            if now - self.grid.tiles()[idx].last_update_ms() <= interval {
                continue;
            }
            self.grid.tiles_mut()[idx].set_last_update_ms(now);

            if self.growth_eligible(idx) {
                self.grow_tile(idx);
                if self.grid.tiles()[idx].growth() > self.config.growth.spread_threshold {
                    self.spread_from(idx);
                }
                if self.config.layout == Layout::SideView {
                    self.plan_structure(idx, &mut intents);
                }
            }

            let light = shaded_light(&self.grid, idx, self.config.layout, &self.config.growth);
            let growth = &self.config.growth;
            let tile = &mut self.grid.tiles_mut()[idx];
            tile.set_light(light);
            if tile.influence() == 0.0 {
                tile.set_mood(tile.mood() * growth.mood_decay);
                tile.set_growth(tile.growth() * growth.growth_decay);
            }
        }

        self.apply_spawn_intents(intents, now)
    }

    pub(crate) fn growth_eligible(&self, idx: usize) -> bool {
        let g = &self.config.growth;
        let tile = &self.grid.tiles()[idx];
        tile.water() > g.min_water
            && tile.nutrients() > g.min_nutrients
            && tile.light() > g.min_light
            && tile.mood() > g.min_mood
            && tile.visits() > g.min_visits
            && kind_can_grow(self.config.layout, tile)
    }

    /// Liebig-style growth: the scarcest of water, nutrients and light sets the
    /// pace, and growth slows as it approaches the cap.
    fn grow_tile(&mut self, idx: usize) {
        let g = &self.config.growth;
        let layout = self.config.layout;
        let tile = &mut self.grid.tiles_mut()[idx];
        let before = tile.growth();
        let limiting = tile.water().min(tile.nutrients()).min(tile.light());
        let rate = g.base_rate * limiting * (1.0 - before / g.max_growth);
        let after = (before + rate).min(g.max_growth);
        tile.set_growth(after);
        if layout == Layout::Flat && after > before {
            tile.set_height((after * 10.0).floor() as i32);
        }
        tile.add_water(-g.water_cost);
        tile.add_nutrients(-g.nutrient_cost);
    }

    /// Push mood (and leaf litter from mature canopy) into the 3x3 neighborhood.
    ///
    /// Tall tiles favor horizontal neighbors: the bias is `height * 0.1`,
    /// counted for every flat tile and for canopy kinds in side view.
    pub(crate) fn spread_from(&mut self, idx: usize) {
        let g = &self.config.growth;
        let layout = self.config.layout;
        let (x, y) = self.grid.coords_of(idx);
        let source = &self.grid.tiles()[idx];
        let mood = source.mood();
        let sheds = layout == Layout::Flat || source.kind().canopy_density().is_some();
        let litter = sheds && source.growth() > g.litter_threshold;
        let bias = match layout {
            Layout::Flat => source.height() as f32 * 0.1,
            Layout::SideView if source.kind().canopy_density().is_some() => {
                source.height() as f32 * 0.1
            }
            Layout::SideView => 0.0,
        };

        for dy in -1isize..=1 {
            for dx in -1isize..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let Some(n_idx) = self.grid.checked_index(x as isize + dx, y as isize + dy) else {
                    continue;
                };
                let distance = ((dx * dx + dy * dy) as f32).sqrt();
                let multiplier = if dx.abs() > dy.abs() {
                    1.0 + bias
                } else {
                    (1.0 - bias * 0.5).max(0.0)
                };
                let neighbor = &mut self.grid.tiles_mut()[n_idx];
                neighbor.add_mood(g.spread_amount * mood / distance * multiplier);
                if litter && (layout == Layout::Flat || neighbor.kind() != TileKind::Air) {
                    neighbor.add_nutrients(g.litter_amount);
                }
            }
        }
    }

    fn kind_at(&self, x: isize, y: isize) -> Option<(usize, TileKind)> {
        let idx = self.grid.checked_index(x, y)?;
        Some((idx, self.grid.tiles()[idx].kind()))
    }

    /// Emit spawn intents for one eligible side-view tile.
    fn plan_structure(&mut self, idx: usize, intents: &mut Vec<SpawnIntent>) {
        let (x, y) = self.grid.coords_of(idx);
        let (x, y) = (x as isize, y as isize);
        let tile = &self.grid.tiles()[idx];
        let parent = Inheritance::from_parent(tile);
        let growth = tile.growth();
        let kind = tile.kind();

        let mut push = |target: Option<(usize, TileKind)>, kind: TileKind, expected: TileKind| {
            if let Some((target, current)) = target {
                if current == expected {
                    intents.push(SpawnIntent {
                        target,
                        kind,
                        expected,
                        parent,
                    });
                }
            }
        };

        let tree = &self.config.tree;
        match kind {
            TileKind::Soil if growth > tree.sprout_threshold => {
                if self.kind_at(x, y - 1).is_some_and(|(_, k)| k == TileKind::Air) {
                    push(self.kind_at(x, y - 1), TileKind::Trunk, TileKind::Air);
                    push(self.kind_at(x, y + 1), TileKind::Root, TileKind::Soil);
                    self.grid.tiles_mut()[idx].set_kind(TileKind::Root);
                }
            }
            TileKind::Trunk if growth > tree.trunk_extend_threshold => {
                let max_height =
                    tree.base_trunk_height + (parent.water + parent.nutrients) * tree.height_resource_scale;
                let height = self.grid.tiles()[idx].height() as f32;
                if height < max_height && growth <= tree.trunk_cap_threshold {
                    push(self.kind_at(x, y - 1), TileKind::Trunk, TileKind::Air);
                } else {
                    push(self.kind_at(x, y - 1), TileKind::Leaf, TileKind::Air);
                    if self.rng.random::<f64>() < tree.leaf_mirror_chance {
                        push(self.kind_at(x - 1, y - 1), TileKind::Leaf, TileKind::Air);
                        push(self.kind_at(x + 1, y - 1), TileKind::Leaf, TileKind::Air);
                    }
                }
                let reach = if max_height > 0.0 {
                    (height / max_height).clamp(0.0, 1.0) as f64
                } else {
                    1.0
                };
                if self.rng.random::<f64>() < tree.branch_chance * reach {
                    let side = if self.rng.random::<bool>() { 1 } else { -1 };
                    push(self.kind_at(x + side, y), TileKind::Branch, TileKind::Air);
                }
            }
            TileKind::Branch if growth > tree.branch_leaf_threshold => {
                push(self.kind_at(x, y - 1), TileKind::Leaf, TileKind::Air);
            }
            TileKind::Root if growth > tree.root_extend_threshold => {
                if self.rng.random::<f64>() < tree.root_extend_chance {
                    push(self.kind_at(x, y + 1), TileKind::Root, TileKind::Soil);
                }
            }
            _ => {}
        }
    }

    /// Apply intents in emission order. The first intent to claim a target wins;
    /// later claims and targets whose kind changed since planning are dropped.
    pub(crate) fn apply_spawn_intents(&mut self, intents: Vec<SpawnIntent>, now: f64) -> usize {
        let inheritance = self.config.tree.spawn_inheritance;
        let mut claimed = HashSet::with_capacity(intents.len());
        let mut applied = 0;
        for intent in intents {
            if !claimed.insert(intent.target) {
                continue;
            }
            let tile = &mut self.grid.tiles_mut()[intent.target];
            if tile.kind() != intent.expected {
                continue;
            }
            tile.set_kind(intent.kind);
            tile.set_mood(intent.parent.mood * inheritance);
            tile.set_water(intent.parent.water * inheritance);
            tile.set_nutrients(intent.parent.nutrients * inheritance);
            tile.set_light(intent.parent.light * inheritance);
            tile.raise_visits(intent.parent.visits);
            tile.set_growth(0.0);
            tile.set_last_update_ms(now);
            applied += 1;
        }
        self.spawns_last_tick = applied;
        applied
    }
}
