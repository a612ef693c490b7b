use super::World;
use crate::config::Layout;
use crate::grid::base_kind;
use crate::tile::TileKind;
use rand::Rng;
use tracing::info;

impl World {
    /// Accrue fire risk on mature, miserable tiles and roll for clearings.
    /// Returns the number of clearing events started this tick.
    pub(crate) fn step_fire_phase(&mut self) -> usize {
        let mood_threshold = self.config.fire.mood_threshold;
        let maturity = self.config.fire.maturity;
        let risk_rate = self.config.fire.risk_rate;
        let trigger_threshold = self.config.fire.trigger_threshold;
        let fire_chance = self.config.fire.fire_chance;
        let risk_decay = self.config.fire.risk_decay;
        let mut events = 0;
        for idx in 0..self.grid.len() {
            let tile = &mut self.grid.tiles_mut()[idx];
            let ignites = if tile.mood() < mood_threshold && tile.growth() > maturity {
                tile.set_fire_risk(tile.fire_risk() + risk_rate);
                tile.fire_risk() > trigger_threshold && self.rng.random::<f64>() < fire_chance
            } else {
                if tile.mood() > 0.0 && tile.fire_risk() > 0.0 {
                    tile.set_fire_risk(tile.fire_risk() * risk_decay);
                }
                false
            };
            if ignites {
                self.clear_from(idx);
                events += 1;
            }
        }
        self.fires_last_tick = events;
        self.total_fires += events;
        events
    }

    /// Start a clearing at (x, y) regardless of its growth or risk.
    /// Returns the number of tiles cleared, 0 outside the grid.
    pub fn ignite(&mut self, x: usize, y: usize) -> usize {
        if !self.grid.in_bounds(x, y) {
            return 0;
        }
        let idx = self.grid.index(x, y);
        self.clear_from(idx)
    }

    /// Clear `origin` and let the clearing cascade through mature neighbors,
    /// each catching independently with `spread_chance`.
    fn clear_from(&mut self, origin: usize) -> usize {
        let maturity = self.config.fire.maturity;
        let spread_chance = self.config.fire.spread_chance;
        self.clear_tile(origin);
        let mut cleared = 1;
        let mut stack = vec![origin];
        while let Some(idx) = stack.pop() {
            let neighbors: Vec<usize> = self.grid.neighbor_indices(idx).collect();
            for n_idx in neighbors {
                if self.grid.tiles()[n_idx].growth() > maturity
                    && self.rng.random::<f64>() < spread_chance
                {
                    self.clear_tile(n_idx);
                    cleared += 1;
                    stack.push(n_idx);
                }
            }
        }
        let (x, y) = self.grid.coords_of(origin);
        info!(x, y, cleared, "clearing event");
        cleared
    }

    /// Reset one tile to its cleared state. Ash enriches the ground but not
    /// open air.
    pub(crate) fn clear_tile(&mut self, idx: usize) {
        let fire = &self.config.fire;
        let (_, y) = self.grid.coords_of(idx);
        let base = base_kind(&self.config, y);
        let tile = &mut self.grid.tiles_mut()[idx];
        tile.set_growth(0.0);
        tile.set_kind(base);
        if self.config.layout == Layout::Flat {
            tile.set_height(0);
        }
        tile.set_fire_risk(0.0);
        tile.set_mood(fire.mood_boost);
        if base != TileKind::Air {
            tile.add_nutrients(fire.ash_nutrients);
        }
    }
}
