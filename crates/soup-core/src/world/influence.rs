use super::World;
use crate::agent::{Agent, Emotion};
use crate::config::{InfluenceConfig, Layout};
use crate::grid::Grid;
use crate::tile::TileKind;
use rand::Rng;
use tracing::debug;

/// Project every agent's emotion onto the tiles within Manhattan `radius` of it,
/// then fold the accumulated influence into tile mood.
///
/// Influence is scratch state: it is cleared first, so nothing carries over
/// between ticks. Visits count every tile in range, including those at the
/// radius where the influence itself is zero.
pub(crate) fn project_influence(grid: &mut Grid, agents: &[Agent], config: &InfluenceConfig) {
    for tile in grid.tiles_mut() {
        tile.reset_influence();
    }

    let radius = config.radius as isize;
    let radius_f = config.radius as f32;
    for agent in agents {
        let (ax, ay) = agent.tile_coords();
        let (ax, ay) = (ax as isize, ay as isize);
        let sign = agent.emotion.sign();
        for dy in -radius..=radius {
            let span = radius - dy.abs();
            for dx in -span..=span {
                let Some(idx) = grid.checked_index(ax + dx, ay + dy) else {
                    continue;
                };
                let distance = (dx.abs() + dy.abs()) as f32;
                let tile = &mut grid.tiles_mut()[idx];
                tile.add_influence(sign * (1.0 - distance / radius_f) * config.falloff);
                tile.record_visit();
            }
        }
    }

    for tile in grid.tiles_mut() {
        let influence = tile.influence();
        if influence != 0.0 {
            tile.add_mood(influence * config.accumulation_rate);
        }
    }
}

/// Where a joyful agent's seed would land, if anywhere.
///
/// An agent standing on bare soil plants right below itself. An agent inside a
/// young branch drops the seed down its column onto the first bare soil tile.
fn seed_target(grid: &Grid, agent: &Agent, epsilon: f32) -> Option<usize> {
    let (x, y) = agent.tile_coords();
    let bare_soil = |row: usize| {
        grid.get(x, row)
            .is_some_and(|t| t.kind() == TileKind::Soil && t.growth() <= epsilon)
    };
    let here = grid.get(x, y)?;
    let row = if here.kind() == TileKind::Branch {
        if here.growth() > epsilon {
            return None;
        }
        (y + 1..grid.height()).find(|&row| bare_soil(row))?
    } else {
        let below = y + 1;
        bare_soil(below).then_some(below)?
    };
    Some(grid.index(x, row))
}

impl World {
    pub(crate) fn step_influence_phase(&mut self) {
        project_influence(&mut self.grid, &self.agents, &self.config.influence);
        if self.config.layout == Layout::SideView {
            self.seeds_last_tick = self.plant_seeds();
        }
    }

    fn plant_seeds(&mut self) -> usize {
        let config = &self.config.influence;
        let mut planted = 0;
        for agent in &self.agents {
            if agent.emotion != Emotion::Joy {
                continue;
            }
            let Some(target) = seed_target(&self.grid, agent, config.seed_growth_epsilon) else {
                continue;
            };
            if self.rng.random::<f64>() < config.seed_chance {
                let tile = &mut self.grid.tiles_mut()[target];
                tile.set_growth(config.seed_growth);
                debug!(agent = agent.id, x = tile.x(), y = tile.y(), "seed planted");
                planted += 1;
            }
        }
        planted
    }
}
