//! Agent movement: random walk, gravity, climbing, friction and
//! axis-separated collision against the grid.

use super::World;
use crate::agent::Agent;
use crate::config::{Layout, SoupConfig};
use crate::grid::Grid;
use crate::tile::Tile;
use rand::Rng;
use tracing::debug;

/// Agents bounced off the far edges are parked this far inside the grid.
pub const EDGE_MARGIN: f64 = 0.1;
/// Gap left above a tile an agent lands on.
const LANDING_GAP: f64 = 0.001;

/// Solid, non-climbable tiles stop side-view movement.
pub(crate) fn blocks(tile: Option<&Tile>) -> bool {
    tile.is_some_and(|t| t.solid() && !t.climbable())
}

/// Advance one agent by `dt` milliseconds. Returns true when the agent's
/// emotion flipped.
pub(crate) fn advance_agent(
    agent: &mut Agent,
    grid: &Grid,
    config: &SoupConfig,
    rng: &mut impl Rng,
    dt: f64,
) -> bool {
    let k = &config.kinematics;
    let collides = config.layout == Layout::SideView;
    let width = grid.width() as f64;
    let height = grid.height() as f64;
    let [mut x, mut y] = agent.position;
    let [mut vx, mut vy] = agent.velocity;

    agent.climbing = collides && grid.tile_at(x, y).is_some_and(|t| t.climbable());
    agent.grounded = y >= height - EDGE_MARGIN
        || (collides && grid.tile_at(x, y + 1.0).is_some_and(|t| t.solid()));

    vx += (rng.random::<f64>() - 0.5) * k.walk_strength;
    vy += (rng.random::<f64>() - 0.5) * k.walk_strength;

    if agent.climbing {
        vy -= k.climb_bias * dt;
        if rng.random::<f64>() < k.climb_release_chance {
            vx = if rng.random::<bool>() {
                k.climb_release_impulse
            } else {
                -k.climb_release_impulse
            };
            agent.climbing = false;
        }
    } else {
        vy += k.gravity * dt;
    }

    let friction = if agent.grounded {
        k.ground_friction
    } else {
        k.air_friction
    };
    vx *= friction;
    vy *= friction;

    let speed_sq = vx * vx + vy * vy;
    if speed_sq > k.max_speed * k.max_speed {
        let scale = k.max_speed / speed_sq.sqrt();
        vx *= scale;
        vy *= scale;
    }

    let step = k.speed_factor * dt;

    let nx = x + vx * step;
    if nx < 0.0 || nx >= width {
        vx = -vx * k.wall_bounce;
        x = nx.clamp(0.0, width - EDGE_MARGIN);
    } else if collides && blocks(grid.tile_at(nx, y)) {
        vx = 0.0;
    } else {
        x = nx;
    }

    let ny = y + vy * step;
    if ny < 0.0 {
        vy = -vy * k.ceiling_bounce;
        y = 0.0;
    } else if ny >= height - EDGE_MARGIN {
        vy = -vy * k.ground_bounce;
        y = height - EDGE_MARGIN;
        agent.grounded = true;
        if rng.random::<f64>() < k.jump_chance {
            vy = -k.jump_velocity;
        }
    } else if collides && blocks(grid.tile_at(x, ny)) {
        if vy > 0.0 {
            agent.grounded = true;
            y = (ny.floor() - LANDING_GAP).max(y);
        }
        vy = 0.0;
    } else {
        y = ny;
    }

    agent.position = [x, y];
    agent.velocity = [vx, vy];
    agent.age_ms += dt;

    if rng.random::<f64>() < k.emotion_flip_chance {
        agent.emotion = agent.emotion.flipped();
        true
    } else {
        false
    }
}

impl World {
    pub(crate) fn step_kinematics_phase(&mut self, dt: f64) {
        for agent in &mut self.agents {
            if advance_agent(agent, &self.grid, &self.config, &mut self.rng, dt) {
                debug!(id = agent.id, emotion = ?agent.emotion, "agent emotion flipped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Emotion;
    use crate::config::KinematicsConfig;
    use crate::tile::TileKind;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    fn still_config(layout: Layout) -> SoupConfig {
        SoupConfig {
            layout,
            ground_row: 4,
            kinematics: KinematicsConfig {
                walk_strength: 0.0,
                gravity: 0.0,
                jump_chance: 0.0,
                emotion_flip_chance: 0.0,
                climb_release_chance: 0.0,
                ..KinematicsConfig::default()
            },
            ..SoupConfig::compact()
        }
    }

    fn side_view_grid() -> Grid {
        Grid::from_fn(8, 8, |x, y| {
            let kind = if y < 4 { TileKind::Air } else { TileKind::Soil };
            Tile::new(x, y, kind, 0.5, 0.5, 1.0)
        })
    }

    #[test]
    fn agent_stays_put_without_forces() {
        let config = still_config(Layout::Flat);
        let grid = Grid::generate(&config, &mut ChaCha12Rng::seed_from_u64(1));
        let mut rng = ChaCha12Rng::seed_from_u64(2);
        let mut agent = Agent::new(0, [3.5, 3.5], Emotion::Joy);
        for _ in 0..50 {
            advance_agent(&mut agent, &grid, &config, &mut rng, 16.0);
        }
        assert_eq!(agent.position, [3.5, 3.5]);
        assert_eq!(agent.age_ms, 800.0);
    }

    #[test]
    fn ceiling_bounce_reverses_upward_velocity() {
        let config = still_config(Layout::Flat);
        let grid = Grid::generate(&config, &mut ChaCha12Rng::seed_from_u64(1));
        let mut rng = ChaCha12Rng::seed_from_u64(2);
        let mut agent = Agent::new(0, [3.5, 0.05], Emotion::Joy);
        agent.velocity = [0.0, -2.0];
        advance_agent(&mut agent, &grid, &config, &mut rng, 50.0);
        assert_eq!(agent.position[1], 0.0);
        assert!(agent.velocity[1] > 0.0);
    }

    #[test]
    fn falling_agent_lands_on_soil() {
        let mut config = still_config(Layout::SideView);
        config.kinematics.gravity = 0.0008;
        let grid = side_view_grid();
        let mut rng = ChaCha12Rng::seed_from_u64(3);
        let mut agent = Agent::new(0, [2.5, 0.5], Emotion::Joy);
        agent.velocity = [0.0, 0.0];
        for _ in 0..400 {
            advance_agent(&mut agent, &grid, &config, &mut rng, 16.0);
        }
        assert!(agent.grounded);
        assert!(agent.position[1] < 4.0);
        assert!(agent.position[1] > 3.0);
        assert_eq!(grid.tile_at(agent.position[0], agent.position[1]).unwrap().kind(), TileKind::Air);
    }

    #[test]
    fn solid_wall_rejects_horizontal_move() {
        let config = still_config(Layout::SideView);
        let mut grid = side_view_grid();
        grid.get_mut(3, 2).unwrap().set_kind(TileKind::Root);
        let mut rng = ChaCha12Rng::seed_from_u64(4);
        let mut agent = Agent::new(0, [2.95, 2.5], Emotion::Joy);
        agent.velocity = [2.0, 0.0];
        advance_agent(&mut agent, &grid, &config, &mut rng, 50.0);
        assert_eq!(agent.position[0], 2.95);
        assert_eq!(agent.velocity[0], 0.0);
    }

    #[test]
    fn trunks_are_climbable_not_blocking() {
        let config = still_config(Layout::SideView);
        let mut grid = side_view_grid();
        grid.get_mut(3, 3).unwrap().set_kind(TileKind::Trunk);
        let mut rng = ChaCha12Rng::seed_from_u64(5);
        let mut agent = Agent::new(0, [3.5, 3.5], Emotion::Joy);
        advance_agent(&mut agent, &grid, &config, &mut rng, 16.0);
        assert!(agent.climbing);
        // climb_bias pulls the agent upward.
        assert!(agent.velocity[1] < 0.0);
    }

    #[test]
    fn emotion_flips_when_certain() {
        let mut config = still_config(Layout::Flat);
        config.kinematics.emotion_flip_chance = 1.0;
        let grid = Grid::generate(&config, &mut ChaCha12Rng::seed_from_u64(1));
        let mut rng = ChaCha12Rng::seed_from_u64(6);
        let mut agent = Agent::new(0, [1.0, 1.0], Emotion::Sorrow);
        assert!(advance_agent(&mut agent, &grid, &config, &mut rng, 16.0));
        assert_eq!(agent.emotion, Emotion::Joy);
    }
}
