//! Resource flow between neighboring tiles, rain, and canopy shading.

use crate::config::{DiffusionConfig, GrowthConfig, Layout};
use crate::grid::Grid;
use crate::tile::{TileKind, LIGHT_FLOOR};
use rand::Rng;
use rayon::prelude::*;

/// Flow of (water, nutrients) into each tile for this pass.
///
/// Every tile moves toward the mean of itself and its 8-neighborhood. Flows are
/// computed from pre-pass values only; nutrients do not move through air.
pub fn compute_flows(grid: &Grid, config: &DiffusionConfig) -> Vec<[f32; 2]> {
    let tiles = grid.tiles();
    (0..tiles.len())
        .into_par_iter()
        .map(|idx| {
            let tile = &tiles[idx];
            let mut water_sum = tile.water();
            let mut water_count = 1u32;
            let carries_nutrients = tile.kind() != TileKind::Air;
            let mut nutrient_sum = tile.nutrients();
            let mut nutrient_count = 1u32;
            for n_idx in grid.neighbor_indices(idx) {
                let neighbor = &tiles[n_idx];
                water_sum += neighbor.water();
                water_count += 1;
                if carries_nutrients && neighbor.kind() != TileKind::Air {
                    nutrient_sum += neighbor.nutrients();
                    nutrient_count += 1;
                }
            }
            let water_flow =
                (water_sum / water_count as f32 - tile.water()) * config.water_flow_rate;
            let nutrient_flow = if carries_nutrients {
                (nutrient_sum / nutrient_count as f32 - tile.nutrients())
                    * config.nutrient_flow_rate
            } else {
                0.0
            };
            [water_flow, nutrient_flow]
        })
        .collect()
}

/// Apply one buffered diffusion pass, soil regeneration, then random rain.
/// Returns the number of tiles that received rain.
pub fn diffuse(grid: &mut Grid, config: &DiffusionConfig, rng: &mut impl Rng) -> usize {
    let flows = compute_flows(grid, config);
    let mut rained = 0;
    for (tile, [water_flow, nutrient_flow]) in grid.tiles_mut().iter_mut().zip(flows) {
        tile.add_water(water_flow);
        tile.add_nutrients(nutrient_flow);
        if matches!(tile.kind(), TileKind::Soil | TileKind::Root)
            && tile.nutrients() < config.soil_regen_ceiling
        {
            let room = config.soil_regen_ceiling - tile.nutrients();
            tile.add_nutrients(config.soil_regen.min(room));
        }
        if rng.random::<f64>() < config.rain_chance {
            tile.add_water(config.rain_amount);
            rained += 1;
        }
    }
    rained
}

/// Light reaching the tile at `index` given the canopy around it.
///
/// Starts from full light and subtracts shade from every taller shading tile
/// within `shade_radius` (Euclidean). Flat layouts shade with tiles whose growth
/// exceeds 1; side-view layouts shade with leaves and branches.
pub fn shaded_light(grid: &Grid, index: usize, layout: Layout, config: &GrowthConfig) -> f32 {
    let tiles = grid.tiles();
    let tile = &tiles[index];
    let radius = config.shade_radius as isize;
    let radius_f = config.shade_radius as f32;
    let (x, y) = (tile.x() as isize, tile.y() as isize);

    let mut light = 1.0f32;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx == 0 && dy == 0 {
                continue;
            }
            let Some(n_idx) = grid.checked_index(x + dx, y + dy) else {
                continue;
            };
            let neighbor = &tiles[n_idx];
            if neighbor.height() <= tile.height() {
                continue;
            }
            let density = match layout {
                Layout::Flat if neighbor.growth() > 1.0 => neighbor.growth() / 2.0,
                Layout::Flat => continue,
                Layout::SideView => match neighbor.kind().canopy_density() {
                    Some(density) => density,
                    None => continue,
                },
            };
            let distance = ((dx * dx + dy * dy) as f32).sqrt();
            if distance > radius_f {
                continue;
            }
            light -= (1.0 - distance / radius_f) * density * config.shade_strength;
        }
    }
    light.clamp(LIGHT_FLOOR, 1.0)
}
