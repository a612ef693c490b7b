use crate::config::{Layout, SoupConfig};
use crate::tile::{Tile, TileKind};
use rand::Rng;

/// Dense row-major tile grid.
/// Index of (x, y) is `y * width + x`; nothing wraps at the edges.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    width: usize,
    height: usize,
    tiles: Vec<Tile>,
}

const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

impl Grid {
    /// Build a grid where every tile is produced by `make(x, y)`.
    pub fn from_fn(width: usize, height: usize, mut make: impl FnMut(usize, usize) -> Tile) -> Self {
        assert!(width > 0 && height > 0, "grid dimensions must be non-zero");
        let mut tiles = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                tiles.push(make(x, y));
            }
        }
        Self {
            width,
            height,
            tiles,
        }
    }

    /// Seed a fresh grid from the configured resource ranges.
    ///
    /// Side-view air tiles hold some moisture but no nutrients.
    pub fn generate(config: &SoupConfig, rng: &mut impl Rng) -> Self {
        let mut sample = |range: [f32; 2]| -> f32 {
            if range[1] > range[0] {
                range[0] + rng.random::<f32>() * (range[1] - range[0])
            } else {
                range[0]
            }
        };
        Self::from_fn(config.width, config.height, |x, y| {
            let kind = base_kind(config, y);
            let water = sample(config.water_seed);
            let nutrients = sample(config.nutrient_seed);
            let light = sample(config.light_seed);
            let nutrients = if kind == TileKind::Air { 0.0 } else { nutrients };
            let mut tile = Tile::new(x, y, kind, water, nutrients, light);
            if config.layout == Layout::SideView {
                tile.set_height(structural_height(config, y));
            }
            tile
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub(crate) fn tiles_mut(&mut self) -> &mut [Tile] {
        &mut self.tiles
    }

    pub fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(self.in_bounds(x, y), "({x}, {y}) outside grid");
        y * self.width + x
    }

    pub fn coords_of(&self, index: usize) -> (usize, usize) {
        debug_assert!(index < self.tiles.len(), "index {index} outside grid");
        (index % self.width, index / self.width)
    }

    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    /// Signed variant of [`Grid::in_bounds`] returning the index when valid.
    pub fn checked_index(&self, x: isize, y: isize) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        self.in_bounds(x, y).then(|| y * self.width + x)
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&Tile> {
        if self.in_bounds(x, y) {
            Some(&self.tiles[y * self.width + x])
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut Tile> {
        if self.in_bounds(x, y) {
            let idx = y * self.width + x;
            Some(&mut self.tiles[idx])
        } else {
            None
        }
    }

    /// Tile under a continuous position, floored. `None` outside the grid.
    pub fn tile_at(&self, fx: f64, fy: f64) -> Option<&Tile> {
        if !(fx.is_finite() && fy.is_finite()) || fx < 0.0 || fy < 0.0 {
            return None;
        }
        self.get(fx.floor() as usize, fy.floor() as usize)
    }

    /// In-bounds 8-neighborhood of (x, y), up to 8 entries.
    pub fn neighbors8(&self, x: usize, y: usize) -> impl Iterator<Item = (usize, usize)> {
        let (width, height) = (self.width as isize, self.height as isize);
        let (cx, cy) = (x as isize, y as isize);
        NEIGHBOR_OFFSETS.iter().filter_map(move |&(dx, dy)| {
            let (nx, ny) = (cx + dx, cy + dy);
            (nx >= 0 && ny >= 0 && nx < width && ny < height).then_some((nx as usize, ny as usize))
        })
    }

    /// Same as [`Grid::neighbors8`] but yields flat indices.
    pub fn neighbor_indices(&self, index: usize) -> impl Iterator<Item = usize> {
        let (x, y) = self.coords_of(index);
        let width = self.width;
        self.neighbors8(x, y).map(move |(nx, ny)| ny * width + nx)
    }

    pub fn count_kind(&self, kind: TileKind) -> usize {
        self.tiles.iter().filter(|t| t.kind() == kind).count()
    }
}

/// Kind a tile at row `y` starts as, and reverts to after clearing.
pub fn base_kind(config: &SoupConfig, y: usize) -> TileKind {
    match config.layout {
        Layout::Flat => TileKind::Soil,
        Layout::SideView if y < config.ground_row => TileKind::Air,
        Layout::SideView => TileKind::Soil,
    }
}

/// Rows above the ground row; negative underground.
pub fn structural_height(config: &SoupConfig, y: usize) -> i32 {
    config.ground_row as i32 - y as i32
}
