use soup_core::{Emotion, GrowthStage, Layout, World};

/// Two characters per tile so the frame keeps roughly square cells.
fn tile_glyphs(world: &World, x: usize, y: usize) -> [char; 2] {
    let Some(tile) = world.grid().get(x, y) else {
        return [' ', ' '];
    };
    match world.config().layout {
        Layout::Flat => match tile.stage(world.config().mature_threshold) {
            GrowthStage::Bare => ['.', ' '],
            GrowthStage::Growing => [',', ' '],
            GrowthStage::Mature => ['#', '#'],
        },
        Layout::SideView => {
            let glyph = tile.kind().glyph();
            [glyph, glyph]
        }
    }
}

/// Render the grid top row first, with each agent drawn over the tile it
/// occupies as `J` (joy) or `S` (sorrow).
pub fn render_frame(world: &World) -> String {
    let width = world.grid().width();
    let height = world.grid().height();
    let mut rows: Vec<Vec<char>> = (0..height)
        .map(|y| (0..width).flat_map(|x| tile_glyphs(world, x, y)).collect())
        .collect();

    for agent in &world.agents {
        let (x, y) = agent.tile_coords();
        if let Some(row) = rows.get_mut(y) {
            if let Some(cell) = row.get_mut(x * 2) {
                *cell = match agent.emotion {
                    Emotion::Joy => 'J',
                    Emotion::Sorrow => 'S',
                };
            }
        }
    }

    let border: String = std::iter::repeat('-').take(width * 2).collect();
    let mut out = String::with_capacity((width * 2 + 3) * (height + 2));
    out.push('+');
    out.push_str(&border);
    out.push_str("+\n");
    for row in rows {
        out.push('|');
        out.extend(row);
        out.push_str("|\n");
    }
    out.push('+');
    out.push_str(&border);
    out.push('+');
    out
}
