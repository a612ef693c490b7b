use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Joy,
    Sorrow,
}

impl Emotion {
    pub fn sign(self) -> f32 {
        match self {
            Emotion::Joy => 1.0,
            Emotion::Sorrow => -1.0,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Emotion::Joy => Emotion::Sorrow,
            Emotion::Sorrow => Emotion::Joy,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: u32,
    /// Continuous tile coordinates; `floor` gives the tile underneath.
    pub position: [f64; 2],
    pub velocity: [f64; 2],
    pub emotion: Emotion,
    /// Accumulated simulated milliseconds.
    pub age_ms: f64,
    pub grounded: bool,
    pub climbing: bool,
}

impl Agent {
    pub fn new(id: u32, position: [f64; 2], emotion: Emotion) -> Self {
        Self {
            id,
            position,
            velocity: [0.0; 2],
            emotion,
            age_ms: 0.0,
            grounded: false,
            climbing: false,
        }
    }

    pub fn tile_coords(&self) -> (usize, usize) {
        (
            self.position[0].max(0.0).floor() as usize,
            self.position[1].max(0.0).floor() as usize,
        )
    }
}
