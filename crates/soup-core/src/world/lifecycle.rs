use super::metrics::StepTimings;
use super::World;
use crate::diffusion;
use std::time::Instant;

/// Negative or non-finite frame times advance nothing.
fn sanitize_elapsed(elapsed_ms: f64) -> f64 {
    if elapsed_ms.is_finite() && elapsed_ms > 0.0 {
        elapsed_ms
    } else {
        0.0
    }
}

impl World {
    pub(crate) fn next_agent_id_checked(&mut self) -> Option<u32> {
        if self.next_agent_id == u32::MAX {
            return None;
        }
        let id = self.next_agent_id;
        self.next_agent_id += 1;
        Some(id)
    }

    fn step_diffusion_phase(&mut self) {
        diffusion::diffuse(&mut self.grid, &self.config.diffusion, &mut self.rng);
    }

    /// Advance the world by one frame of `elapsed_ms` simulated milliseconds:
    /// kinematics, influence, growth, diffusion, then fire.
    pub fn tick(&mut self, elapsed_ms: f64) -> StepTimings {
        let total_start = Instant::now();
        let dt = sanitize_elapsed(elapsed_ms);
        self.tick_index = self.tick_index.saturating_add(1);
        self.clock_ms += dt;
        self.fires_last_tick = 0;
        self.spawns_last_tick = 0;
        self.seeds_last_tick = 0;

        let t0 = Instant::now();
        self.step_kinematics_phase(dt);
        let kinematics_us = t0.elapsed().as_micros() as u64;

        let t1 = Instant::now();
        self.step_influence_phase();
        let influence_us = t1.elapsed().as_micros() as u64;

        let t2 = Instant::now();
        self.step_growth_phase();
        let growth_us = t2.elapsed().as_micros() as u64;

        let t3 = Instant::now();
        self.step_diffusion_phase();
        let diffusion_us = t3.elapsed().as_micros() as u64;

        let t4 = Instant::now();
        self.step_fire_phase();
        let fire_us = t4.elapsed().as_micros() as u64;

        StepTimings {
            kinematics_us,
            influence_us,
            growth_us,
            diffusion_us,
            fire_us,
            total_us: total_start.elapsed().as_micros() as u64,
        }
    }
}
