//! Fixed timestep accumulator.
//!
//! Physics always steps at `fixed_dt`; frames of any length feed the
//! accumulator and get back the number of ticks to run.

/// Most ticks run for a single frame.
pub const MAX_UPDATES_PER_FRAME: u32 = 10;

/// Longest frame accepted before clamping, in seconds.
pub const MAX_FRAME_DT: f32 = 0.25;

/// Fixed timestep manager.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    fixed_dt: f32,
    accumulator: f32,
    ticks: u64,
}

impl FixedTimestep {
    /// Creates a timestep running at `tick_rate` Hz.
    #[must_use]
    pub fn new(tick_rate: u32) -> Self {
        Self {
            fixed_dt: 1.0 / tick_rate.max(1) as f32,
            accumulator: 0.0,
            ticks: 0,
        }
    }

    /// Seconds per tick.
    #[must_use]
    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    /// Ticks handed out so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Adds a frame's worth of time and returns how many ticks to run.
    pub fn accumulate(&mut self, dt: f32) -> u32 {
        self.accumulator += dt.clamp(0.0, MAX_FRAME_DT);
        let mut count = 0;

        while self.accumulator >= self.fixed_dt && count < MAX_UPDATES_PER_FRAME {
            self.accumulator -= self.fixed_dt;
            count += 1;
        }

        // Still behind: drop the backlog
        if self.accumulator > self.fixed_dt * 2.0 {
            self.accumulator = 0.0;
        }

        self.ticks += u64::from(count);
        count
    }
}
