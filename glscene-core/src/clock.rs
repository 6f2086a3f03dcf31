/// Frame timing
///
/// The host loop ticks a [`FrameClock`] once per presented frame and feeds the
/// measured delta into a [`FixedTimestep`], which says how many fixed-size
/// simulation steps to run before rendering.
use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous tick, clamped.
    pub dt: Duration,
    pub now: Instant,
    pub frame_index: u64,
}

/// Measures the time between consecutive frames.
///
/// Delta time is clamped so a stall (debugger, suspended terminal) does not
/// turn into a huge jump.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Resets the baseline, e.g. after the loop was paused.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    /// Advances the clock to `now`.
    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);
        self.last = now;

        let ft = FrameTime {
            dt,
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts variable frame deltas into whole fixed steps.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    step: Duration,
    accumulator: Duration,
    max_steps: u32,
}

impl FixedTimestep {
    pub fn new(step: Duration, max_steps: u32) -> Self {
        Self {
            step: step.max(Duration::from_micros(1)),
            accumulator: Duration::ZERO,
            max_steps: max_steps.max(1),
        }
    }

    /// `hz` steps per second, at most `max_steps` per frame.
    pub fn from_hz(hz: u32, max_steps: u32) -> Self {
        Self::new(Duration::from_secs(1) / hz.max(1), max_steps)
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    /// Adds `dt` and returns how many steps are due.
    ///
    /// Time beyond `max_steps` is dropped so a slow renderer falls behind in
    /// simulated time instead of spiralling.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        self.accumulator += dt;
        let mut steps = 0;
        while self.accumulator >= self.step && steps < self.max_steps {
            self.accumulator -= self.step;
            steps += 1;
        }
        if steps == self.max_steps && self.accumulator >= self.step {
            log::debug!("dropping {:?} of simulation backlog", self.accumulator);
            self.accumulator = Duration::ZERO;
        }
        steps
    }
}

impl Default for FixedTimestep {
    fn default() -> Self {
        Self::from_hz(60, 5)
    }
}
