// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::time::{Duration, Instant};

/// Time elapsed since the previous frame, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Real time scaled by the clock's time scale.
    pub logical: f32,
    /// Wall-clock time.
    pub real: f32,
}

/// Measures frame deltas and paces the loop to a target frame rate.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last_tick: Instant,
    frame_budget: Duration,
    time_scale: f32,
}

impl FrameClock {
    /// Creates a clock targeting `frame_rate` frames per second. A rate of
    /// zero or less disables pacing.
    pub fn new(frame_rate: f32, time_scale: f32) -> Self {
        let frame_budget = if frame_rate > 0.0 {
            Duration::from_secs_f32(1.0 / frame_rate)
        } else {
            Duration::ZERO
        };
        Self {
            last_tick: Instant::now(),
            frame_budget,
            time_scale,
        }
    }

    /// Starts a new frame and returns the time since the previous one.
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let real = now.duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;
        FrameTime {
            logical: real * self.time_scale,
            real,
        }
    }

    /// Time left in the current frame's budget.
    pub fn remaining(&self) -> Duration {
        self.frame_budget.saturating_sub(self.last_tick.elapsed())
    }

    /// Sleeps until the current frame's budget is spent.
    pub fn wait_for_next_frame(&self) {
        let remaining = self.remaining();
        if !remaining.is_zero() {
            std::thread::sleep(remaining);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const SLEEP_DURATION_MS: u64 = 20;

    #[test]
    fn tick_measures_time_since_previous_tick() {
        let mut clock = FrameClock::new(0.0, 1.0);
        clock.tick();
        thread::sleep(Duration::from_millis(SLEEP_DURATION_MS));
        let time = clock.tick();
        assert!(
            time.real >= SLEEP_DURATION_MS as f32 / 1000.0,
            "real delta {} should cover the sleep",
            time.real
        );
    }

    #[test]
    fn logical_time_is_scaled() {
        let mut clock = FrameClock::new(0.0, 0.5);
        thread::sleep(Duration::from_millis(SLEEP_DURATION_MS));
        let time = clock.tick();
        assert_eq!(time.logical, time.real * 0.5);
    }

    #[test]
    fn unpaced_clock_never_waits() {
        let clock = FrameClock::new(0.0, 1.0);
        assert_eq!(clock.remaining(), Duration::ZERO);
    }

    #[test]
    fn paced_clock_budget_shrinks() {
        let clock = FrameClock::new(10.0, 1.0);
        assert!(clock.remaining() <= Duration::from_millis(101));
        thread::sleep(Duration::from_millis(SLEEP_DURATION_MS));
        assert!(clock.remaining() < Duration::from_millis(100));
    }
}
