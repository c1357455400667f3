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

//! Session-wide time accounting, provided as a kernel module.

use hearth_core::module::Module;
use hearth_core::register_module;

/// Accumulated time since the session started.
pub trait SessionTime {
    /// Sum of the logical frame deltas, in seconds.
    fn logical(&self) -> f64;
    /// Sum of the real frame deltas, in seconds.
    fn real(&self) -> f64;
    /// Number of updates seen.
    fn ticks(&self) -> u64;
}

/// Runs ahead of every other module so they all see the same totals.
#[derive(Debug, Default)]
pub struct SessionClock {
    logical: f64,
    real: f64,
    ticks: u64,
}

impl SessionTime for SessionClock {
    fn logical(&self) -> f64 {
        self.logical
    }

    fn real(&self) -> f64 {
        self.real
    }

    fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl Module for SessionClock {
    fn priority(&self) -> i32 {
        200
    }

    fn update(&mut self, elapsed: f32, real_elapsed: f32) {
        self.logical += f64::from(elapsed);
        self.real += f64::from(real_elapsed);
        self.ticks += 1;
    }

    fn shutdown(&mut self) {
        log::info!(
            "SessionClock: {} tick(s), {:.2}s logical, {:.2}s real",
            self.ticks,
            self.logical,
            self.real
        );
    }
}

register_module!(dyn SessionTime => SessionClock);

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_core::{Kernel, KernelConfig};

    #[test]
    fn session_clock_accumulates_frame_deltas() {
        let mut kernel = Kernel::new(KernelConfig::default());
        kernel.module::<dyn SessionTime>().unwrap();
        kernel.update(0.25, 0.5);
        kernel.update(0.25, 0.5);

        let session = kernel.module::<dyn SessionTime>().unwrap();
        assert_eq!(session.ticks(), 2);
        assert_eq!(session.logical(), 0.5);
        assert_eq!(session.real(), 1.0);
    }
}
