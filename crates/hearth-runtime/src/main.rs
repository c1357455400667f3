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

// Hearth runtime
// Drives the kernel at a fixed rate with the scripted card browser attached.

mod clock;
mod config;
mod demo;
mod session;

use anyhow::Result;
use hearth_core::{Kernel, KernelStats};

use crate::clock::FrameClock;
use crate::config::{ConfigSource, RuntimeConfig};
use crate::demo::CardBrowser;
use crate::session::SessionTime;

const PAGE_SIZE: usize = 12;

fn log_kernel_summary(stats: &KernelStats) {
    log::info!("--- Kernel Summary ---");
    log::info!("Frames: {}", stats.frames);
    for (name, priority) in &stats.modules {
        log::info!("  Module {name} (priority {priority})");
    }
    log::info!("Subscribed events: {}", stats.handler_count);
    log::info!("Queued events: {}", stats.queued_events);
    log::info!("Object pools: {}", stats.pool_count);
    log::info!("----------------------");
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    let (config, source) = RuntimeConfig::from_env()?;
    Builder::from_env(Env::default().default_filter_or(config.log_filter.as_str())).init();

    match &source {
        ConfigSource::File(path) => log::info!("Runtime: Loaded config from {}", path.display()),
        ConfigSource::Missing(path) => {
            log::warn!("Runtime: {} not found, using defaults", path.display())
        }
        ConfigSource::Defaults => log::info!("Runtime: No config file given, using defaults"),
    }

    let mut kernel = Kernel::new(config.kernel.clone());
    kernel.module::<dyn SessionTime>()?;
    let mut browser = CardBrowser::attach(&mut kernel, PAGE_SIZE)?;
    let mut clock = FrameClock::new(config.frame_rate, config.time_scale);

    log::info!(
        "Runtime: Running at {} fps for {} frame(s)",
        config.frame_rate,
        if config.max_frames == 0 {
            "unlimited".to_string()
        } else {
            config.max_frames.to_string()
        }
    );

    while config.max_frames == 0 || kernel.frame_count() < config.max_frames {
        let frame = kernel.frame_count();
        browser.drive(&mut kernel, frame)?;

        let time = clock.tick();
        kernel.update(time.logical, time.real);

        browser.apply(&mut kernel)?;
        log::trace!("Runtime: Frame {frame} shows {} card(s)", browser.shown());
        clock.wait_for_next_frame();
    }

    browser.detach(&mut kernel)?;
    let session = kernel.module::<dyn SessionTime>()?;
    log::info!(
        "Runtime: {} tick(s) took {:.2}s ({:.2}s logical)",
        session.ticks(),
        session.real(),
        session.logical()
    );
    log_kernel_summary(&kernel.stats());
    kernel.shutdown();
    Ok(())
}
