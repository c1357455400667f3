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

//! Host configuration, read from a JSON document.

use anyhow::{Context, Result};
use hearth_core::KernelConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the configuration file when no CLI argument
/// is given.
pub const CONFIG_ENV: &str = "HEARTH_CONFIG";

/// Everything the host driver needs to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Default `env_logger` filter, overridden by `RUST_LOG`.
    pub log_filter: String,
    /// Target frames per second. Zero or less disables throttling.
    pub frame_rate: f32,
    /// Multiplier applied to real time to get logical time.
    pub time_scale: f32,
    /// Number of frames to run. Zero runs until the process is killed.
    pub max_frames: u64,
    /// Settings handed to the kernel modules.
    pub kernel: KernelConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_owned(),
            frame_rate: 60.0,
            time_scale: 1.0,
            max_frames: 240,
            kernel: KernelConfig::default(),
        }
    }
}

/// Where the configuration came from, reported once logging is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Read from this file.
    File(PathBuf),
    /// This file was requested but does not exist.
    Missing(PathBuf),
    /// No file was requested.
    Defaults,
}

impl RuntimeConfig {
    /// Loads the configuration named by the first CLI argument or by
    /// [`CONFIG_ENV`].
    pub fn from_env() -> Result<(Self, ConfigSource)> {
        let path = std::env::args()
            .nth(1)
            .or_else(|| std::env::var(CONFIG_ENV).ok())
            .map(PathBuf::from);
        match path {
            Some(path) => Self::load(&path),
            None => Ok((Self::default(), ConfigSource::Defaults)),
        }
    }

    /// Loads `path`, falling back to defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<(Self, ConfigSource)> {
        if !path.exists() {
            return Ok((Self::default(), ConfigSource::Missing(path.to_path_buf())));
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok((config, ConfigSource::File(path.to_path_buf())))
    }
}
