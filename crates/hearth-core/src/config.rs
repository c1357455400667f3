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

//! Kernel-wide settings handed to every module when it is attached.

use serde::{Deserialize, Serialize};

/// Settings for the whole kernel.
///
/// Every field has a default, so a partial (or empty) configuration document
/// deserializes into a usable value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Settings for the event bus.
    pub events: EventConfig,
    /// Settings for the object-pool registry.
    pub pools: PoolConfig,
}

/// Settings for the event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Pending-queue depth above which a drain logs a warning.
    ///
    /// Drains never stop early; the warning only points at handlers that keep
    /// feeding the queue they are being drained from.
    pub queue_warn_depth: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            queue_warn_depth: 1024,
        }
    }
}

/// Settings for the object-pool registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Whether destroying a pool also runs the destroy callback on instances
    /// that are still checked out.
    ///
    /// Off by default: only free instances are destroyed and outstanding ones
    /// are simply forgotten.
    pub destroy_live_on_teardown: bool,
}
