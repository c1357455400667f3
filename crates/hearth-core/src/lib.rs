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

//! # Hearth Core
//!
//! A small, tick-driven application kernel: pluggable modules resolved by
//! contract and updated in priority order, an event bus with immediate and
//! deferred dispatch, and typed object pools.
//!
//! Everything runs on the thread that drives [`Kernel::update`]; nothing here
//! is `Send`.

#![warn(missing_docs)]

pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod module;
pub mod pool;

pub use config::KernelConfig;
pub use context::{Kernel, KernelStats};
pub use error::{KernelError, Result};

#[doc(hidden)]
pub use inventory;
