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

use hearth_core::module::Module;
use hearth_core::{register_module, Kernel, KernelConfig, KernelError};
use std::cell::RefCell;

thread_local! {
    static JOURNAL: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

fn record(line: impl Into<String>) {
    JOURNAL.with(|j| j.borrow_mut().push(line.into()));
}

fn take_journal() -> Vec<String> {
    JOURNAL.with(|j| std::mem::take(&mut *j.borrow_mut()))
}

// --- TEST CONTRACTS AND MODULES ---

trait Simulation {
    fn steps(&self) -> u32;
}

trait Mixer {
    fn volume(&self) -> f32;
}

trait Renderer {
    fn technique(&self) -> &'static str;
}

#[derive(Default)]
struct Physics {
    steps: u32,
}

impl Simulation for Physics {
    fn steps(&self) -> u32 {
        self.steps
    }
}

impl Module for Physics {
    fn priority(&self) -> i32 {
        100
    }

    fn update(&mut self, _elapsed: f32, _real_elapsed: f32) {
        self.steps += 1;
        record("update physics");
    }

    fn shutdown(&mut self) {
        record("shutdown physics");
    }
}

#[derive(Default)]
struct Audio;

impl Mixer for Audio {
    fn volume(&self) -> f32 {
        0.8
    }
}

impl Module for Audio {
    fn priority(&self) -> i32 {
        50
    }

    fn update(&mut self, _elapsed: f32, _real_elapsed: f32) {
        record("update audio");
    }

    fn shutdown(&mut self) {
        record("shutdown audio");
    }
}

#[derive(Default)]
struct Forward;

impl Renderer for Forward {
    fn technique(&self) -> &'static str {
        "forward"
    }
}

impl Module for Forward {}

#[derive(Default)]
struct Deferred;

impl Renderer for Deferred {
    fn technique(&self) -> &'static str {
        "deferred"
    }
}

impl Module for Deferred {}

register_module!(dyn Simulation => Physics);
register_module!(dyn Mixer => Audio);
register_module!(dyn Renderer => Forward);
register_module!(dyn Renderer => Deferred);

// --- TESTS ---

#[test]
fn higher_priority_updates_first_and_shuts_down_last() {
    take_journal();
    let mut kernel = Kernel::new(KernelConfig::default());

    // Created in the "wrong" order on purpose.
    kernel.module::<dyn Mixer>().unwrap();
    kernel.module::<dyn Simulation>().unwrap();

    for _ in 0..3 {
        kernel.update(0.016, 0.016);
    }
    kernel.shutdown();

    let mut expected = Vec::new();
    for _ in 0..3 {
        expected.push("update physics");
        expected.push("update audio");
    }
    expected.push("shutdown audio");
    expected.push("shutdown physics");
    assert_eq!(take_journal(), expected);
}

#[test]
fn lookups_return_the_same_instance() {
    let mut kernel = Kernel::new(KernelConfig::default());
    kernel.update(0.016, 0.016);

    kernel.module::<dyn Simulation>().unwrap();
    kernel.update(0.016, 0.016);
    kernel.update(0.016, 0.016);

    assert_eq!(
        kernel.module::<dyn Simulation>().unwrap().steps(),
        2,
        "the module must keep its state between lookups"
    );
    assert_eq!(kernel.stats().modules, vec![("Physics", 100)]);
}

#[test]
fn ambiguous_contracts_need_a_concrete_type() {
    let mut kernel = Kernel::new(KernelConfig::default());

    match kernel.module::<dyn Renderer>() {
        Err(KernelError::AmbiguousModule { mut candidates, .. }) => {
            candidates.sort_unstable();
            assert_eq!(candidates, vec!["Deferred", "Forward"]);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(renderer) => panic!("resolved to {}", renderer.technique()),
    }

    let renderer = kernel.module_with::<dyn Renderer, Deferred>().unwrap();
    assert_eq!(renderer.technique(), "deferred");
    assert_eq!(
        kernel.module::<dyn Renderer>().unwrap().technique(),
        "deferred",
        "once live, the contract resolves to the chosen module"
    );
}

#[test]
fn unknown_contracts_are_reported() {
    trait Network {}

    let mut kernel = Kernel::new(KernelConfig::default());
    assert!(matches!(
        kernel.module::<dyn Network>(),
        Err(KernelError::ModuleNotFound { .. })
    ));
    assert!(kernel.registry().is_empty());
}

#[test]
fn dropping_the_kernel_shuts_modules_down_once() {
    take_journal();
    {
        let mut kernel = Kernel::new(KernelConfig::default());
        kernel.module::<dyn Simulation>().unwrap();
        kernel.module::<dyn Mixer>().unwrap();
        kernel.shutdown();
    }
    assert_eq!(take_journal(), vec!["shutdown audio", "shutdown physics"]);
}

#[test]
fn builtin_modules_sit_between_custom_priorities() {
    let mut kernel = Kernel::new(KernelConfig::default());
    kernel.module::<dyn Mixer>().unwrap();
    kernel.pools().unwrap();
    assert!(kernel.module::<dyn Renderer>().is_err());
    kernel.module_with::<dyn Renderer, Forward>().unwrap();

    let priorities: Vec<i32> = kernel.stats().modules.iter().map(|(_, p)| *p).collect();
    assert!(
        priorities.windows(2).all(|w| w[0] >= w[1]),
        "modules must be in non-increasing priority order: {priorities:?}"
    );
    assert_eq!(priorities.len(), 3);
    assert_eq!(kernel.module::<dyn Mixer>().unwrap().volume(), 0.8);
}
