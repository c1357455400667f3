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

use hearth_core::event::{EventArgs, EventHandler, EventId, GameEvent, Sender};
use hearth_core::{Kernel, KernelConfig, KernelError};
use std::cell::RefCell;
use std::rc::Rc;

const CARD_SELECTED: EventId = EventId(5);
const FILTER_CHANGED: EventId = EventId(7);

#[derive(Debug)]
struct CardSelected {
    card: u32,
}

impl GameEvent for CardSelected {
    fn id(&self) -> EventId {
        CARD_SELECTED
    }
}

fn selected(card: u32) -> EventArgs {
    EventArgs::new(CardSelected { card })
}

fn card_log() -> (EventHandler, Rc<RefCell<Vec<u32>>>) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let handler = EventHandler::new(move |_, event| {
        if let Some(e) = event.downcast_ref::<CardSelected>() {
            sink.borrow_mut().push(e.card);
        }
    });
    (handler, log)
}

#[test]
fn immediate_events_dispatch_synchronously_and_deferred_ones_on_update() {
    // --- 1. ARRANGE ---
    let mut kernel = Kernel::new(KernelConfig::default());
    let (handler, log) = card_log();
    kernel.events().unwrap().subscribe(CARD_SELECTED, handler).unwrap();

    // --- 2. ACT & ASSERT ---
    kernel
        .events()
        .unwrap()
        .publish_immediate(Sender::new("card-list"), selected(1))
        .unwrap();
    assert_eq!(*log.borrow(), vec![1], "immediate dispatch runs before returning");

    kernel
        .events()
        .unwrap()
        .publish_deferred(Sender::new("card-list"), selected(2))
        .unwrap();
    assert_eq!(*log.borrow(), vec![1], "deferred dispatch waits for the next update");
    assert_eq!(kernel.stats().queued_events, 1);

    kernel.update(0.016, 0.016);
    assert_eq!(*log.borrow(), vec![1, 2]);
    assert_eq!(kernel.stats().queued_events, 0);
}

#[test]
fn one_update_drains_everything_in_publish_order() {
    let mut kernel = Kernel::new(KernelConfig::default());
    let (handler, log) = card_log();
    let events = kernel.events().unwrap();
    events.subscribe(CARD_SELECTED, handler).unwrap();

    // Selecting a card below 100 also queues its "back face".
    let emitter = events.emitter();
    events
        .subscribe(
            CARD_SELECTED,
            EventHandler::new(move |sender, event| {
                if let Some(e) = event.downcast_ref::<CardSelected>() {
                    if e.card < 100 {
                        emitter
                            .publish_deferred(sender.clone(), selected(e.card + 100))
                            .unwrap();
                    }
                }
            }),
        )
        .unwrap();

    const N: u32 = 5;
    for card in 0..N {
        events.publish_deferred(Sender::none(), selected(card)).unwrap();
    }
    kernel.update(0.016, 0.016);

    let expected: Vec<u32> = (0..N).chain(100..100 + N).collect();
    assert_eq!(*log.borrow(), expected);
    assert_eq!(kernel.stats().queued_events, 0);
}

#[test]
fn unsubscribing_a_stranger_changes_nothing() {
    let mut kernel = Kernel::new(KernelConfig::default());
    let events = kernel.events().unwrap();
    let (subscribed, _) = card_log();
    let (stranger, _) = card_log();
    events.subscribe(FILTER_CHANGED, subscribed).unwrap();

    let before = events.subscriber_count(FILTER_CHANGED);
    events.unsubscribe(FILTER_CHANGED, &stranger).unwrap();

    assert_eq!(events.subscriber_count(FILTER_CHANGED), before);
    assert_eq!(events.handler_count(), 1);
}

#[test]
fn unsubscribed_handlers_stop_receiving() {
    let mut kernel = Kernel::new(KernelConfig::default());
    let events = kernel.events().unwrap();
    let (handler, log) = card_log();
    events.subscribe(CARD_SELECTED, handler.clone()).unwrap();

    events.publish_immediate(Sender::none(), selected(1)).unwrap();
    events.unsubscribe(CARD_SELECTED, &handler).unwrap();
    events.publish_immediate(Sender::none(), selected(2)).unwrap();

    assert_eq!(*log.borrow(), vec![1]);
    assert_eq!(events.handler_count(), 0);
}

#[test]
fn null_handlers_and_events_are_contract_violations() {
    let mut kernel = Kernel::new(KernelConfig::default());
    let events = kernel.events().unwrap();

    assert!(matches!(
        events.subscribe(CARD_SELECTED, EventHandler::default()),
        Err(KernelError::InvalidHandler { .. })
    ));
    assert!(matches!(
        events.publish_deferred(Sender::none(), EventArgs::default()),
        Err(KernelError::InvalidEvent { .. })
    ));
    assert_eq!(events.handler_count(), 0, "failed calls leave no trace");
    assert_eq!(events.event_count(), 0, "failed calls leave no trace");
}

#[test]
fn shutdown_drops_queued_events() {
    let mut kernel = Kernel::new(KernelConfig::default());
    let (handler, log) = card_log();
    let emitter = kernel.events().unwrap().emitter();
    emitter.subscribe(CARD_SELECTED, handler).unwrap();
    emitter.publish_deferred(Sender::none(), selected(9)).unwrap();

    kernel.shutdown();

    assert!(log.borrow().is_empty(), "pending events are dropped, not flushed");
    assert_eq!(emitter.handler_count(), 0);
}

#[test]
fn emitters_outliving_the_kernel_report_the_bus_as_gone() {
    let mut kernel = Kernel::new(KernelConfig::default());
    let emitter = kernel.events().unwrap().emitter();

    kernel.shutdown();

    match emitter.publish_deferred(Sender::none(), selected(3)) {
        Err(KernelError::InvalidEvent { reason }) => assert_eq!(reason, "the event bus is gone"),
        other => panic!("expected InvalidEvent, got {other:?}"),
    }
}
