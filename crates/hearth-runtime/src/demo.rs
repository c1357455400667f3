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

//! A scripted card browser: a thin adapter that talks to the kernel through
//! the event and pool contracts only.

use anyhow::{Context, Result};
use hearth_core::event::{EventArgs, EventHandler, EventId, GameEvent, Sender};
use hearth_core::pool::PoolDescriptor;
use hearth_core::Kernel;
use std::cell::RefCell;
use std::rc::Rc;

// UI requests.
pub const LIST_OPENED: EventId = EventId(1001);
pub const FILTER_CHANGED: EventId = EventId(1002);
pub const CARD_SELECTED: EventId = EventId(1003);
// View notifications.
pub const VIEW_SHOWN: EventId = EventId(2001);
pub const VIEWS_RECYCLED: EventId = EventId(2002);

const VIEW_POOL: &str = "card-views";
const FILTERS: [Option<&str>; 4] = [Some("red"), Some("blue"), None, Some("green")];

pub struct ListOpened {
    pub page_size: usize,
}

impl GameEvent for ListOpened {
    fn id(&self) -> EventId {
        LIST_OPENED
    }
}

/// Reused across publishes, hence the `clear`.
#[derive(Default)]
pub struct FilterChanged {
    pub filter: Option<String>,
}

impl GameEvent for FilterChanged {
    fn id(&self) -> EventId {
        FILTER_CHANGED
    }

    fn clear(&mut self) {
        self.filter = None;
    }
}

pub struct CardSelected {
    pub card: usize,
}

impl GameEvent for CardSelected {
    fn id(&self) -> EventId {
        CARD_SELECTED
    }
}

pub struct ViewShown {
    pub view: CardView,
}

impl GameEvent for ViewShown {
    fn id(&self) -> EventId {
        VIEW_SHOWN
    }
}

pub struct ViewsRecycled {
    pub count: usize,
}

impl GameEvent for ViewsRecycled {
    fn id(&self) -> EventId {
        VIEWS_RECYCLED
    }
}

/// Handle of a pooled card view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CardView(pub u32);

enum Command {
    Open(usize),
    Filter(Option<String>),
    Select(usize),
}

/// Drives a card list through the kernel: requests are published as events,
/// the handlers queue commands, and [`apply`](Self::apply) turns them into
/// pooled views.
pub struct CardBrowser {
    inbox: Rc<RefCell<Vec<Command>>>,
    subscriptions: Vec<(EventId, EventHandler)>,
    shown: Vec<CardView>,
    page_size: usize,
    filter_args: EventArgs,
    sender: Sender,
}

impl CardBrowser {
    /// Creates the view pool and subscribes the browser's handlers.
    pub fn attach(kernel: &mut Kernel, page_size: usize) -> Result<Self> {
        let mut next_view = 0u32;
        kernel.pools()?.create_pool(
            PoolDescriptor::new(VIEW_POOL, move || {
                next_view += 1;
                CardView(next_view)
            })
            .on_spawn(|view| log::trace!("CardBrowser: Showing {view:?}"))
            .on_unspawn(|view| log::trace!("CardBrowser: Hiding {view:?}"))
            .on_destroy(|view| log::debug!("CardBrowser: Releasing {view:?}")),
        )?;

        let inbox = Rc::new(RefCell::new(Vec::new()));
        let mut subscriptions = Vec::new();

        let sink = Rc::clone(&inbox);
        subscriptions.push((
            LIST_OPENED,
            EventHandler::new(move |_, event| {
                if let Some(e) = event.downcast_ref::<ListOpened>() {
                    sink.borrow_mut().push(Command::Open(e.page_size));
                }
            }),
        ));

        let sink = Rc::clone(&inbox);
        subscriptions.push((
            FILTER_CHANGED,
            EventHandler::new(move |_, event| {
                if let Some(e) = event.downcast_ref::<FilterChanged>() {
                    sink.borrow_mut().push(Command::Filter(e.filter.clone()));
                }
            }),
        ));

        let sink = Rc::clone(&inbox);
        subscriptions.push((
            CARD_SELECTED,
            EventHandler::new(move |_, event| {
                if let Some(e) = event.downcast_ref::<CardSelected>() {
                    sink.borrow_mut().push(Command::Select(e.card));
                }
            }),
        ));

        subscriptions.push((
            VIEW_SHOWN,
            EventHandler::new(|_, event| {
                if let Some(e) = event.downcast_ref::<ViewShown>() {
                    log::debug!("CardBrowser: {:?} is highlighted", e.view);
                }
            }),
        ));

        subscriptions.push((
            VIEWS_RECYCLED,
            EventHandler::new(|_, event| {
                if let Some(e) = event.downcast_ref::<ViewsRecycled>() {
                    log::debug!("CardBrowser: Recycled {} view(s)", e.count);
                }
            }),
        ));

        let events = kernel.events()?;
        for (id, handler) in &subscriptions {
            events.subscribe(*id, handler.clone())?;
        }

        Ok(Self {
            inbox,
            subscriptions,
            shown: Vec::new(),
            page_size,
            filter_args: EventArgs::new(FilterChanged::default()),
            sender: Sender::new("card-browser"),
        })
    }

    /// Publishes the scripted UI requests for `frame`.
    pub fn drive(&mut self, kernel: &mut Kernel, frame: u64) -> Result<()> {
        let events = kernel.events()?;
        if frame == 0 {
            events.publish_deferred(
                self.sender.clone(),
                EventArgs::new(ListOpened {
                    page_size: self.page_size,
                }),
            )?;
        } else if frame % 30 == 15 {
            let filter = FILTERS[(frame / 30) as usize % FILTERS.len()];
            if self.filter_args.clear() {
                self.filter_args
                    .with_mut(|e: &mut FilterChanged| e.filter = filter.map(str::to_owned));
            }
            events.publish_deferred(self.sender.clone(), self.filter_args.clone())?;
        } else if frame % 30 == 25 {
            events.publish_immediate(
                self.sender.clone(),
                EventArgs::new(CardSelected {
                    card: frame as usize,
                }),
            )?;
        }
        Ok(())
    }

    /// Turns the commands queued by the handlers into pool operations.
    pub fn apply(&mut self, kernel: &mut Kernel) -> Result<()> {
        let commands = std::mem::take(&mut *self.inbox.borrow_mut());
        for command in commands {
            match command {
                Command::Open(page_size) => {
                    log::info!("CardBrowser: Opening a page of {page_size} card(s)");
                    self.show(kernel, page_size)?;
                }
                Command::Filter(filter) => {
                    let visible = match &filter {
                        Some(_) => self.page_size / 2,
                        None => self.page_size,
                    };
                    log::info!("CardBrowser: Filter {filter:?} leaves {visible} card(s)");
                    self.recycle(kernel)?;
                    self.show(kernel, visible)?;
                }
                Command::Select(card) => {
                    if let Some(view) = self.shown.get(card % self.shown.len().max(1)).copied() {
                        kernel
                            .events()?
                            .publish_deferred(self.sender.clone(), EventArgs::new(ViewShown { view }))?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Returns every view and unsubscribes the handlers.
    pub fn detach(mut self, kernel: &mut Kernel) -> Result<()> {
        self.recycle(kernel)?;
        let events = kernel.events()?;
        for (id, handler) in &self.subscriptions {
            events.unsubscribe(*id, handler)?;
        }
        kernel.pools()?.release_all_unused();
        Ok(())
    }

    /// Number of views currently shown.
    pub fn shown(&self) -> usize {
        self.shown.len()
    }

    fn show(&mut self, kernel: &mut Kernel, count: usize) -> Result<()> {
        let pool = kernel
            .pools()?
            .get_pool::<CardView>(VIEW_POOL)
            .context("the card view pool is gone")?;
        for _ in 0..count {
            self.shown.push(pool.spawn()?);
        }
        Ok(())
    }

    fn recycle(&mut self, kernel: &mut Kernel) -> Result<()> {
        if self.shown.is_empty() {
            return Ok(());
        }
        let count = self.shown.len();
        let pool = kernel
            .pools()?
            .get_pool::<CardView>(VIEW_POOL)
            .context("the card view pool is gone")?;
        for view in self.shown.drain(..) {
            pool.unspawn(view)?;
        }
        kernel
            .events()?
            .publish_deferred(self.sender.clone(), EventArgs::new(ViewsRecycled { count }))?;
        Ok(())
    }
}
