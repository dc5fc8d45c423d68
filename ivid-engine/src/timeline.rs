//! Per-tick show/hide scheduling of interactions
//!
//! The engine keeps two cached cursors instead of scanning every interaction
//! on every tick: the visible interaction that will be hidden next and the
//! interaction that will be shown next. Each tick runs the hide pass to
//! exhaustion before the show pass starts. Seeking resets both cursors.

use crate::collaborators::{Announcement, Dialog};
use crate::content::ContentFactory;
use crate::events::{Event, EventEmitter, SubscriptionToken};
use crate::interaction::Interaction;
use crate::modal::ModalSlot;
use std::collections::BTreeSet;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    /// Must be recomputed before use
    Unknown,
    /// Nothing left to show or hide
    Exhausted,
    At(usize),
}

impl From<Option<usize>> for Cursor {
    fn from(index: Option<usize>) -> Self {
        index.map_or(Cursor::Exhausted, Cursor::At)
    }
}

/// Transitions made by one tick, in the order they happened
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    pub hidden: Vec<usize>,
    pub shown: Vec<usize>,
    /// Required interactions whose window elapsed before reaching full score
    pub pinned: Vec<usize>,
}

impl TickOutcome {
    pub fn is_empty(&self) -> bool {
        self.hidden.is_empty() && self.shown.is_empty() && self.pinned.is_empty()
    }

    /// Single announcement for everything that appeared during the tick
    pub fn announcement(
        &self,
        interactions: &[Interaction],
        multiple_message: &str,
    ) -> Option<Announcement> {
        match self.shown.as_slice() {
            [] => None,
            [single] => Some(Announcement::Single {
                interaction: *single,
                title: interactions[*single].title(),
            }),
            many => Some(Announcement::Multiple {
                interactions: many.to_vec(),
                message: multiple_message.to_string(),
            }),
        }
    }
}

/// Events emitted by the timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineEvent {
    Shown(usize),
    Hidden(usize),
    Pinned(usize),
}

impl Event for TimelineEvent {
    type Kind = TimelineEventKind;

    fn kind(&self) -> TimelineEventKind {
        match self {
            TimelineEvent::Shown(_) => TimelineEventKind::Shown,
            TimelineEvent::Hidden(_) => TimelineEventKind::Hidden,
            TimelineEvent::Pinned(_) => TimelineEventKind::Pinned,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineEventKind {
    Shown,
    Hidden,
    Pinned,
}

/// Decides which interactions transition on each playback tick
#[derive(Debug)]
pub struct TimelineEngine {
    visible: BTreeSet<usize>,
    pinned: BTreeSet<usize>,
    next_hide: Cursor,
    next_show: Cursor,
    last_shown: Option<usize>,
    events: EventEmitter<TimelineEvent>,
}

impl TimelineEngine {
    pub fn new() -> Self {
        Self {
            visible: BTreeSet::new(),
            pinned: BTreeSet::new(),
            next_hide: Cursor::Unknown,
            next_show: Cursor::Unknown,
            last_shown: None,
            events: EventEmitter::new(),
        }
    }

    /// Indices of rendered interactions, ascending
    pub fn visible(&self) -> impl Iterator<Item = usize> + '_ {
        self.visible.iter().copied()
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.visible.contains(&index)
    }

    pub fn pinned(&self) -> impl Iterator<Item = usize> + '_ {
        self.pinned.iter().copied()
    }

    pub fn is_pinned(&self, index: usize) -> bool {
        self.pinned.contains(&index)
    }

    /// Forgets both cursors; the next tick recomputes them from scratch
    pub fn invalidate(&mut self) {
        self.next_hide = Cursor::Unknown;
        self.next_show = Cursor::Unknown;
        self.last_shown = None;
    }

    /// Drops an interaction that was detached outside the timeline.
    ///
    /// It is not shown again until the show cursor is next recomputed, which
    /// at the latest happens after the next seek.
    pub fn forget(&mut self, index: usize) {
        self.visible.remove(&index);
        self.pinned.remove(&index);
        self.next_hide = Cursor::Unknown;
    }

    /// Lets a pinned interaction be hidden again once its window has passed
    pub fn release(&mut self, index: usize) -> bool {
        let released = self.pinned.remove(&index);
        if released {
            self.next_hide = Cursor::Unknown;
        }
        released
    }

    /// Runs one tick at `time`: the hide pass to exhaustion, then the show pass
    pub fn update<D: Dialog>(
        &mut self,
        time: f64,
        interactions: &mut [Interaction],
        factory: &mut dyn ContentFactory,
        modal: &mut ModalSlot<D>,
    ) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        self.hide_pass(time, interactions, factory, modal, &mut outcome);
        self.show_pass(time, interactions, factory, modal, &mut outcome);

        if !outcome.is_empty() {
            trace!(time, ?outcome, "tick");
        }
        outcome
    }

    fn hide_pass<D: Dialog>(
        &mut self,
        time: f64,
        interactions: &mut [Interaction],
        factory: &mut dyn ContentFactory,
        modal: &mut ModalSlot<D>,
        outcome: &mut TickOutcome,
    ) {
        loop {
            if self.next_hide == Cursor::Unknown {
                self.next_hide = self.find_next_to_hide(time, interactions).into();
            }
            let Cursor::At(index) = self.next_hide else {
                break;
            };
            let interaction = &mut interactions[index];
            if interaction.visible_at(time) {
                break;
            }
            self.next_hide = Cursor::Unknown;

            if interaction.is_gated() && time >= interaction.hide_at() {
                debug!(interaction = index, time, "pinned required interaction");
                self.pinned.insert(index);
                outcome.pinned.push(index);
                self.events.emit(&TimelineEvent::Pinned(index));
                continue;
            }

            if interaction.is_rendered() {
                interaction.toggle(time, factory, modal);
            }
            self.visible.remove(&index);
            self.pinned.remove(&index);
            debug!(interaction = index, time, "hid interaction");
            outcome.hidden.push(index);
            self.events.emit(&TimelineEvent::Hidden(index));
        }
    }

    fn show_pass<D: Dialog>(
        &mut self,
        time: f64,
        interactions: &mut [Interaction],
        factory: &mut dyn ContentFactory,
        modal: &mut ModalSlot<D>,
        outcome: &mut TickOutcome,
    ) {
        loop {
            if self.next_show == Cursor::Unknown {
                self.next_show = self.find_next_to_show(time, interactions).into();
            }
            let Cursor::At(index) = self.next_show else {
                break;
            };
            let interaction = &mut interactions[index];
            if interaction.duration().from > time {
                break;
            }
            self.next_show = Cursor::Unknown;
            self.last_shown = Some(index);

            // A window that started and ended between two ticks is skipped
            if !interaction.visible_at(time) || interaction.is_rendered() {
                continue;
            }

            interaction.toggle(time, factory, modal);
            self.visible.insert(index);
            self.next_hide = Cursor::Unknown;
            debug!(interaction = index, time, "showed interaction");
            outcome.shown.push(index);
            self.events.emit(&TimelineEvent::Shown(index));
        }
    }

    /// Visible interaction with the earliest end; ties by authoring order.
    ///
    /// A pin only holds while the playhead is at or past the window, so a
    /// pinned interaction is a candidate again once playback is before it.
    fn find_next_to_hide(&self, time: f64, interactions: &[Interaction]) -> Option<usize> {
        self.visible
            .iter()
            .copied()
            .filter(|index| {
                !self.pinned.contains(index) || interactions[*index].duration().from > time
            })
            .min_by(|a, b| {
                interactions[*a]
                    .hide_at()
                    .total_cmp(&interactions[*b].hide_at())
                    .then(a.cmp(b))
            })
    }

    /// An interaction that should already be visible but is not, else the
    /// upcoming one with the earliest start; ties by authoring order
    fn find_next_to_show(&self, time: f64, interactions: &[Interaction]) -> Option<usize> {
        let overdue = interactions.iter().position(|i| {
            i.visible_at(time) && !i.is_rendered() && !self.visible.contains(&i.index())
        });
        if overdue.is_some() {
            return overdue;
        }

        interactions
            .iter()
            .filter(|i| !i.is_rendered())
            .filter(|i| {
                let from = i.duration().from;
                from > time
                    || (from == time && self.last_shown.map_or(true, |last| i.index() > last))
            })
            .min_by(|a, b| {
                a.duration()
                    .from
                    .total_cmp(&b.duration().from)
                    .then(a.index().cmp(&b.index()))
            })
            .map(Interaction::index)
    }

    pub fn subscribe(
        &mut self,
        kind: TimelineEventKind,
        handler: impl FnMut(&TimelineEvent) + 'static,
    ) -> SubscriptionToken {
        self.events.subscribe(kind, handler)
    }

    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        self.events.unsubscribe(token)
    }
}

impl Default for TimelineEngine {
    fn default() -> Self {
        Self::new()
    }
}
