//! A single timed interaction and its content lifecycle

use crate::collaborators::{Dialog, DialogContent};
use crate::content::{ContentEvent, ContentFactory, ContentInstance};
use crate::events::{Event, EventEmitter, SubscriptionToken};
use crate::modal::ModalSlot;
use ivid_core::{
    ContentState, DisplayMode, InteractionParams, Position, PreviousState, Progress, ScoreRecord,
    TimeWindow,
};
use std::fmt;
use tracing::{debug, warn};

/// Rendering created when an interaction becomes visible
#[derive(Debug, Clone, PartialEq)]
pub struct RenderHandle {
    pub interaction: usize,
    pub mode: DisplayMode,
    pub position: Position,
    /// Whether the rendering requested the blocking overlay
    pub blocking: bool,
}

/// Events emitted by an interaction
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionEvent {
    Shown { interaction: usize },
    Hidden { interaction: usize },
    Progressed { interaction: usize, progress: Progress },
    Scored { interaction: usize, score: ScoreRecord },
    Reset { interaction: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionEventKind {
    Show,
    Hide,
    Progress,
    Score,
    Reset,
}

impl Event for InteractionEvent {
    type Kind = InteractionEventKind;

    fn kind(&self) -> InteractionEventKind {
        match self {
            InteractionEvent::Shown { .. } => InteractionEventKind::Show,
            InteractionEvent::Hidden { .. } => InteractionEventKind::Hide,
            InteractionEvent::Progressed { .. } => InteractionEventKind::Progress,
            InteractionEvent::Scored { .. } => InteractionEventKind::Score,
            InteractionEvent::Reset { .. } => InteractionEventKind::Reset,
        }
    }
}

/// Result of an answer event with a known score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub score: ScoreRecord,
    pub full_score: bool,
}

/// One authored timed overlay
pub struct Interaction {
    index: usize,
    id: String,
    params: InteractionParams,
    window: TimeWindow,
    content: Option<Box<dyn ContentInstance>>,
    content_failed: bool,
    previous_state: Option<ContentState>,
    score: Option<u32>,
    max_score: Option<u32>,
    progress: Progress,
    rendered: Option<RenderHandle>,
    events: EventEmitter<InteractionEvent>,
}

impl Interaction {
    /// Creates an interaction, restoring score and progress from a previous attempt
    pub fn new(
        index: usize,
        id: impl Into<String>,
        params: InteractionParams,
        previous: Option<&PreviousState>,
    ) -> ivid_core::Result<Self> {
        let window = params.validate(index)?;
        let (progress, score, previous_state) = match previous {
            Some(state) => (
                state.progress_of(index),
                state.score_of(index),
                state.answer_of(index).cloned(),
            ),
            None => (Progress::None, None, None),
        };

        Ok(Self {
            index,
            id: id.into(),
            params,
            window,
            content: None,
            content_failed: false,
            previous_state,
            score: score.map(|s| s.score),
            max_score: score.map(|s| s.max_score),
            progress,
            rendered: None,
            events: EventEmitter::new(),
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn params(&self) -> &InteractionParams {
        &self.params
    }

    pub fn title(&self) -> String {
        self.params.title()
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.params.display_mode
    }

    pub fn is_label(&self) -> bool {
        self.params.is_label()
    }

    /// Authored window, for display such as seek bar dots
    pub fn duration(&self) -> TimeWindow {
        self.window
    }

    /// First time at which the interaction is no longer visible
    pub fn hide_at(&self) -> f64 {
        self.window.hide_at()
    }

    pub fn visible_at(&self, time: f64) -> bool {
        self.window.visible_at(time)
    }

    pub fn is_rendered(&self) -> bool {
        self.rendered.is_some()
    }

    pub fn render_handle(&self) -> Option<&RenderHandle> {
        self.rendered.as_ref()
    }

    pub fn requires_completion(&self) -> bool {
        self.params.requires_completion && !self.is_label()
    }

    /// Whether the video pauses when this interaction appears
    pub fn pauses_video(&self) -> bool {
        !self.is_label()
            && (self.params.pause
                || (self.is_gated() && self.display_mode() == DisplayMode::Poster))
    }

    pub fn score(&self) -> Option<u32> {
        self.score
    }

    pub fn max_score(&self) -> Option<u32> {
        self.max_score
    }

    pub fn score_record(&self) -> Option<ScoreRecord> {
        Some(ScoreRecord::new(self.score?, self.max_score?))
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    /// Whether the content failed and no longer contributes a score
    pub fn content_failed(&self) -> bool {
        self.content_failed
    }

    /// `score >= max_score`, failing closed.
    ///
    /// An unset maximum is never full. A 0/0 score only counts as full once the
    /// content has signalled that it was answered.
    pub fn has_full_score(&self) -> bool {
        match (self.score, self.max_score) {
            (Some(score), Some(max)) if max > 0 => score >= max,
            (Some(_), Some(0)) => self.progress == Progress::Answered,
            _ => false,
        }
    }

    /// Required and not yet at full score
    pub fn is_gated(&self) -> bool {
        self.requires_completion() && !self.has_full_score()
    }

    pub fn dialog_content(&self) -> DialogContent {
        DialogContent {
            interaction: self.index,
            title: self.title(),
            library: self
                .params
                .action
                .as_ref()
                .map(|a| a.library.clone())
                .unwrap_or_default(),
        }
    }

    /// Shows or hides the interaction to match `time`.
    ///
    /// Returns the new rendering when the interaction was shown, `None` when it
    /// was hidden or was already in the right state.
    pub fn toggle<D: Dialog>(
        &mut self,
        time: f64,
        factory: &mut dyn ContentFactory,
        modal: &mut ModalSlot<D>,
    ) -> Option<RenderHandle> {
        match (self.visible_at(time), self.is_rendered()) {
            (false, true) => {
                self.remove(modal);
                None
            }
            (true, false) => Some(self.render(factory, modal)),
            _ => None,
        }
    }

    fn render<D: Dialog>(
        &mut self,
        factory: &mut dyn ContentFactory,
        modal: &mut ModalSlot<D>,
    ) -> RenderHandle {
        self.ensure_content(factory);

        let handle = RenderHandle {
            interaction: self.index,
            mode: self.display_mode(),
            position: self.params.position,
            blocking: self.is_gated(),
        };

        if handle.mode != DisplayMode::Button {
            self.attach_content(&handle);
        }
        if handle.blocking {
            modal.request_overlay(self.index);
        }

        debug!(interaction = self.index, mode = ?handle.mode, "rendered interaction");
        self.rendered = Some(handle.clone());
        self.events.emit(&InteractionEvent::Shown { interaction: self.index });
        handle
    }

    fn ensure_content(&mut self, factory: &mut dyn ContentFactory) {
        if self.content.is_some() || self.content_failed {
            return;
        }
        let Some(action) = self.params.action.as_ref() else {
            return;
        };
        match factory.create(self.index, action, self.previous_state.as_ref()) {
            Ok(content) => self.content = Some(content),
            Err(e) => {
                warn!(interaction = self.index, error = %e, "failed to create content");
                self.content_failed = true;
            }
        }
    }

    /// Attaches the content to a rendering; failures are logged and disable scoring
    pub fn attach_content(&mut self, handle: &RenderHandle) {
        if let Some(content) = self.content.as_mut() {
            if let Err(e) = content.attach(handle) {
                warn!(interaction = self.index, error = %e, "failed to attach content");
                self.content_failed = true;
            }
        }
    }

    /// Attaches the content to the current rendering, e.g. when opened in a dialog
    pub fn attach_to_current(&mut self) {
        if let Some(handle) = self.rendered.clone() {
            self.attach_content(&handle);
        }
    }

    /// Pauses any media playing inside the content
    pub fn pause_content(&mut self) {
        let Some(pausable) = self.content.as_mut().and_then(|c| c.as_pausable()) else {
            return;
        };
        if let Err(e) = pausable.pause() {
            warn!(interaction = self.index, error = %e, "failed to pause content");
            self.content_failed = true;
        }
    }

    /// Hides the interaction regardless of time. Returns false if it was not rendered.
    pub fn remove<D: Dialog>(&mut self, modal: &mut ModalSlot<D>) -> bool {
        if self.rendered.take().is_none() {
            return false;
        }
        self.pause_content();
        modal.close(self.index);
        modal.release_overlay(self.index);

        debug!(interaction = self.index, "removed interaction");
        self.events.emit(&InteractionEvent::Hidden { interaction: self.index });
        true
    }

    /// Records an outcome event from the content.
    ///
    /// Returns the answer outcome when the event answered the interaction and a
    /// score is known.
    pub fn record_event(&mut self, event: &ContentEvent) -> Option<AnswerOutcome> {
        if self.is_label() {
            return None;
        }
        let next = event.verb.progress()?;
        self.advance_progress(next);
        if next != Progress::Answered {
            return None;
        }
        if self.content_failed {
            debug!(interaction = self.index, "ignoring score from failed content");
            return None;
        }

        let reported = event.score.map(|s| ScoreRecord::new(s.raw, s.max)).or_else(|| {
            self.content
                .as_ref()
                .and_then(|c| c.as_scoreable())
                .map(|s| ScoreRecord::new(s.score(), s.max_score()))
        });
        let score = reported?;
        self.score = Some(score.score);
        self.max_score = Some(score.max_score);
        self.events.emit(&InteractionEvent::Scored {
            interaction: self.index,
            score,
        });

        Some(AnswerOutcome {
            score,
            full_score: self.has_full_score(),
        })
    }

    fn advance_progress(&mut self, next: Progress) {
        if self.progress.advance(next) {
            self.events.emit(&InteractionEvent::Progressed {
                interaction: self.index,
                progress: self.progress,
            });
        }
    }

    /// Clears score, progress and sub-state and rebuilds the content fresh
    pub fn reset_task<D: Dialog>(
        &mut self,
        factory: &mut dyn ContentFactory,
        modal: &mut ModalSlot<D>,
    ) {
        self.score = None;
        self.max_score = None;
        self.progress = Progress::None;
        self.previous_state = None;
        // Let the old instance clear anything it persisted before it is rebuilt
        if let Some(resettable) = self.content.as_mut().and_then(|c| c.as_resettable()) {
            resettable.reset_task();
        }
        self.content = None;
        self.content_failed = false;

        if let Some(handle) = self.rendered.clone() {
            self.ensure_content(factory);
            if handle.mode != DisplayMode::Button {
                self.attach_content(&handle);
            }
            if self.is_gated() {
                modal.request_overlay(self.index);
            }
        }

        debug!(interaction = self.index, "reset task");
        self.events.emit(&InteractionEvent::Reset { interaction: self.index });
    }

    /// Sub-state for a later attempt: the live content's state, or the restored one
    pub fn current_state(&self) -> Option<ContentState> {
        match self.content.as_ref() {
            Some(content) => content.as_stateful().and_then(|s| s.current_state()),
            None => self.previous_state.clone(),
        }
    }

    pub fn subscribe(
        &mut self,
        kind: InteractionEventKind,
        handler: impl FnMut(&InteractionEvent) + 'static,
    ) -> SubscriptionToken {
        self.events.subscribe(kind, handler)
    }

    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        self.events.unsubscribe(token)
    }
}

impl fmt::Debug for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interaction")
            .field("index", &self.index)
            .field("id", &self.id)
            .field("window", &self.window)
            .field("mode", &self.params.display_mode)
            .field("has_content", &self.content.is_some())
            .field("score", &self.score)
            .field("max_score", &self.max_score)
            .field("progress", &self.progress)
            .field("rendered", &self.rendered.is_some())
            .finish()
    }
}
