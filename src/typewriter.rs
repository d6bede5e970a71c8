//! The typewriter: reveals a line on a [`LineSurface`] over time.
//!
//! A delivery moves through `Idle → Preparing → Revealing → Completing → Idle`.
//! What changes between the [`Pacing`] variants is only how long the typewriter
//! waits before each character while `Revealing`.
use std::{collections::BTreeSet, sync::Arc};

use bevy::log::{debug, warn};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::{
    handler::{ActionMarkupHandler, HandlerSet},
    markup::MarkupParseResult,
    surface::LineSurface,
    ticker::Ticker,
};

/// How a typewriter paces the reveal of a line.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub enum Pacing {
    /// One character at a time. A rate of zero (or less) imposes no delay.
    Letter {
        /// Characters revealed per second.
        characters_per_second: f32,
    },
    /// One word at a time. Characters inside a word appear back to back.
    Word {
        /// Words revealed per second.
        words_per_second: f32,
    },
    /// Everything at once, still calling the handlers for every character.
    Instant,
    /// Imposes no delay of its own but respects the delays handlers impose.
    Fake,
    /// Behaves like [`Pacing::Instant`].
    None,
}

impl Default for Pacing {
    fn default() -> Self {
        Pacing::Letter {
            characters_per_second: 60.0,
        }
    }
}

impl Pacing {
    /// Seconds to wait for each paced unit. Zero when the pacing imposes no delay.
    pub fn seconds_per_unit(&self) -> f64 {
        let rate = match self {
            Pacing::Letter {
                characters_per_second,
            } => *characters_per_second,
            Pacing::Word { words_per_second } => *words_per_second,
            Pacing::Instant | Pacing::Fake | Pacing::None => 0.0,
        };
        if rate > 0.0 {
            1.0 / f64::from(rate)
        } else {
            0.0
        }
    }
}

/// Where a typewriter is in the delivery of a line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    /// No line is being delivered.
    #[default]
    Idle,
    /// The text is on the surface and handlers are preparing for the line.
    Preparing,
    /// Characters are being revealed.
    Revealing,
    /// Every character is visible and handlers are being told.
    Completing,
}

/// How a delivery ended. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The whole line was revealed at its own pace.
    Completed,
    /// The cancellation token was triggered, so the rest of the line was fast-forwarded.
    HurriedUp,
    /// There was no surface to show the line on.
    NoSurface,
}

/// Drives the delivery of lines on a surface, calling the markup handlers
/// at each step.
///
/// ```rust
/// use std::sync::Arc;
/// use bevy_typewriter::prelude::*;
/// use futures_util::FutureExt;
/// use tokio_util::sync::CancellationToken;
///
/// let surface = TextSurface::default();
/// let mut typewriter = Typewriter::new(Arc::new(FrameTicker::default()), Pacing::Instant)
///     .with_surface(surface.clone());
///
/// let line = MarkupParseResult::new("Go!");
/// // nothing to wait for, so a single poll delivers the whole line
/// let outcome = typewriter.run(&line, &CancellationToken::new()).now_or_never();
///
/// assert_eq!(outcome, Some(DeliveryOutcome::Completed));
/// assert_eq!(surface.visible_text(), "Go!");
/// ```
pub struct Typewriter {
    /// The surface lines are shown on.
    surface: Option<Box<dyn LineSurface>>,
    /// The markup handlers, in dispatch order.
    handlers: HandlerSet,
    /// The scheduler the typewriter waits on.
    ticker: Arc<dyn Ticker>,
    /// How the reveal is paced.
    pacing: Pacing,
    /// The current delivery state.
    state: DeliveryState,
    /// The line [`Typewriter::prepare_for_content`] was last called with.
    prepared: Option<MarkupParseResult>,
}

impl std::fmt::Debug for Typewriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Typewriter")
            .field("has_surface", &self.surface.is_some())
            .field("handlers", &self.handlers)
            .field("pacing", &self.pacing)
            .field("state", &self.state)
            .finish()
    }
}

impl Typewriter {
    /// Creates a typewriter without a surface and without handlers.
    pub fn new(ticker: Arc<dyn Ticker>, pacing: Pacing) -> Self {
        Self {
            surface: None,
            handlers: HandlerSet::default(),
            ticker,
            pacing,
            state: DeliveryState::Idle,
            prepared: None,
        }
    }

    /// Sets the surface lines are shown on.
    pub fn with_surface(mut self, surface: impl LineSurface + 'static) -> Self {
        self.surface = Some(Box::new(surface));
        self
    }

    /// Adds a markup handler after the existing ones.
    pub fn with_handler(mut self, handler: impl ActionMarkupHandler + 'static) -> Self {
        self.handlers.push(handler);
        self
    }

    /// The markup handlers.
    pub fn handlers_mut(&mut self) -> &mut HandlerSet {
        &mut self.handlers
    }

    /// The scheduler the typewriter waits on.
    pub fn ticker(&self) -> Arc<dyn Ticker> {
        self.ticker.clone()
    }

    /// How the reveal is paced.
    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    /// Changes the pacing of the next deliveries.
    pub fn set_pacing(&mut self, pacing: Pacing) {
        self.pacing = pacing;
    }

    /// Where the typewriter is in the delivery of a line.
    pub fn state(&self) -> DeliveryState {
        self.state
    }

    /// Puts `line` on the surface with nothing visible and lets the handlers
    /// prepare for it, before the delivery starts.
    ///
    /// A following [`Typewriter::run`] with the same line, markup included, won't
    /// prepare the handlers again. Dismissing the content forgets the prepared line.
    pub fn prepare_for_content(&mut self, line: &MarkupParseResult) {
        let Some(surface) = self.surface.as_deref_mut() else {
            return;
        };
        self.state = DeliveryState::Preparing;
        surface.set_visible_characters(0);
        surface.set_text(&line.text);
        self.handlers.prepare_for_line(line, surface);
        self.prepared = Some(line.clone());
    }

    /// Shows all of `line` at once, without calling any handler.
    pub fn show_immediately(&mut self, line: &MarkupParseResult) {
        let Some(surface) = self.surface.as_deref_mut() else {
            warn!("Can't show line \"{}\", because no surface was provided", line.text);
            return;
        };
        surface.set_text(&line.text);
        let count = surface.deliverable_character_count(&line.text);
        surface.set_visible_characters(count);
    }

    /// Tells every handler the current line is about to go away.
    pub fn content_will_dismiss(&mut self) {
        self.prepared = None;
        self.state = DeliveryState::Idle;
        self.handlers.line_will_dismiss();
    }

    /// Delivers `line` on the surface.
    ///
    /// Once `cancel` is triggered the typewriter stops waiting between characters.
    /// Every remaining character still gets its handler calls, the whole line ends
    /// up visible and the handlers are told the line is complete.
    ///
    /// Without a surface nothing is shown, but the handlers are still told the line
    /// is complete.
    pub async fn run(
        &mut self,
        line: &MarkupParseResult,
        cancel: &CancellationToken,
    ) -> DeliveryOutcome {
        let Some(surface) = self.surface.as_deref_mut() else {
            warn!("Can't deliver line \"{}\", because no surface was provided", line.text);
            self.handlers.line_display_complete();
            self.prepared = None;
            return DeliveryOutcome::NoSurface;
        };

        self.state = DeliveryState::Preparing;
        surface.set_visible_characters(0);
        surface.set_text(&line.text);
        if self.prepared.take().as_ref() != Some(line) {
            self.handlers.prepare_for_line(line, surface);
        }
        self.handlers.line_display_begin(line, surface);

        let count = surface.deliverable_character_count(&line.text);
        let seconds_per_unit = self.pacing.seconds_per_unit();
        let mut boundaries = match self.pacing {
            Pacing::Word { .. } => word_boundaries(surface, &line.text, count),
            _ => BTreeSet::new(),
        };
        debug!(
            "Delivering {} characters with {:?} pacing",
            count, self.pacing
        );

        self.state = DeliveryState::Revealing;
        // Pre-charged so that the first unit appears without waiting.
        let mut accumulated_delay = seconds_per_unit;
        let mut cursor = 0;
        for index in 0..count {
            let gated = match self.pacing {
                Pacing::Word { .. } => boundaries.remove(&index),
                _ => true,
            };
            if gated {
                while !cancel.is_cancelled() && accumulated_delay < seconds_per_unit {
                    let before = self.ticker.now();
                    self.ticker.next_tick().await;
                    accumulated_delay += self.ticker.now() - before;
                }
                accumulated_delay -= seconds_per_unit;
            }

            self.handlers
                .character_will_appear(index, line, cancel)
                .await;

            cursor += 1;
            // Once hurried up, the rest of the line appears in one step below.
            if !cancel.is_cancelled() {
                surface.set_visible_characters(cursor);
            }
        }

        self.state = DeliveryState::Completing;
        surface.set_visible_characters(count);
        self.handlers.line_display_complete();
        self.state = DeliveryState::Idle;

        if cancel.is_cancelled() {
            DeliveryOutcome::HurriedUp
        } else {
            DeliveryOutcome::Completed
        }
    }
}

/// Indices of the characters that start a new word-paced unit: the first character
/// and the one right after the end of every word.
fn word_boundaries(surface: &dyn LineSurface, text: &str, count: usize) -> BTreeSet<usize> {
    let mut boundaries: BTreeSet<usize> = surface
        .word_last_characters(text)
        .into_iter()
        .map(|last| last + 1)
        .filter(|&index| index < count)
        .collect();
    boundaries.insert(0);
    boundaries
}
