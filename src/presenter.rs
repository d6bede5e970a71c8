//! Presents one line at a time: delivers it, holds it up, then lets it go.
use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;

use crate::{
    handler::ActionMarkupHandler,
    handlers::pause::PauseHandler,
    markup::MarkupParseResult,
    settings::TypewriterSettings,
    surface::LineSurface,
    ticker::{wait_for, Ticker},
    typewriter::{DeliveryOutcome, Typewriter},
};

/// The two ways a player can interrupt a line.
///
/// Hurrying up fast-forwards the delivery of the current line. Asking for the next
/// content also hurries up, and then dismisses the line once it is fully shown.
#[derive(Debug, Clone)]
pub struct LineCancellation {
    /// Triggered when the line should go away.
    next_content: CancellationToken,
    /// Triggered when the delivery should be fast-forwarded. Child of `next_content`.
    hurry_up: CancellationToken,
}

impl Default for LineCancellation {
    fn default() -> Self {
        Self::new()
    }
}

impl LineCancellation {
    /// Creates a fresh pair of tokens.
    pub fn new() -> Self {
        let next_content = CancellationToken::new();
        let hurry_up = next_content.child_token();
        Self {
            next_content,
            hurry_up,
        }
    }

    /// Fast-forwards the delivery of the line.
    pub fn hurry_up(&self) {
        self.hurry_up.cancel();
    }

    /// Asks for the line to be dismissed, hurrying it up first if needed.
    pub fn request_next_content(&self) {
        self.next_content.cancel();
    }

    /// Whether the delivery was asked to hurry up.
    pub fn is_hurried_up(&self) -> bool {
        self.hurry_up.is_cancelled()
    }

    /// Whether the next content was requested.
    pub fn is_next_content_requested(&self) -> bool {
        self.next_content.is_cancelled()
    }

    /// The token deliveries are run with.
    pub fn hurry_up_token(&self) -> &CancellationToken {
        &self.hurry_up
    }

    /// The token a delivered line is held with.
    pub fn next_content_token(&self) -> &CancellationToken {
        &self.next_content
    }
}

/// Runs a [`Typewriter`] for whole lines, from preparation to dismissal.
#[derive(Debug)]
pub struct LinePresenter {
    /// The typewriter lines are delivered with.
    typewriter: Typewriter,
    /// Whether lines are revealed over time or shown at once.
    use_typewriter: bool,
    /// How long a delivered line stays before moving on by itself.
    auto_advance: Option<Duration>,
}

impl LinePresenter {
    /// Wraps `typewriter`, revealing lines over time and waiting for the next
    /// content request after each.
    pub fn new(typewriter: Typewriter) -> Self {
        Self {
            typewriter,
            use_typewriter: true,
            auto_advance: None,
        }
    }

    /// Creates a presenter configured by `settings`.
    ///
    /// With the typewriter effect on, a [`PauseHandler`] is registered ahead of
    /// every other handler.
    pub fn from_settings(ticker: Arc<dyn Ticker>, settings: &TypewriterSettings) -> Self {
        let mut typewriter = Typewriter::new(ticker.clone(), settings.pacing);
        if settings.use_typewriter {
            typewriter.handlers_mut().push_front(PauseHandler::new(ticker));
        }
        Self {
            typewriter,
            use_typewriter: settings.use_typewriter,
            auto_advance: settings.auto_advance_delay(),
        }
    }

    /// Sets the surface lines are shown on.
    pub fn with_surface(mut self, surface: impl LineSurface + 'static) -> Self {
        self.typewriter = self.typewriter.with_surface(surface);
        self
    }

    /// Adds a markup handler after the existing ones.
    pub fn with_handler(mut self, handler: impl ActionMarkupHandler + 'static) -> Self {
        self.typewriter = self.typewriter.with_handler(handler);
        self
    }

    /// Moves on by itself `delay` after a line is delivered.
    pub fn with_auto_advance(mut self, delay: Duration) -> Self {
        self.auto_advance = Some(delay);
        self
    }

    /// The typewriter lines are delivered with.
    pub fn typewriter(&self) -> &Typewriter {
        &self.typewriter
    }

    /// The typewriter lines are delivered with.
    pub fn typewriter_mut(&mut self) -> &mut Typewriter {
        &mut self.typewriter
    }

    /// Whether lines are revealed over time.
    pub fn uses_typewriter(&self) -> bool {
        self.use_typewriter
    }

    /// Shows `line`, revealing it over time unless the typewriter effect is off.
    pub async fn deliver(
        &mut self,
        line: &MarkupParseResult,
        cancellation: &LineCancellation,
    ) -> DeliveryOutcome {
        if !self.use_typewriter {
            self.typewriter.show_immediately(line);
            return DeliveryOutcome::Completed;
        }
        self.typewriter.prepare_for_content(line);
        self.typewriter
            .run(line, cancellation.hurry_up_token())
            .await
    }

    /// Keeps a delivered line up until the next content is requested or, with
    /// auto advance, until the delay runs out.
    pub async fn hold(&self, cancellation: &LineCancellation) {
        let next_content = cancellation.next_content_token();
        match self.auto_advance {
            Some(delay) => {
                // a next content request ends the wait early
                let _ = wait_for(self.typewriter.ticker().as_ref(), delay, next_content).await;
            }
            None => next_content.cancelled().await,
        }
    }

    /// Tells the handlers the line is going away.
    pub fn dismiss(&mut self) {
        self.typewriter.content_will_dismiss();
    }

    /// Delivers `line`, holds it, then dismisses it.
    pub async fn run_line(
        &mut self,
        line: &MarkupParseResult,
        cancellation: &LineCancellation,
    ) -> DeliveryOutcome {
        let outcome = self.deliver(line, cancellation).await;
        self.hold(cancellation).await;
        self.dismiss();
        outcome
    }
}
