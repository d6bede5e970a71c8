//! Markup action handlers and the ordered set the typewriter dispatches to.
use bevy::{
    log::{error, trace},
    utils::BoxedFuture,
};
use tokio_util::sync::CancellationToken;

use crate::{errors::HandlerError, markup::MarkupParseResult, surface::LineSurface};

/// An object that reacts to the delivery of a line, and can optionally control
/// the timing of that delivery.
///
/// Handlers live across many lines. Any per-line state must be rebuilt in
/// [`on_prepare_for_line`](ActionMarkupHandler::on_prepare_for_line), which is
/// called before each new line.
///
/// A handler that pauses for 200ms before every `!`:
///
/// ```rust
/// use std::{sync::Arc, time::Duration};
/// use bevy::utils::BoxedFuture;
/// use bevy_typewriter::prelude::*;
/// use tokio_util::sync::CancellationToken;
///
/// struct Emphasis {
///     ticker: Arc<dyn Ticker>,
///     bangs: Vec<usize>,
/// }
///
/// impl ActionMarkupHandler for Emphasis {
///     fn on_prepare_for_line(&mut self, line: &MarkupParseResult, _: &dyn LineSurface) {
///         self.bangs = line.text.chars().enumerate().filter(|(_, c)| *c == '!').map(|(i, _)| i).collect();
///     }
///
///     fn on_character_will_appear<'a>(
///         &'a mut self,
///         character_index: usize,
///         _line: &'a MarkupParseResult,
///         cancel: &'a CancellationToken,
///     ) -> BoxedFuture<'a, Result<(), HandlerError>> {
///         let bang = self.bangs.contains(&character_index);
///         Box::pin(async move {
///             if bang {
///                 wait_for(self.ticker.as_ref(), Duration::from_millis(200), cancel).await?;
///             }
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait ActionMarkupHandler: Send + Sync {
    /// Called before any part of the line is visible.
    fn on_prepare_for_line(&mut self, line: &MarkupParseResult, surface: &dyn LineSurface);

    /// Called once the full text is on the surface, before any character is revealed.
    fn on_line_display_begin(&mut self, _line: &MarkupParseResult, _surface: &dyn LineSurface) {}

    /// Called right before the character at `character_index` is revealed.
    ///
    /// The typewriter waits for the returned future before calling the next handler.
    /// Returning [`HandlerError::Cancelled`] after observing `cancel` is expected and
    /// never stops the delivery.
    fn on_character_will_appear<'a>(
        &'a mut self,
        _character_index: usize,
        _line: &'a MarkupParseResult,
        _cancel: &'a CancellationToken,
    ) -> BoxedFuture<'a, Result<(), HandlerError>> {
        Box::pin(async { Ok(()) })
    }

    /// Called once every character of the line is visible, whether the line was
    /// delivered in full or hurried up.
    fn on_line_display_complete(&mut self) {}

    /// Called when the line is about to be removed from display.
    fn on_line_will_dismiss(&mut self) {}
}

/// An ordered collection of [`ActionMarkupHandler`]s.
///
/// Every lifecycle call is forwarded to every handler in the order they were added.
#[derive(Default)]
pub struct HandlerSet {
    /// The handlers, in dispatch order.
    handlers: Vec<Box<dyn ActionMarkupHandler>>,
}

impl std::fmt::Debug for HandlerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerSet")
            .field("len", &self.handlers.len())
            .finish()
    }
}

impl HandlerSet {
    /// Adds a handler at the end of the dispatch order.
    pub fn push(&mut self, handler: impl ActionMarkupHandler + 'static) {
        self.handlers.push(Box::new(handler));
    }

    /// Adds a handler at the front of the dispatch order, so it runs before every other one.
    pub fn push_front(&mut self, handler: impl ActionMarkupHandler + 'static) {
        self.handlers.insert(0, Box::new(handler));
    }

    /// Number of handlers in the set.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the set has no handlers.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Calls [`ActionMarkupHandler::on_prepare_for_line`] on every handler.
    pub fn prepare_for_line(&mut self, line: &MarkupParseResult, surface: &dyn LineSurface) {
        for handler in &mut self.handlers {
            handler.on_prepare_for_line(line, surface);
        }
    }

    /// Calls [`ActionMarkupHandler::on_line_display_begin`] on every handler.
    pub fn line_display_begin(&mut self, line: &MarkupParseResult, surface: &dyn LineSurface) {
        for handler in &mut self.handlers {
            handler.on_line_display_begin(line, surface);
        }
    }

    /// Runs [`ActionMarkupHandler::on_character_will_appear`] on every handler, one
    /// after the other.
    ///
    /// Cancellations are swallowed and failures are logged, so every handler always
    /// gets its turn.
    pub async fn character_will_appear(
        &mut self,
        character_index: usize,
        line: &MarkupParseResult,
        cancel: &CancellationToken,
    ) {
        for handler in &mut self.handlers {
            match handler
                .on_character_will_appear(character_index, line, cancel)
                .await
            {
                Ok(()) => {}
                Err(HandlerError::Cancelled) => {
                    trace!("Handler cancelled at character {}", character_index);
                }
                Err(err) => {
                    error!("Handler failed at character {}: {}", character_index, err);
                }
            }
        }
    }

    /// Calls [`ActionMarkupHandler::on_line_display_complete`] on every handler.
    pub fn line_display_complete(&mut self) {
        for handler in &mut self.handlers {
            handler.on_line_display_complete();
        }
    }

    /// Calls [`ActionMarkupHandler::on_line_will_dismiss`] on every handler.
    pub fn line_will_dismiss(&mut self) {
        for handler in &mut self.handlers {
            handler.on_line_will_dismiss();
        }
    }
}
