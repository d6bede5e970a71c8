//! Pauses the delivery at `[pause/]` markers.
use std::{collections::HashMap, sync::Arc, time::Duration};

use bevy::{log::warn, utils::BoxedFuture};
use tokio_util::sync::CancellationToken;

use crate::{
    errors::HandlerError,
    handler::ActionMarkupHandler,
    markup::{MarkupParseResult, MarkupValue},
    surface::LineSurface,
    ticker::{wait_for, Ticker},
};

/// Name of the attribute and of its duration property.
const PAUSE: &str = "pause";

/// Pause used when a marker has no usable duration.
const DEFAULT_PAUSE: Duration = Duration::from_millis(1000);

/// Pauses the delivery before the character a `pause` attribute is anchored on.
///
/// An integer duration is read as milliseconds, a float as seconds. Without a
/// duration the pause lasts one second.
pub struct PauseHandler {
    /// The scheduler pauses wait on.
    ticker: Arc<dyn Ticker>,
    /// Pause durations by character index, for the current line.
    pauses: HashMap<usize, Duration>,
}

impl PauseHandler {
    /// Creates a pause handler waiting on `ticker`.
    pub fn new(ticker: Arc<dyn Ticker>) -> Self {
        Self {
            ticker,
            pauses: HashMap::new(),
        }
    }

    /// The pause before the character at `index`, if any.
    pub fn pause_at(&self, index: usize) -> Option<Duration> {
        self.pauses.get(&index).copied()
    }
}

/// Reads the duration of a pause marker.
fn pause_duration(value: Option<&MarkupValue>) -> Duration {
    match value {
        None => DEFAULT_PAUSE,
        Some(MarkupValue::Integer(ms)) => Duration::from_millis(u64::try_from(*ms).unwrap_or(0)),
        Some(MarkupValue::Float(secs)) => {
            Duration::try_from_secs_f32(secs.max(0.0)).unwrap_or(DEFAULT_PAUSE)
        }
        Some(other) => {
            warn!(
                "Pause property is of type {}, which is not allowed. Defaulting to one second.",
                other.type_name()
            );
            DEFAULT_PAUSE
        }
    }
}

impl ActionMarkupHandler for PauseHandler {
    fn on_prepare_for_line(&mut self, line: &MarkupParseResult, _surface: &dyn LineSurface) {
        self.pauses = line
            .attributes_named(PAUSE)
            .map(|attr| (attr.position, pause_duration(attr.property(PAUSE))))
            .collect();
    }

    fn on_character_will_appear<'a>(
        &'a mut self,
        character_index: usize,
        _line: &'a MarkupParseResult,
        cancel: &'a CancellationToken,
    ) -> BoxedFuture<'a, Result<(), HandlerError>> {
        let pause = self.pause_at(character_index);
        Box::pin(async move {
            match pause {
                Some(duration) => wait_for(self.ticker.as_ref(), duration, cancel).await,
                None => Ok(()),
            }
        })
    }

    fn on_line_display_complete(&mut self) {
        self.pauses.clear();
    }
}
