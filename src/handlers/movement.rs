//! Moves a character to named positions at `[move/]` markers, holding the
//! line until the character gets there.
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use bevy::{log::warn, math::Vec3, utils::BoxedFuture};
use tokio_util::sync::CancellationToken;

use crate::{
    errors::HandlerError, handler::ActionMarkupHandler, markup::MarkupParseResult,
    surface::LineSurface, ticker::Ticker,
};

/// Something that can travel to a position over time.
pub trait Mover: Send + Sync {
    /// Moves to `destination`, resolving once it is reached.
    ///
    /// When `cancel` is triggered the mover should get to `destination` right away
    /// and return [`HandlerError::Cancelled`].
    fn move_to<'a>(
        &'a mut self,
        destination: Vec3,
        cancel: &'a CancellationToken,
    ) -> BoxedFuture<'a, Result<(), HandlerError>>;
}

/// Moves a character when the line reaches a `move` attribute.
///
/// The attribute's `name` property names the destination, which must have been
/// registered with [`MoveHandler::with_position`].
pub struct MoveHandler {
    /// The character being moved.
    mover: Box<dyn Mover>,
    /// Destinations by name.
    positions: HashMap<String, Vec3>,
    /// Destinations by character index, for the current line.
    movements: HashMap<usize, Vec3>,
}

impl MoveHandler {
    /// Creates a handler moving `mover`.
    pub fn new(mover: impl Mover + 'static) -> Self {
        Self {
            mover: Box::new(mover),
            positions: HashMap::new(),
            movements: HashMap::new(),
        }
    }

    /// Registers a destination `move` attributes can name.
    pub fn with_position(mut self, name: &str, position: Vec3) -> Self {
        self.positions.insert(name.to_string(), position);
        self
    }
}

impl ActionMarkupHandler for MoveHandler {
    fn on_prepare_for_line(&mut self, line: &MarkupParseResult, _surface: &dyn LineSurface) {
        self.movements.clear();
        for attr in line.attributes_named("move") {
            let Some(name) = attr.string_property("name") else {
                continue;
            };
            match self.positions.get(name) {
                Some(position) => {
                    self.movements.insert(attr.position, *position);
                }
                None => warn!("no position called {}", name),
            }
        }
    }

    fn on_character_will_appear<'a>(
        &'a mut self,
        character_index: usize,
        _line: &'a MarkupParseResult,
        cancel: &'a CancellationToken,
    ) -> BoxedFuture<'a, Result<(), HandlerError>> {
        match self.movements.get(&character_index).copied() {
            Some(destination) => self.mover.move_to(destination, cancel),
            None => Box::pin(async { Ok(()) }),
        }
    }

    fn on_line_display_complete(&mut self) {
        self.movements.clear();
    }
}

/// A [`Mover`] that walks a shared position in a straight line at a fixed speed,
/// one step per tick.
///
/// Copy [`TweenMover::position`] into a `Transform` to show the walk.
#[derive(Clone)]
pub struct TweenMover {
    /// The scheduler steps are taken on.
    ticker: Arc<dyn Ticker>,
    /// The current position.
    position: Arc<Mutex<Vec3>>,
    /// Units travelled per second.
    speed: f32,
}

impl TweenMover {
    /// Creates a mover standing at `start`.
    pub fn new(ticker: Arc<dyn Ticker>, start: Vec3, speed: f32) -> Self {
        Self {
            ticker,
            position: Arc::new(Mutex::new(start)),
            speed,
        }
    }

    /// The current position.
    pub fn position(&self) -> Vec3 {
        *self.position.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves the current position.
    fn set_position(&self, position: Vec3) {
        *self.position.lock().unwrap_or_else(PoisonError::into_inner) = position;
    }
}

impl Mover for TweenMover {
    fn move_to<'a>(
        &'a mut self,
        destination: Vec3,
        cancel: &'a CancellationToken,
    ) -> BoxedFuture<'a, Result<(), HandlerError>> {
        Box::pin(async move {
            if self.speed <= 0.0 {
                self.set_position(destination);
                return Ok(());
            }
            loop {
                let current = self.position();
                if current == destination {
                    return Ok(());
                }
                if cancel.is_cancelled() {
                    self.set_position(destination);
                    return Err(HandlerError::Cancelled);
                }
                let before = self.ticker.now();
                self.ticker.next_tick().await;
                let step = self.speed * (self.ticker.now() - before) as f32;
                let offset = destination - current;
                let distance = offset.length();
                if distance <= step {
                    self.set_position(destination);
                } else {
                    self.set_position(current + offset / distance * step);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        markup::MarkupAttribute,
        prelude::{DeliveryOutcome, Pacing, Typewriter},
        surface::TextSurface,
        tests::{drive, drive_with, EventLog, RecordingHandler},
        ticker::FrameTicker,
    };

    /// Frame length used by the tests.
    const FRAME: Duration = Duration::from_millis(250);

    /// A line walking to the door at its fourth character.
    fn walk_line() -> MarkupParseResult {
        MarkupParseResult::new("Let me get that.")
            .with_attribute(MarkupAttribute::new("move", 4).with_property("name", "door"))
    }

    #[test]
    fn line_waits_for_the_walk() {
        let ticker = FrameTicker::default();
        let mover = TweenMover::new(Arc::new(ticker.clone()), Vec3::ZERO, 2.0);
        let log = EventLog::default();
        let mut typewriter = Typewriter::new(Arc::new(ticker.clone()), Pacing::Instant)
            .with_surface(TextSurface::default())
            .with_handler(MoveHandler::new(mover.clone()).with_position("door", Vec3::X * 2.0))
            .with_handler(RecordingHandler::new("after", &log));

        let outcome = drive(
            &ticker,
            FRAME,
            typewriter.run(&walk_line(), &CancellationToken::new()),
        );

        assert_eq!(outcome, DeliveryOutcome::Completed);
        // two units at two units per second
        assert_eq!(ticker.frame(), 4);
        assert_eq!(mover.position(), Vec3::X * 2.0);
        assert!(log.take().contains(&"after:char:4".to_string()));
    }

    #[test]
    fn hurry_up_snaps_to_destination() {
        let ticker = FrameTicker::default();
        let mover = TweenMover::new(Arc::new(ticker.clone()), Vec3::ZERO, 1.0);
        let mut typewriter = Typewriter::new(Arc::new(ticker.clone()), Pacing::Instant)
            .with_surface(TextSurface::default())
            .with_handler(MoveHandler::new(mover.clone()).with_position("door", Vec3::Y * 100.0));
        let cancel = CancellationToken::new();

        let outcome = drive_with(&ticker, FRAME, typewriter.run(&walk_line(), &cancel), |frame| {
            if frame == 2 {
                cancel.cancel();
            }
        });

        assert_eq!(outcome, DeliveryOutcome::HurriedUp);
        assert_eq!(mover.position(), Vec3::Y * 100.0);
        assert_eq!(ticker.frame(), 2);
    }

    #[test]
    fn unknown_position_is_skipped() {
        let ticker = FrameTicker::default();
        let mover = TweenMover::new(Arc::new(ticker.clone()), Vec3::ZERO, 1.0);
        let mut handler = MoveHandler::new(mover.clone());
        handler.on_prepare_for_line(&walk_line(), &TextSurface::default());

        assert!(handler.movements.is_empty());
    }
}
