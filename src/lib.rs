#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]
#![forbid(unsafe_code)]
#![warn(clippy::doc_markdown)]
// Often exceeded by queries
#![allow(clippy::type_complexity)]
// Unhelpful for systems
#![allow(clippy::too_many_arguments)]

//! [`bevy_typewriter`] is a Bevy plugin that delivers dialogue lines over time,
//! letter by letter or word by word, with markup handlers that can pause,
//! animate or react to each character as it appears.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bevy::prelude::*;
//! use bevy_typewriter::prelude::*;
//!
//! fn setup(mut commands: Commands, ticker: Res<FrameTicker>) {
//!     let surface = TextSurface::default();
//!     let presenter = LinePresenter::from_settings(
//!         Arc::new(ticker.clone()),
//!         &TypewriterSettings::default(),
//!     )
//!     .with_surface(surface.clone());
//!     commands.spawn(LineDelivererBundle::new(presenter, surface));
//! }
//!
//! App::new()
//!     .add_plugins((MinimalPlugins, AssetPlugin::default(), TypewriterPlugin))
//!     .add_systems(Startup, setup)
//!     .run();
//! ```

use bevy::prelude::*;

use events::TypewriterEventsPlugin;
use loader::TypewriterSettingsLoader;
use settings::TypewriterSettings;
use systems::{
    advance_frame_ticker, forward_line_requests, poll_line_deliveries, start_line_deliveries,
};
use ticker::FrameTicker;

pub mod errors;
pub mod events;
pub mod handler;
pub mod handlers;
pub mod loader;
pub mod markup;
pub mod prelude;
pub mod presenter;
pub mod settings;
pub mod surface;
pub mod systems;
pub mod ticker;
pub mod typewriter;

/// The systems of the plugin. The ticker moves in [`PreUpdate`], deliveries are
/// started and polled in [`Update`].
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypewriterSet;

/// The plugin that delivers lines over time.
pub struct TypewriterPlugin;

impl Plugin for TypewriterPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FrameTicker>()
            .init_asset::<TypewriterSettings>()
            .init_asset_loader::<TypewriterSettingsLoader>()
            .add_plugins(TypewriterEventsPlugin)
            .add_systems(PreUpdate, advance_frame_ticker.in_set(TypewriterSet))
            .add_systems(
                Update,
                (
                    start_line_deliveries,
                    forward_line_requests,
                    poll_line_deliveries,
                )
                    .chain()
                    .in_set(TypewriterSet),
            );
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{
        future::Future,
        pin::pin,
        sync::{Arc, Mutex},
        task::{Context, Poll},
        time::Duration,
    };

    use bevy::{prelude::*, utils::BoxedFuture};
    use futures_util::task::noop_waker_ref;
    use tokio_util::sync::CancellationToken;

    use crate::{
        errors::HandlerError,
        events::{line_events::LineDeliveredEvent, requests::DeliverLineRequest},
        handler::ActionMarkupHandler,
        markup::MarkupParseResult,
        settings::TypewriterSettings,
        surface::LineSurface,
        ticker::{FrameTicker, Ticker},
        TypewriterPlugin,
    };

    /// Frames [`drive`] runs before giving up.
    const MAX_FRAMES: usize = 10_000;

    /// A minimal Bevy app with the Typewriter plugin.
    pub fn minimal_app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default(), TypewriterPlugin));
        app
    }

    /// Polls `fut` to completion, advancing `ticker` by `frame` whenever it is pending.
    pub fn drive<F: Future>(ticker: &FrameTicker, frame: Duration, fut: F) -> F::Output {
        drive_with(ticker, frame, fut, |_| {})
    }

    /// Like [`drive`], calling `on_frame` with the frame count after every advance.
    pub fn drive_with<F: Future>(
        ticker: &FrameTicker,
        frame: Duration,
        fut: F,
        mut on_frame: impl FnMut(u64),
    ) -> F::Output {
        let mut fut = pin!(fut);
        let mut cx = Context::from_waker(noop_waker_ref());
        for _ in 0..MAX_FRAMES {
            if let Poll::Ready(output) = fut.as_mut().poll(&mut cx) {
                return output;
            }
            ticker.advance(frame);
            on_frame(ticker.frame());
        }
        panic!("future still pending after {} frames", MAX_FRAMES);
    }

    /// Shared record of handler calls.
    #[derive(Debug, Clone, Default)]
    pub struct EventLog(Arc<Mutex<Vec<String>>>);

    impl EventLog {
        /// Records an entry.
        pub fn push(&self, entry: String) {
            self.0.lock().unwrap().push(entry);
        }

        /// Takes every entry recorded so far.
        pub fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    /// A handler logging every call as `name:call`.
    pub struct RecordingHandler {
        /// Prefix of the log entries.
        name: String,
        /// Where calls are logged.
        log: EventLog,
        /// Returned by every per-character call.
        failure: Option<HandlerError>,
        /// Ticks every per-character call waits for.
        suspend: Option<(FrameTicker, usize)>,
    }

    impl RecordingHandler {
        /// Creates a handler logging to `log`.
        pub fn new(name: &str, log: &EventLog) -> Self {
            Self {
                name: name.to_string(),
                log: log.clone(),
                failure: None,
                suspend: None,
            }
        }

        /// Makes every per-character call fail with `err`.
        pub fn failing_with(mut self, err: HandlerError) -> Self {
            self.failure = Some(err);
            self
        }

        /// Makes every per-character call wait for `ticks` ticks, then log `name:resume:i`.
        pub fn suspending(mut self, ticker: &FrameTicker, ticks: usize) -> Self {
            self.suspend = Some((ticker.clone(), ticks));
            self
        }

        /// Logs `call`.
        fn record(&self, call: &str) {
            self.log.push(format!("{}:{}", self.name, call));
        }
    }

    impl ActionMarkupHandler for RecordingHandler {
        fn on_prepare_for_line(&mut self, _line: &MarkupParseResult, _surface: &dyn LineSurface) {
            self.record("prepare");
        }

        fn on_line_display_begin(&mut self, _line: &MarkupParseResult, _surface: &dyn LineSurface) {
            self.record("begin");
        }

        fn on_character_will_appear<'a>(
            &'a mut self,
            character_index: usize,
            _line: &'a MarkupParseResult,
            _cancel: &'a CancellationToken,
        ) -> BoxedFuture<'a, Result<(), HandlerError>> {
            self.record(&format!("char:{}", character_index));
            Box::pin(async move {
                if let Some((ticker, ticks)) = &self.suspend {
                    for _ in 0..*ticks {
                        ticker.next_tick().await;
                    }
                    self.record(&format!("resume:{}", character_index));
                }
                match &self.failure {
                    Some(err) => Err(err.clone()),
                    None => Ok(()),
                }
            })
        }

        fn on_line_display_complete(&mut self) {
            self.record("complete");
        }

        fn on_line_will_dismiss(&mut self) {
            self.record("dismiss");
        }
    }

    /// A surface recording every reveal with the time it happened at.
    #[derive(Clone)]
    pub struct RecordingSurface {
        /// The clock reveals are timed with.
        ticker: FrameTicker,
        /// Every `set_visible_characters` value, with its time.
        reveals: Arc<Mutex<Vec<(usize, f64)>>>,
    }

    impl RecordingSurface {
        /// Creates a surface timing reveals with `ticker`.
        pub fn new(ticker: &FrameTicker) -> Self {
            Self {
                ticker: ticker.clone(),
                reveals: Arc::default(),
            }
        }

        /// Every reveal, with its time.
        pub fn reveals(&self) -> Vec<(usize, f64)> {
            self.reveals.lock().unwrap().clone()
        }

        /// Every reveal.
        pub fn values(&self) -> Vec<usize> {
            self.reveals().into_iter().map(|(value, _)| value).collect()
        }
    }

    impl LineSurface for RecordingSurface {
        fn set_text(&mut self, _text: &str) {}

        fn set_visible_characters(&mut self, count: usize) {
            self.reveals.lock().unwrap().push((count, self.ticker.now()));
        }

        fn deliverable_character_count(&self, text: &str) -> usize {
            text.chars().count()
        }
    }

    #[test]
    fn plugin_registers_everything() {
        let app = minimal_app();
        assert!(app.world.contains_resource::<FrameTicker>());
        assert!(app.world.contains_resource::<Assets<TypewriterSettings>>());
        assert!(app.world.contains_resource::<Events<DeliverLineRequest>>());
        assert!(app.world.contains_resource::<Events<LineDeliveredEvent>>());
    }

    #[test]
    fn drive_advances_until_ready() {
        let ticker = FrameTicker::default();
        let next = ticker.next_tick();
        drive(&ticker, Duration::from_millis(10), next);
        assert_eq!(ticker.frame(), 1);
    }
}
