//! The per-tick scheduler deliveries suspend on.
//!
//! A delivery never blocks a thread. Whenever it has to wait it awaits
//! [`Ticker::next_tick`], which resolves once the scheduler has moved on to the
//! next tick. In a Bevy app the tick is the frame, see [`FrameTicker`].
use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, PoisonError,
    },
    task::{Context, Poll, Waker},
    time::Duration,
};

use bevy::{prelude::Resource, utils::BoxedFuture};
use tokio_util::sync::CancellationToken;

use crate::errors::HandlerError;

/// A clock that advances in discrete ticks.
pub trait Ticker: Send + Sync {
    /// Seconds elapsed on this clock.
    fn now(&self) -> f64;

    /// Resolves on the next tick.
    fn next_tick(&self) -> BoxedFuture<'static, ()>;
}

/// Shared state behind a [`FrameTicker`].
#[derive(Debug, Default)]
struct FrameState {
    /// The current tick number.
    frame: AtomicU64,
    /// Seconds elapsed, stored as `f64` bits.
    seconds: AtomicU64,
    /// Tasks waiting for the next tick.
    wakers: Mutex<Vec<Waker>>,
}

/// A [`Ticker`] advanced once per frame by the plugin, or by hand in tests.
///
/// Clones share the same clock.
#[derive(Resource, Debug, Clone, Default)]
pub struct FrameTicker {
    /// The shared clock.
    state: Arc<FrameState>,
}

impl FrameTicker {
    /// Moves the clock to the next tick, `delta` later than the current one,
    /// and wakes every task waiting for it.
    pub fn advance(&self, delta: Duration) {
        let wakers = {
            let mut wakers = self
                .state
                .wakers
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let seconds = f64::from_bits(self.state.seconds.load(Ordering::Acquire));
            self.state
                .seconds
                .store((seconds + delta.as_secs_f64()).to_bits(), Ordering::Release);
            self.state.frame.fetch_add(1, Ordering::AcqRel);
            std::mem::take(&mut *wakers)
        };
        wakers.into_iter().for_each(Waker::wake);
    }

    /// The current tick number.
    pub fn frame(&self) -> u64 {
        self.state.frame.load(Ordering::Acquire)
    }
}

impl Ticker for FrameTicker {
    fn now(&self) -> f64 {
        f64::from_bits(self.state.seconds.load(Ordering::Acquire))
    }

    fn next_tick(&self) -> BoxedFuture<'static, ()> {
        Box::pin(NextTick {
            state: self.state.clone(),
            frame: self.frame(),
        })
    }
}

/// Future returned by [`FrameTicker::next_tick`].
struct NextTick {
    /// The clock being waited on.
    state: Arc<FrameState>,
    /// The tick this future was created on.
    frame: u64,
}

impl Future for NextTick {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let mut wakers = self
            .state
            .wakers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.state.frame.load(Ordering::Acquire) > self.frame {
            return Poll::Ready(());
        }
        if !wakers.iter().any(|w| w.will_wake(cx.waker())) {
            wakers.push(cx.waker().clone());
        }
        Poll::Pending
    }
}

/// Waits on `ticker` until `duration` has elapsed.
///
/// Returns [`HandlerError::Cancelled`] as soon as `cancel` is observed.
pub async fn wait_for(
    ticker: &dyn Ticker,
    duration: Duration,
    cancel: &CancellationToken,
) -> Result<(), HandlerError> {
    let start = ticker.now();
    let seconds = duration.as_secs_f64();
    while ticker.now() - start < seconds {
        if cancel.is_cancelled() {
            return Err(HandlerError::Cancelled);
        }
        ticker.next_tick().await;
    }
    Ok(())
}
