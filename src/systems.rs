//! The systems that run line deliveries inside a Bevy app.
//!
//! Deliveries are futures owned by a [`LineDeliverer`] and polled once per frame,
//! right after the [`FrameTicker`] moves forward.
use std::task::{Context, Poll};

use bevy::{
    prelude::*,
    utils::{synccell::SyncCell, BoxedFuture},
};
use futures_util::{task::noop_waker_ref, FutureExt};

use crate::{
    events::{
        line_events::{LineDeliveredEvent, LineDismissedEvent},
        requests::{DeliverLineRequest, HurryUpRequest, NextContentRequest},
    },
    markup::MarkupParseResult,
    presenter::{LineCancellation, LinePresenter},
    surface::TextSurface,
    ticker::FrameTicker,
    typewriter::DeliveryOutcome,
};

/// A bundle that contains the components needed to make an entity deliver lines.
#[derive(Bundle)]
pub struct LineDelivererBundle {
    /// The deliverer running the lines.
    pub deliverer: LineDeliverer,
    /// The text the lines are revealed on, for the game to render.
    pub surface: TextSurface,
}

impl LineDelivererBundle {
    /// Creates a bundle delivering lines with `presenter` on `surface`.
    ///
    /// The presenter should have been given a clone of `surface`.
    pub fn new(presenter: LinePresenter, surface: TextSurface) -> Self {
        Self {
            deliverer: LineDeliverer::new(presenter),
            surface,
        }
    }
}

/// Delivers lines one at a time with a [`LinePresenter`].
#[derive(Component)]
pub struct LineDeliverer {
    /// The presenter, while no line is up.
    presenter: Option<LinePresenter>,
    /// The line currently up, if any.
    active: Option<ActiveLine>,
}

impl LineDeliverer {
    /// Creates an idle deliverer.
    pub fn new(presenter: LinePresenter) -> Self {
        Self {
            presenter: Some(presenter),
            active: None,
        }
    }

    /// Whether a line is up, either being delivered or held.
    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    /// Whether a line is up and fully delivered.
    pub fn is_holding(&self) -> bool {
        matches!(
            self.active,
            Some(ActiveLine {
                step: Step::Holding(_),
                ..
            })
        )
    }

    /// The presenter, while no line is up.
    pub fn presenter_mut(&mut self) -> Option<&mut LinePresenter> {
        self.presenter.as_mut()
    }

    /// Starts delivering `line`. Returns `false` if a line is already up.
    fn start(&mut self, line: MarkupParseResult) -> bool {
        let Some(presenter) = self.presenter.take() else {
            return false;
        };
        let cancellation = LineCancellation::new();
        self.active = Some(ActiveLine {
            step: Step::Delivering(SyncCell::new(deliver(
                presenter,
                line,
                cancellation.clone(),
            ))),
            cancellation,
        });
        true
    }

    /// Polls the line currently up, moving it along as far as it can go this frame.
    fn poll(&mut self, cx: &mut Context<'_>) -> Progress {
        let mut progress = Progress::default();
        loop {
            let Some(active) = self.active.as_mut() else {
                return progress;
            };
            match &mut active.step {
                Step::Delivering(delivery) => match delivery.get().poll_unpin(cx) {
                    Poll::Ready((presenter, outcome)) => {
                        progress.delivered = Some(outcome);
                        active.step = Step::Holding(SyncCell::new(hold(
                            presenter,
                            active.cancellation.clone(),
                        )));
                    }
                    Poll::Pending => return progress,
                },
                Step::Holding(holding) => match holding.get().poll_unpin(cx) {
                    Poll::Ready(presenter) => {
                        progress.dismissed = true;
                        self.presenter = Some(presenter);
                        self.active = None;
                    }
                    Poll::Pending => return progress,
                },
            }
        }
    }
}

/// A line being presented.
struct ActiveLine {
    /// The tokens requests are forwarded to.
    cancellation: LineCancellation,
    /// What the line is waiting for.
    step: Step,
}

/// The two steps of presenting a line. Each owns the presenter until it is done.
enum Step {
    /// Revealing the line.
    Delivering(SyncCell<BoxedFuture<'static, (LinePresenter, DeliveryOutcome)>>),
    /// Waiting for the line to be dismissed.
    Holding(SyncCell<BoxedFuture<'static, LinePresenter>>),
}

/// What happened to a line during one poll.
#[derive(Default)]
struct Progress {
    /// Set when the line finished its delivery.
    delivered: Option<DeliveryOutcome>,
    /// Set when the line was dismissed.
    dismissed: bool,
}

/// Delivers `line`, handing the presenter back with the outcome.
fn deliver(
    mut presenter: LinePresenter,
    line: MarkupParseResult,
    cancellation: LineCancellation,
) -> BoxedFuture<'static, (LinePresenter, DeliveryOutcome)> {
    Box::pin(async move {
        let outcome = presenter.deliver(&line, &cancellation).await;
        (presenter, outcome)
    })
}

/// Holds the delivered line, then dismisses it and hands the presenter back.
fn hold(
    mut presenter: LinePresenter,
    cancellation: LineCancellation,
) -> BoxedFuture<'static, LinePresenter> {
    Box::pin(async move {
        presenter.hold(&cancellation).await;
        presenter.dismiss();
        presenter
    })
}

/// Moves the [`FrameTicker`] forward by the frame's delta time.
pub(crate) fn advance_frame_ticker(time: Res<Time>, ticker: Res<FrameTicker>) {
    ticker.advance(time.delta());
}

/// Handles the [`DeliverLineRequest`] events.
pub(crate) fn start_line_deliveries(
    mut requests: EventReader<DeliverLineRequest>,
    mut deliverers: Query<&mut LineDeliverer>,
) {
    for req in requests.read() {
        let Ok(mut deliverer) = deliverers.get_mut(req.deliverer) else {
            error!(
                "Deliver line request sent to {:?}, which has no LineDeliverer",
                req.deliverer
            );
            continue;
        };
        if deliverer.start(req.line.clone()) {
            info!("Delivering line \"{}\"", req.line.text);
        } else {
            warn!(
                "Can't deliver line \"{}\" while another line is up",
                req.line.text
            );
        }
    }
}

/// Forwards the [`HurryUpRequest`] and [`NextContentRequest`] events to the lines up.
pub(crate) fn forward_line_requests(
    mut hurry_ups: EventReader<HurryUpRequest>,
    mut next_contents: EventReader<NextContentRequest>,
    deliverers: Query<&LineDeliverer>,
) {
    for req in hurry_ups.read() {
        match deliverers.get(req.deliverer).map(|d| d.active.as_ref()) {
            Ok(Some(active)) => active.cancellation.hurry_up(),
            Ok(None) => debug!("Hurry up request with no line up, ignoring"),
            Err(_) => error!(
                "Hurry up request sent to {:?}, which has no LineDeliverer",
                req.deliverer
            ),
        }
    }
    for req in next_contents.read() {
        match deliverers.get(req.deliverer).map(|d| d.active.as_ref()) {
            Ok(Some(active)) => active.cancellation.request_next_content(),
            Ok(None) => debug!("Next content request with no line up, ignoring"),
            Err(_) => error!(
                "Next content request sent to {:?}, which has no LineDeliverer",
                req.deliverer
            ),
        }
    }
}

/// Polls every line up, sending the events for lines delivered or dismissed.
pub(crate) fn poll_line_deliveries(
    mut deliverers: Query<(Entity, &mut LineDeliverer)>,
    mut delivered: EventWriter<LineDeliveredEvent>,
    mut dismissed: EventWriter<LineDismissedEvent>,
) {
    let mut cx = Context::from_waker(noop_waker_ref());
    for (deliverer, mut line_deliverer) in &mut deliverers {
        if !line_deliverer.is_busy() {
            continue;
        }
        let progress = line_deliverer.poll(&mut cx);
        if let Some(outcome) = progress.delivered {
            debug!("Line delivered on {:?}: {:?}", deliverer, outcome);
            delivered.send(LineDeliveredEvent { deliverer, outcome });
        }
        if progress.dismissed {
            dismissed.send(LineDismissedEvent(deliverer));
        }
    }
}
