//! Events to drive line deliveries and to follow their progress.
use bevy::prelude::*;

use self::{line_events::*, requests::*};

pub mod line_events;
pub mod requests;

/// All the built-in events for `bevy_typewriter`.
pub(crate) struct TypewriterEventsPlugin;

impl Plugin for TypewriterEventsPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<DeliverLineRequest>()
            .add_event::<HurryUpRequest>()
            .add_event::<NextContentRequest>()
            .add_event::<LineDeliveredEvent>()
            .add_event::<LineDismissedEvent>();
    }
}
