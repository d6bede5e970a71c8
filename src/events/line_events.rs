//! Events the plugin emits.
use bevy::prelude::*;

use crate::typewriter::DeliveryOutcome;

/// Sent when a line is fully shown.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct LineDeliveredEvent {
    /// The entity with the `LineDeliverer` that showed the line.
    pub deliverer: Entity,
    /// How the delivery ended.
    pub outcome: DeliveryOutcome,
}

/// Sent when a line went away and the deliverer is ready for the next one.
/// Contains the deliverer entity.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct LineDismissedEvent(pub Entity);
