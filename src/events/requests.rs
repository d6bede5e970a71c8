//! Events the plugin can receive.

use bevy::prelude::*;

use crate::markup::MarkupParseResult;

/// Event to start delivering a line. It requires an entity with a `LineDeliverer`.
///
/// The request is ignored (and a warning logged) if the deliverer is still busy
/// with another line.
#[derive(Event)]
pub struct DeliverLineRequest {
    /// The entity with the `LineDeliverer` that shows the line.
    pub deliverer: Entity,
    /// The line to deliver.
    pub line: MarkupParseResult,
}

impl DeliverLineRequest {
    /// Creates a new `DeliverLineRequest`.
    pub fn new(deliverer: Entity, line: MarkupParseResult) -> Self {
        Self { deliverer, line }
    }
}

/// Event to fast-forward the line being delivered, typically wired to a key press.
///
/// The line stays up once fully shown. Does nothing if no line is being delivered.
#[derive(Event)]
pub struct HurryUpRequest {
    /// The entity with the `LineDeliverer` delivering the line.
    pub deliverer: Entity,
}

impl HurryUpRequest {
    /// Creates a new `HurryUpRequest`.
    pub fn new(deliverer: Entity) -> Self {
        Self { deliverer }
    }
}

/// Event to move on from the current line.
///
/// A line still being delivered is fast-forwarded first, then dismissed.
#[derive(Event)]
pub struct NextContentRequest {
    /// The entity with the `LineDeliverer` showing the line.
    pub deliverer: Entity,
}

impl NextContentRequest {
    /// Creates a new `NextContentRequest`.
    pub fn new(deliverer: Entity) -> Self {
        Self { deliverer }
    }
}
