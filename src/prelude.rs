//! Prelude for the `bevy_typewriter` crate.
pub use super::{TypewriterPlugin, TypewriterSet};
pub use super::{
    errors::*,
    events::{line_events::*, requests::*},
    handler::*,
    handlers::{emotion::*, movement::*, pause::*},
    loader::*,
    markup::*,
    presenter::*,
    settings::*,
    surface::*,
    systems::{LineDeliverer, LineDelivererBundle},
    ticker::*,
    typewriter::*,
};
