//! Typewriter settings, usually loaded from `.typewriter.ron` assets.
use std::time::Duration;

use bevy::{prelude::*, reflect::TypePath};
use serde::Deserialize;

use crate::typewriter::Pacing;

/// How lines are presented.
///
/// ```ron
/// (
///     pacing: Word(words_per_second: 4.0),
///     auto_advance: Some(1.5),
/// )
/// ```
#[derive(Asset, Debug, Clone, PartialEq, Deserialize, TypePath)]
pub struct TypewriterSettings {
    /// How the reveal is paced.
    #[serde(default)]
    pub pacing: Pacing,
    /// Whether lines are revealed over time. When off, lines appear at once and no
    /// markup handler is called for their characters.
    #[serde(default = "default_use_typewriter")]
    pub use_typewriter: bool,
    /// Seconds a fully delivered line stays up before moving on by itself.
    /// `None` waits for an explicit request to move on.
    #[serde(default)]
    pub auto_advance: Option<f32>,
}

/// Serde default for [`TypewriterSettings::use_typewriter`].
fn default_use_typewriter() -> bool {
    true
}

impl Default for TypewriterSettings {
    fn default() -> Self {
        Self {
            pacing: Pacing::default(),
            use_typewriter: default_use_typewriter(),
            auto_advance: None,
        }
    }
}

impl TypewriterSettings {
    /// Parses settings from RON.
    pub fn from_ron(ron: &str) -> Result<Self, serde_ron::error::SpannedError> {
        serde_ron::from_str(ron)
    }

    /// The auto advance delay, ignoring negative or non finite values.
    pub fn auto_advance_delay(&self) -> Option<Duration> {
        self.auto_advance
            .and_then(|secs| Duration::try_from_secs_f32(secs).ok())
    }
}
