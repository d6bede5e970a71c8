//! The text surface a line is revealed on.
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bevy::prelude::Component;

/// A text presentation target the typewriter drives.
///
/// The surface is owned by the UI layer. The typewriter only sets the text and
/// moves the reveal cursor forward.
pub trait LineSurface: Send + Sync {
    /// Replaces the displayed text.
    fn set_text(&mut self, text: &str);

    /// Reveals exactly `count` characters from the start of the current text.
    /// Values past the end of the text reveal everything.
    fn set_visible_characters(&mut self, count: usize);

    /// Number of characters of `text` that are revealed one at a time.
    ///
    /// Anything the surface doesn't render as a glyph (rich text tags and such)
    /// is excluded from this count.
    fn deliverable_character_count(&self, text: &str) -> usize;

    /// Index of the last deliverable character of every word in `text`.
    ///
    /// Words are runs of non-whitespace characters. The default walks every
    /// `char` of `text`, so it only matches [`LineSurface::deliverable_character_count`]
    /// when that counts every `char` too. A surface that leaves characters out of
    /// the count must override both, using the same indices.
    fn word_last_characters(&self, text: &str) -> Vec<usize> {
        let mut lasts = vec![];
        let mut previous_in_word = false;
        let mut count = 0;
        for (i, c) in text.chars().enumerate() {
            let in_word = !c.is_whitespace();
            if previous_in_word && !in_word {
                lasts.push(i - 1);
            }
            previous_in_word = in_word;
            count = i + 1;
        }
        if previous_in_word {
            lasts.push(count - 1);
        }
        lasts
    }
}

/// The state behind a [`TextSurface`].
#[derive(Debug, Default)]
struct TextState {
    /// The full text of the current line.
    text: String,
    /// Number of characters in `text`.
    total: usize,
    /// How many characters are currently revealed.
    visible: usize,
}

/// A plain text [`LineSurface`] that can be shared between the delivering task
/// and the systems that render it.
///
/// Cloning a `TextSurface` yields another handle to the same text, so the game can
/// keep one on its UI entity and hand another to the typewriter.
///
/// ```rust
/// use bevy_typewriter::prelude::*;
///
/// let surface = TextSurface::default();
/// let mut handle = surface.clone();
/// handle.set_text("Hello");
/// handle.set_visible_characters(2);
/// assert_eq!(surface.visible_text(), "He");
/// ```
#[derive(Component, Debug, Clone, Default)]
pub struct TextSurface {
    /// The shared text state.
    state: Arc<Mutex<TextState>>,
}

impl TextSurface {
    /// Locks the shared state.
    fn lock(&self) -> MutexGuard<'_, TextState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The full text of the current line.
    pub fn text(&self) -> String {
        self.lock().text.clone()
    }

    /// How many characters are currently revealed.
    pub fn visible_characters(&self) -> usize {
        self.lock().visible
    }

    /// Whether every character of the current line is revealed.
    pub fn is_fully_visible(&self) -> bool {
        let state = self.lock();
        state.visible == state.total
    }

    /// The revealed part of the current line.
    pub fn visible_text(&self) -> String {
        let state = self.lock();
        state.text.chars().take(state.visible).collect()
    }
}

impl LineSurface for TextSurface {
    fn set_text(&mut self, text: &str) {
        let mut state = self.lock();
        state.text = text.to_string();
        state.total = text.chars().count();
        state.visible = state.visible.min(state.total);
    }

    fn set_visible_characters(&mut self, count: usize) {
        let mut state = self.lock();
        state.visible = count.min(state.total);
    }

    fn deliverable_character_count(&self, text: &str) -> usize {
        text.chars().count()
    }
}
