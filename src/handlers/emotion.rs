//! Changes a character's facial expression at `[emotion/]` markers.
use std::collections::HashMap;

use bevy::{log::warn, utils::BoxedFuture};
use tokio_util::sync::CancellationToken;

use crate::{
    errors::HandlerError, handler::ActionMarkupHandler, markup::MarkupParseResult,
    surface::LineSurface,
};

/// Something that can show an emotion, like a character's face.
pub trait ExpressionTarget: Send + Sync {
    /// Switches to the expression named `emotion`.
    fn set_facial_expression(&mut self, emotion: &str);
}

/// Sets the expression of the speaking character as the line reaches each
/// `emotion` attribute.
///
/// The speaker is read from the `name` property of the line's `character`
/// attribute and looked up among the registered characters.
#[derive(Default)]
pub struct EmotionHandler {
    /// Characters that can emote, by name.
    characters: HashMap<String, Box<dyn ExpressionTarget>>,
    /// The character speaking the current line.
    speaker: Option<String>,
    /// Emotions by character index, for the current line.
    emotions: HashMap<usize, String>,
}

impl EmotionHandler {
    /// Makes `target` the character called `name`.
    pub fn with_character(mut self, name: &str, target: impl ExpressionTarget + 'static) -> Self {
        self.characters.insert(name.to_string(), Box::new(target));
        self
    }

    /// The character speaking the current line, if it could be found.
    pub fn speaker(&self) -> Option<&str> {
        self.speaker.as_deref()
    }
}

impl ActionMarkupHandler for EmotionHandler {
    fn on_prepare_for_line(&mut self, line: &MarkupParseResult, _surface: &dyn LineSurface) {
        self.speaker = None;
        self.emotions.clear();

        let Some(character) = line.attribute_with_name("character") else {
            warn!("line has no character");
            return;
        };
        let Some(name) = character.string_property("name") else {
            warn!("character has no name");
            return;
        };
        if !self.characters.contains_key(name) {
            warn!("scene has no one called {}", name);
            return;
        }

        self.speaker = Some(name.to_string());
        self.emotions = line
            .attributes_named("emotion")
            .filter_map(|attr| {
                attr.string_property("emotion")
                    .map(|emotion| (attr.position, emotion.to_string()))
            })
            .collect();
    }

    fn on_character_will_appear<'a>(
        &'a mut self,
        character_index: usize,
        _line: &'a MarkupParseResult,
        _cancel: &'a CancellationToken,
    ) -> BoxedFuture<'a, Result<(), HandlerError>> {
        let target = self
            .speaker
            .as_ref()
            .and_then(|name| self.characters.get_mut(name));
        if let (Some(target), Some(emotion)) = (target, self.emotions.get(&character_index)) {
            target.set_facial_expression(emotion);
        }
        Box::pin(async { Ok(()) })
    }
}
