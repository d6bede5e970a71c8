//! Asset loader for [`TypewriterSettings`] from "typewriter.ron" files.

use bevy::{
    asset::{io::Reader, AssetLoader, AsyncReadExt, LoadContext},
    utils::BoxedFuture,
};
use serde_ron::de::from_bytes;

use crate::{errors::SettingsLoaderError, settings::TypewriterSettings};

/// Loads [`TypewriterSettings`] from RON assets.
#[derive(Default)]
pub struct TypewriterSettingsLoader;

impl AssetLoader for TypewriterSettingsLoader {
    type Asset = TypewriterSettings;
    type Settings = ();
    type Error = SettingsLoaderError;

    fn load<'a>(
        &'a self,
        reader: &'a mut Reader,
        _settings: &'a Self::Settings,
        _load_context: &'a mut LoadContext,
    ) -> BoxedFuture<'a, Result<Self::Asset, Self::Error>> {
        Box::pin(async move {
            let mut bytes = Vec::new();
            reader.read_to_end(&mut bytes).await?;
            let settings = from_bytes::<TypewriterSettings>(&bytes)?;
            Ok(settings)
        })
    }

    fn extensions(&self) -> &[&str] {
        &["typewriter.ron"]
    }
}
