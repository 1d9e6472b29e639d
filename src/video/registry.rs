use std::collections::HashMap;

use crate::{
    foundation::error::ReelResult,
    video::VideoDecoder,
};

/// Turns a video identifier into a ready decoder.
pub trait VideoLoader {
    fn load(&mut self, id: &str) -> ReelResult<Box<dyn VideoDecoder>>;
}

/// Decoders by identifier, loaded on first use.
///
/// A failed load is remembered as `None` and never retried, so callers can
/// look the same identifier up every tick without re-running the loader.
pub struct VideoRegistry {
    loader: Box<dyn VideoLoader>,
    entries: HashMap<String, Option<Box<dyn VideoDecoder>>>,
    current: Option<String>,
}

impl VideoRegistry {
    pub fn new(loader: Box<dyn VideoLoader>) -> Self {
        Self {
            loader,
            entries: HashMap::new(),
            current: None,
        }
    }

    /// Load `id` unless it was attempted before. Returns whether a decoder is available.
    pub fn preload(&mut self, id: &str) -> bool {
        if let Some(entry) = self.entries.get(id) {
            return entry.is_some();
        }

        tracing::info!(id, "loading video");
        let entry = match self.loader.load(id) {
            Ok(decoder) => Some(decoder),
            Err(err) => {
                tracing::error!(id, error = %err, "video failed to load");
                None
            }
        };
        let available = entry.is_some();
        self.entries.insert(id.to_string(), entry);
        available
    }

    /// Make `id` the current video, loading it first if needed.
    ///
    /// The identifier becomes current even when its decoder is missing; video
    /// dependent work is then skipped.
    pub fn select(&mut self, id: &str) -> bool {
        tracing::info!(id, "select video");
        let available = self.preload(id);
        if !available {
            tracing::warn!(id, "selected video is unavailable");
        }
        self.current = Some(id.to_string());
        available
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current(&self) -> Option<&(dyn VideoDecoder + 'static)> {
        let id = self.current.as_deref()?;
        self.entries.get(id)?.as_deref()
    }

    pub fn current_mut(&mut self) -> Option<&mut (dyn VideoDecoder + 'static)> {
        let id = self.current.as_deref()?;
        self.entries.get_mut(id)?.as_deref_mut()
    }

    /// `None` when `id` was never attempted, otherwise whether it loaded.
    pub fn status(&self, id: &str) -> Option<bool> {
        self.entries.get(id).map(Option::is_some)
    }
}
