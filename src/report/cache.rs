use std::sync::Arc;

use crate::foundation::{core::Viewport, error::ReelResult};

/// What a rendered report depends on besides the recorded series, which is
/// frozen while the report is shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ReportKey {
    pub generation: u64,
    pub viewport: Viewport,
}

enum Slot {
    Ready(Arc<vello_cpu::Pixmap>),
    Failed,
}

/// Holds the most recently rendered report surface.
///
/// A lookup with a different key (new Report entry, or resized viewport) is a
/// miss and renders again; hits return the shared surface. A failed render is
/// remembered under its key and yields `None` until the key changes.
#[derive(Default)]
pub struct ReportCache {
    entry: Option<(ReportKey, Slot)>,
    renders: u64,
}

impl ReportCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fresh(&self, key: ReportKey) -> bool {
        matches!(&self.entry, Some((k, _)) if *k == key)
    }

    /// The surface for `key`, rendering it on a miss. Only the first failure
    /// for a key is returned as an error.
    pub fn get_or_render(
        &mut self,
        key: ReportKey,
        render: impl FnOnce() -> ReelResult<vello_cpu::Pixmap>,
    ) -> ReelResult<Option<Arc<vello_cpu::Pixmap>>> {
        if let Some((k, slot)) = &self.entry
            && *k == key
        {
            return Ok(match slot {
                Slot::Ready(surface) => Some(surface.clone()),
                Slot::Failed => None,
            });
        }

        tracing::debug!(
            generation = key.generation,
            width = key.viewport.width,
            height = key.viewport.height,
            "report dirty, generating"
        );
        let surface = match render() {
            Ok(pixmap) => Arc::new(pixmap),
            Err(err) => {
                self.entry = Some((key, Slot::Failed));
                return Err(err);
            }
        };
        self.entry = Some((key, Slot::Ready(surface.clone())));
        self.renders += 1;
        Ok(Some(surface))
    }

    /// Drop the cached surface.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// Number of times a report was actually rendered.
    pub fn renders(&self) -> u64 {
        self.renders
    }
}
