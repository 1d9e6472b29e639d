//! Blocking user dialogs used by save and load.

use std::path::PathBuf;

/// The three interactions the installation needs from a desktop.
pub trait Dialogs {
    /// Ask for a name to save under. `None` when cancelled.
    fn prompt_name(&mut self, title: &str, default: &str) -> Option<String>;

    /// Pick an existing file. `None` when cancelled.
    fn pick_file(&mut self, title: &str) -> Option<PathBuf>;

    fn alert(&mut self, message: &str);
}

/// Native dialogs through `rfd`.
///
/// `rfd` has no plain text prompt, so the name comes from a save dialog: the
/// chosen file stem is the name and the rest of the path is ignored.
#[cfg(feature = "window")]
#[derive(Debug, Default)]
pub struct NativeDialogs;

#[cfg(feature = "window")]
impl Dialogs for NativeDialogs {
    fn prompt_name(&mut self, title: &str, default: &str) -> Option<String> {
        let path = rfd::FileDialog::new()
            .set_title(title)
            .set_file_name(default)
            .save_file()?;
        path.file_stem().map(|s| s.to_string_lossy().into_owned())
    }

    fn pick_file(&mut self, title: &str) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title(title)
            .add_filter("Recording", &["csv"])
            .pick_file()
    }

    fn alert(&mut self, message: &str) {
        rfd::MessageDialog::new()
            .set_title("scorereel")
            .set_description(message)
            .set_level(rfd::MessageLevel::Info)
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }
}

/// Dialogs answered from a script, for headless runs and tests.
#[derive(Debug, Default)]
pub struct ScriptedDialogs {
    pub names: Vec<Option<String>>,
    pub files: Vec<Option<PathBuf>>,
    pub alerts: Vec<String>,
}

impl ScriptedDialogs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.names.push(Some(name.into()));
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(Some(path.into()));
        self
    }
}

impl Dialogs for ScriptedDialogs {
    fn prompt_name(&mut self, _title: &str, _default: &str) -> Option<String> {
        if self.names.is_empty() {
            return None;
        }
        self.names.remove(0)
    }

    fn pick_file(&mut self, _title: &str) -> Option<PathBuf> {
        if self.files.is_empty() {
            return None;
        }
        self.files.remove(0)
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }
}
