//! In-memory page address.

use huddle_app::NavigationPort;
use huddle_core::ROOT_PATH;

/// Simulated page address that records every in-place replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimNavigation {
    path: String,
    replacements: Vec<String>,
}

impl Default for SimNavigation {
    fn default() -> Self {
        Self::at(ROOT_PATH)
    }
}

impl SimNavigation {
    /// Page opened at `path`.
    pub fn at(path: &str) -> Self {
        Self { path: path.to_string(), replacements: Vec::new() }
    }

    /// Current path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Every path written, in order.
    pub fn replacements(&self) -> &[String] {
        &self.replacements
    }
}

impl NavigationPort for SimNavigation {
    fn current_path(&self) -> String {
        self.path.clone()
    }

    fn replace_path(&mut self, path: &str) {
        self.path = path.to_string();
        self.replacements.push(self.path.clone());
    }
}
