//! Navigation tree loaded from `navigation.json`.

use crate::routes::normalize_route_path;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NavigationError {
    #[error("Failed to read navigation file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse navigation JSON: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// A single guide section in the sidebar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Section {
    /// Icon key, falling back to `file` when none is configured
    pub fn icon_key(&self) -> &str {
        self.icon.as_deref().unwrap_or("file")
    }

    pub fn matches(&self, current_path: &str) -> bool {
        normalize_route_path(&self.path) == normalize_route_path(current_path)
    }
}

/// One guide (user or developer) with its sections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavGroup {
    pub title: String,
    pub path: String,

    #[serde(default)]
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationConfig {
    #[serde(default = "default_user_guide")]
    pub user_guide: NavGroup,

    #[serde(default = "default_dev_guide")]
    pub dev_guide: NavGroup,
}

fn default_user_guide() -> NavGroup {
    NavGroup {
        title: "User Guide".into(),
        path: "/user-guide/root".into(),
        sections: Vec::new(),
    }
}

fn default_dev_guide() -> NavGroup {
    NavGroup {
        title: "Developer Guide".into(),
        path: "/dev-guide/root".into(),
        sections: Vec::new(),
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            user_guide: default_user_guide(),
            dev_guide: default_dev_guide(),
        }
    }
}

impl NavigationConfig {
    pub fn from_json(contents: &str) -> Result<Self, NavigationError> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, NavigationError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Load the tree, or an empty one when the file does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, NavigationError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!("Navigation file {:?} not found; sidebar will be empty", path);
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    /// Groups in sidebar order
    pub fn groups(&self) -> [&NavGroup; 2] {
        [&self.user_guide, &self.dev_guide]
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.groups().into_iter().flat_map(|g| g.sections.iter())
    }

    /// The section shown as active for `current_path`, if any
    pub fn active_section(&self, current_path: &str) -> Option<&Section> {
        self.sections().find(|s| s.matches(current_path))
    }
}
