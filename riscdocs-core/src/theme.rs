//! Layout state: colour theme and sidebar expansion.
//!
//! Both are single boolean flags. The site renders their initial value into
//! the HTML; the bundled `app.js` flips the same classes in the browser.

use serde::{Deserialize, Serialize};

/// Class added to the root element when the dark theme is active
pub const DARK_THEME_CLASS: &str = "app-theme-dark";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Class for the root element ("" for light)
    pub fn root_class(&self) -> &'static str {
        match self {
            Theme::Light => "",
            Theme::Dark => DARK_THEME_CLASS,
        }
    }

    /// Accessible label for the toggle button
    pub fn toggle_label(&self) -> String {
        format!("Switch to {} theme", self.toggled().as_str())
    }
}

/// Theme flag owned by the layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThemeState {
    theme: Theme,
}

impl ThemeState {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn is_dark(&self) -> bool {
        self.theme == Theme::Dark
    }

    pub fn toggle(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }
}

/// Sidebar expansion flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SidebarState {
    expanded: bool,
}

impl Default for SidebarState {
    fn default() -> Self {
        Self { expanded: true }
    }
}

impl SidebarState {
    pub fn new(expanded: bool) -> Self {
        Self { expanded }
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn toggle(&mut self) -> bool {
        self.expanded = !self.expanded;
        self.expanded
    }

    pub fn class(&self) -> &'static str {
        if self.expanded {
            "app-sidebar--expanded"
        } else {
            "app-sidebar--collapsed"
        }
    }

    pub fn toggle_label(&self) -> &'static str {
        if self.expanded {
            "Collapse sidebar"
        } else {
            "Expand sidebar"
        }
    }

    /// Tooltip for a section link: the description while expanded, the title otherwise
    pub fn link_title<'a>(&self, title: &'a str, description: Option<&'a str>) -> &'a str {
        if self.expanded {
            description.unwrap_or(title)
        } else {
            title
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_alternates() {
        let mut state = ThemeState::default();
        assert!(!state.is_dark());
        assert_eq!(state.toggle(), Theme::Dark);
        assert!(state.is_dark());
        assert_eq!(state.toggle(), Theme::Light);
    }

    #[test]
    fn double_toggle_is_identity() {
        for start in [Theme::Light, Theme::Dark] {
            let mut state = ThemeState::new(start);
            state.toggle();
            state.toggle();
            assert_eq!(state.theme(), start);
        }
    }

    #[test]
    fn theme_classes_and_labels() {
        assert_eq!(Theme::Light.root_class(), "");
        assert_eq!(Theme::Dark.root_class(), DARK_THEME_CLASS);
        assert_eq!(Theme::Light.toggle_label(), "Switch to dark theme");
        assert_eq!(Theme::Dark.toggle_label(), "Switch to light theme");
    }

    #[test]
    fn theme_deserializes_lowercase() {
        let theme: Theme = serde_yaml::from_str("dark").unwrap();
        assert_eq!(theme, Theme::Dark);
    }

    #[test]
    fn sidebar_toggle_and_tooltips() {
        let mut sidebar = SidebarState::default();
        assert!(sidebar.is_expanded());
        assert_eq!(sidebar.class(), "app-sidebar--expanded");
        assert_eq!(sidebar.link_title("CPU", Some("The core")), "The core");
        assert_eq!(sidebar.link_title("CPU", None), "CPU");

        assert!(!sidebar.toggle());
        assert_eq!(sidebar.class(), "app-sidebar--collapsed");
        assert_eq!(sidebar.toggle_label(), "Expand sidebar");
        assert_eq!(sidebar.link_title("CPU", Some("The core")), "CPU");

        assert!(sidebar.toggle());
    }
}
