//! Navigable directory tree: view state, movement rules, incremental
//! search, and the commands bound to them.

pub mod command;
pub mod search;
pub mod view;

use std::cell::Cell;
use std::rc::Rc;
use std::str::FromStr;

pub use view::TreeView;

/// Adjacency rule used by movement and row layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavigationMode {
    /// Every record is adjacent to its neighbours in the sequence.
    #[default]
    Flat,
    /// Movement stays among siblings; layout shows only the selection's
    /// ancestors, siblings and children.
    Hierarchical,
}

impl NavigationMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Flat => Self::Hierarchical,
            Self::Hierarchical => Self::Flat,
        }
    }

    /// Label shown on the F4 button: the mode the key switches to.
    pub fn toggle_label(self) -> &'static str {
        match self {
            Self::Flat => "Dynamc",
            Self::Hierarchical => "Static",
        }
    }
}

impl FromStr for NavigationMode {
    type Err = String;

    /// Accepts `flat`/`static` and `hierarchical`/`dynamic`, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" | "static" => Ok(Self::Flat),
            "hierarchical" | "dynamic" => Ok(Self::Hierarchical),
            other => Err(format!("unknown navigation mode \"{}\"", other)),
        }
    }
}

/// Navigation mode shared by every open view.
pub type SharedNavigation = Rc<Cell<NavigationMode>>;

pub fn shared_navigation(mode: NavigationMode) -> SharedNavigation {
    Rc::new(Cell::new(mode))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_navigation_mode() {
        assert_eq!("hierarchical".parse::<NavigationMode>(), Ok(NavigationMode::Hierarchical));
        assert_eq!(" Dynamic ".parse::<NavigationMode>(), Ok(NavigationMode::Hierarchical));
        assert_eq!("flat".parse::<NavigationMode>(), Ok(NavigationMode::Flat));
        assert_eq!("STATIC".parse::<NavigationMode>(), Ok(NavigationMode::Flat));
        assert!("bogus".parse::<NavigationMode>().is_err());
    }

    #[test]
    fn toggle_round_trips() {
        let mode = NavigationMode::Flat;
        assert_eq!(mode.toggled(), NavigationMode::Hierarchical);
        assert_eq!(mode.toggled().toggled(), mode);
    }

    #[test]
    fn toggle_label_names_other_mode() {
        assert_eq!(NavigationMode::Flat.toggle_label(), "Dynamc");
        assert_eq!(NavigationMode::Hierarchical.toggle_label(), "Static");
    }

    #[test]
    fn shared_mode_is_seen_by_all_holders() {
        let a = shared_navigation(NavigationMode::Flat);
        let b = a.clone();
        a.set(NavigationMode::Hierarchical);
        assert_eq!(b.get(), NavigationMode::Hierarchical);
    }
}
