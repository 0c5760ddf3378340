//! Worker lifecycle: uninstalled, installed, active.
//!
//! There is no waiting phase between install and activation, and activation
//! takes control of already-open clients immediately.

use serde::{Deserialize, Serialize};
use std::fmt;
use warden_core::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    #[default]
    Uninstalled,
    Installed,
    Active,
}

impl Lifecycle {
    /// State after a completed install.
    ///
    /// Reinstalling an active worker refreshes its store and keeps it active.
    pub fn installed(self) -> Lifecycle {
        match self {
            Lifecycle::Active => Lifecycle::Active,
            Lifecycle::Uninstalled | Lifecycle::Installed => Lifecycle::Installed,
        }
    }

    /// State after activation, or an error if nothing was installed.
    pub fn activated(self) -> Result<Lifecycle, Error> {
        match self {
            Lifecycle::Installed | Lifecycle::Active => Ok(Lifecycle::Active),
            Lifecycle::Uninstalled => Err(Error::InvalidState("cannot activate before install".into())),
        }
    }

    /// Whether fetches are intercepted in this state.
    pub fn controls_clients(self) -> bool {
        self == Lifecycle::Active
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifecycle::Uninstalled => write!(f, "uninstalled"),
            Lifecycle::Installed => write!(f, "installed"),
            Lifecycle::Active => write!(f, "active"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_then_activate() {
        let state = Lifecycle::default().installed();
        assert_eq!(state, Lifecycle::Installed);
        assert!(!state.controls_clients());

        let state = state.activated().unwrap();
        assert_eq!(state, Lifecycle::Active);
        assert!(state.controls_clients());
    }

    #[test]
    fn test_activate_uninstalled_fails() {
        let result = Lifecycle::Uninstalled.activated();
        assert!(matches!(result, Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_reinstall_keeps_active() {
        assert_eq!(Lifecycle::Active.installed(), Lifecycle::Active);
        assert_eq!(Lifecycle::Active.activated().unwrap(), Lifecycle::Active);
    }

    #[test]
    fn test_display() {
        assert_eq!(Lifecycle::Installed.to_string(), "installed");
    }
}
