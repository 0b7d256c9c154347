//! An optional process-wide default notifier.
//!
//! Nothing in the crate reaches for this instance on its own. An application
//! that wants one installs it once at startup and fetches it explicitly.

use crate::{Error, Notifier, Result};
use std::sync::OnceLock;
use tracing::info;

static DEFAULT: OnceLock<Notifier> = OnceLock::new();

/// Install the process-wide default notifier.
///
/// Fails with [`Error::DefaultAlreadySet`] if one is already installed; the
/// installed notifier is left untouched.
pub fn install(notifier: Notifier) -> Result<&'static Notifier> {
    let mut installed = false;
    let current = DEFAULT.get_or_init(|| {
        installed = true;
        notifier
    });

    if installed {
        info!(
            registry = current.fanout().id(),
            "Default notifier installed"
        );
        Ok(current)
    } else {
        Err(Error::DefaultAlreadySet)
    }
}

/// The installed default notifier, if any
pub fn get() -> Option<&'static Notifier> {
    DEFAULT.get()
}
