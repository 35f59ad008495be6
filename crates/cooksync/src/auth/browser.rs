//! Opening pages in the user's browser

use anyhow::{Context, Result};

/// Opens URLs for the user
pub trait Browser: Send + Sync {
    fn open(&self, url: &str) -> Result<()>;
}

/// Uses the platform's default browser
pub struct SystemBrowser;

impl Browser for SystemBrowser {
    fn open(&self, url: &str) -> Result<()> {
        open::that(url).with_context(|| format!("Failed to open browser for {}", url))
    }
}

impl<B: Browser + ?Sized> Browser for std::sync::Arc<B> {
    fn open(&self, url: &str) -> Result<()> {
        (**self).open(url)
    }
}
