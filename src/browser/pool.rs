use crate::browser::{Browser, BrowserError, BrowserLauncher, Page};

/// A browser session plus a fixed set of pages, one per concurrency slot
///
/// The pool is owned by one run. Pages are bound to slots by index and never
/// shared between two tasks. [`close`](Self::close) must be called on every
/// exit path.
pub struct PagePool {
    browser: Box<dyn Browser>,
    pages: Vec<Box<dyn Page>>,
}

impl PagePool {
    /// Launches a browser and opens `size` pages (at least one)
    ///
    /// If a page cannot be opened, the pages opened so far and the browser are
    /// released before the error is returned.
    pub async fn open(launcher: &dyn BrowserLauncher, size: usize) -> Result<Self, BrowserError> {
        let size = size.max(1);
        let browser = launcher.launch().await?;
        let mut pool = Self {
            browser,
            pages: Vec::with_capacity(size),
        };

        for _ in 0..size {
            match pool.browser.new_page().await {
                Ok(page) => pool.pages.push(page),
                Err(e) => {
                    pool.close().await;
                    return Err(e);
                }
            }
        }

        tracing::debug!("Opened page pool with {} page(s)", size);
        Ok(pool)
    }

    /// Number of pages (slots) in the pool
    pub fn size(&self) -> usize {
        self.pages.len()
    }

    /// Pages by slot index
    pub fn pages_mut(&mut self) -> &mut [Box<dyn Page>] {
        &mut self.pages
    }

    /// Closes every page and then the browser; failures are logged, not returned
    pub async fn close(mut self) {
        for (slot, page) in self.pages.iter_mut().enumerate() {
            if let Err(e) = page.close().await {
                tracing::warn!("Failed to close page in slot {}: {}", slot, e);
            }
        }

        if let Err(e) = self.browser.close().await {
            tracing::warn!("Failed to close browser: {}", e);
        }

        tracing::debug!("Page pool closed");
    }
}
