//! Rasterize the bulletin fragment with a headless browser

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::types::Bounds;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::Arc;

/// Logical page size and pixel density of the screenshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub device_scale_factor: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1400,
            height: 1800,
            device_scale_factor: 1.5,
        }
    }
}

/// Launches browser instances
pub trait BrowserEngine {
    type Page: BrowserPage;

    fn launch(&self, viewport: &Viewport) -> Result<Self::Page>;
}

/// A launched browser with a single page. `close` must be safe to call twice.
pub trait BrowserPage {
    /// Load a full HTML document and wait for the network to go idle
    fn set_content(&mut self, html: &str) -> Result<()>;

    fn screenshot_full_page(&mut self) -> Result<Vec<u8>>;

    fn close(&mut self) -> Result<()>;
}

/// Owns a launched browser and closes it on every exit path
pub struct BrowserGuard<P: BrowserPage> {
    page: Option<P>,
}

impl<P: BrowserPage> BrowserGuard<P> {
    pub fn new(page: P) -> Self {
        Self { page: Some(page) }
    }

    fn page_mut(&mut self) -> Result<&mut P> {
        self.page.as_mut().context("browser already closed")
    }

    pub fn set_content(&mut self, html: &str) -> Result<()> {
        self.page_mut()?.set_content(html)
    }

    pub fn screenshot_full_page(&mut self) -> Result<Vec<u8>> {
        self.page_mut()?.screenshot_full_page()
    }

    /// Close now and report the result
    pub fn close(mut self) -> Result<()> {
        match self.page.take() {
            Some(mut page) => page.close(),
            None => Ok(()),
        }
    }
}

impl<P: BrowserPage> Drop for BrowserGuard<P> {
    fn drop(&mut self) {
        if let Some(mut page) = self.page.take() {
            if let Err(e) = page.close() {
                tracing::warn!("failed to close browser: {:#}", e);
            }
        }
    }
}

/// Minimal document the fragment is rendered in
pub fn render_document(fragment: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="UTF-8">
  <style>
    body {{ margin: 0; padding: 30px; background: white; max-width: 1200px; }}
  </style>
</head>
<body>
{}
</body>
</html>
"#,
        fragment
    )
}

/// Render the fragment to PNG bytes.
///
/// The browser is closed before returning, whether or not loading or the
/// screenshot failed. A screenshot error takes precedence over a close error.
pub fn render_png<E: BrowserEngine>(engine: &E, fragment: &str, viewport: &Viewport) -> Result<Vec<u8>> {
    let document = render_document(fragment);

    let page = engine.launch(viewport).context("Failed to launch browser")?;
    let mut browser = BrowserGuard::new(page);
    tracing::debug!("browser launched");

    let shot = browser
        .set_content(&document)
        .context("Failed to load bulletin into browser")
        .and_then(|_| {
            browser
                .screenshot_full_page()
                .context("Failed to capture screenshot")
        });
    let closed = browser.close().context("Failed to close browser");
    tracing::debug!("browser closed");

    let png = shot?;
    closed?;
    Ok(png)
}

/// Headless Chrome/Chromium via the DevTools protocol
#[derive(Debug, Default)]
pub struct ChromeEngine;

impl BrowserEngine for ChromeEngine {
    type Page = ChromePage;

    fn launch(&self, viewport: &Viewport) -> Result<ChromePage> {
        let scale_arg = format!("--force-device-scale-factor={}", viewport.device_scale_factor);
        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .window_size(Some((viewport.width, viewport.height)))
            .args(vec![
                OsStr::new("--no-sandbox"),
                OsStr::new("--disable-setuid-sandbox"),
                OsStr::new(&scale_arg),
            ])
            .build()
            .map_err(|e| anyhow!("invalid browser launch options: {}", e))?;

        let browser = Browser::new(options)?;
        let tab = browser.new_tab()?;
        Ok(ChromePage {
            browser: Some(browser),
            tab,
            viewport: *viewport,
        })
    }
}

pub struct ChromePage {
    browser: Option<Browser>,
    tab: Arc<Tab>,
    viewport: Viewport,
}

impl ChromePage {
    /// Scroll size of the loaded document in CSS pixels
    fn document_size(&self) -> Result<(f64, f64)> {
        // Arrays come back as object references; a string is returned by value
        let remote = self.tab.evaluate(DOCUMENT_SIZE_SCRIPT, false)?;
        parse_document_size(remote.value.as_ref())
    }
}

const DOCUMENT_SIZE_SCRIPT: &str = "JSON.stringify([document.documentElement.scrollWidth, document.documentElement.scrollHeight])";

/// Parse the `"[width,height]"` string produced by `DOCUMENT_SIZE_SCRIPT`
fn parse_document_size(value: Option<&serde_json::Value>) -> Result<(f64, f64)> {
    let text = value
        .context("document size not returned")?
        .as_str()
        .context("document size is not a string")?;
    let dims: Vec<serde_json::Value> = serde_json::from_str(text)
        .with_context(|| format!("invalid document size: {}", text))?;
    let dimension = |index: usize, name: &str| {
        dims.get(index)
            .and_then(|v| v.as_f64())
            .filter(|v| v.is_finite() && *v > 0.0)
            .with_context(|| format!("document {} missing from {}", name, text))
    };
    Ok((dimension(0, "width")?, dimension(1, "height")?))
}

impl BrowserPage for ChromePage {
    fn set_content(&mut self, html: &str) -> Result<()> {
        let url = format!("data:text/html;base64,{}", BASE64_STANDARD.encode(html));
        self.tab.navigate_to(&url)?;
        self.tab.wait_until_navigated()?;
        Ok(())
    }

    fn screenshot_full_page(&mut self) -> Result<Vec<u8>> {
        let (width, height) = self.document_size()?;
        let width = width.max(self.viewport.width as f64);
        let height = height.max(self.viewport.height as f64);

        // Grow the window so the whole document is inside the viewport
        self.tab.set_bounds(Bounds::Normal {
            left: None,
            top: None,
            width: Some(width),
            height: Some(height),
        })?;

        self.tab
            .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
    }

    fn close(&mut self) -> Result<()> {
        // Dropping the Browser kills the Chrome process
        let Some(browser) = self.browser.take() else {
            return Ok(());
        };
        let closed = self.tab.close(false);
        drop(browser);
        closed.map(|_| ())
    }
}
