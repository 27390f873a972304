//! Static files written for hosting the bulletin

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const OUTPUT_DIR: &str = "output";
pub const REPORT_HTML: &str = "weather-report.html";
pub const ALERT_PNG: &str = "weather-alert.png";
pub const INDEX_HTML: &str = "index.html";

/// Writes the run's artifacts into one directory. Each run overwrites the last.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    dir: PathBuf,
}

impl OutputWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn report_path(&self) -> PathBuf {
        self.dir.join(REPORT_HTML)
    }

    pub fn png_path(&self) -> PathBuf {
        self.dir.join(ALERT_PNG)
    }

    pub fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_HTML)
    }

    /// Create the output directory (and parents) if missing
    pub fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create output directory: {}", self.dir.display()))
    }

    /// Standalone document with the fragment, for debugging the model output
    pub fn write_report_html(&self, fragment: &str) -> Result<PathBuf> {
        let path = self.report_path();
        write_file(&path, report_document(fragment).as_bytes())?;
        Ok(path)
    }

    pub fn write_png(&self, png: &[u8]) -> Result<PathBuf> {
        let path = self.png_path();
        write_file(&path, png)?;
        Ok(path)
    }

    /// Redirect page so the site root serves the image
    pub fn write_index(&self) -> Result<PathBuf> {
        let path = self.index_path();
        write_file(&path, redirect_document().as_bytes())?;
        Ok(path)
    }

    /// Remove this job's artifacts, and the directory if nothing else is left
    pub fn clean(&self) -> Result<Vec<PathBuf>> {
        let mut removed = Vec::new();
        for path in [self.report_path(), self.png_path(), self.index_path()] {
            if path.exists() {
                fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
                removed.push(path);
            }
        }

        if self.dir.is_dir() && fs::read_dir(&self.dir)?.next().is_none() {
            fs::remove_dir(&self.dir)?;
        }
        Ok(removed)
    }
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

fn report_document(fragment: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Weather Alert</title>
</head>
<body style="margin:0; padding:0;">
{}
</body>
</html>
"#,
        fragment
    )
}

fn redirect_document() -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <title>Weather Alert</title>
  <meta http-equiv="refresh" content="0; url={png}">
</head>
<body>
  <p>Redirecting to weather alert image...</p>
  <img src="{png}" alt="Weather Alert" style="max-width: 100%;">
</body>
</html>
"#,
        png = ALERT_PNG
    )
}
