//! Precache manifest: the application shell stored eagerly on install.

use serde::{Deserialize, Serialize};

/// Default application shell, relative to the app origin.
pub const DEFAULT_PRECACHE: &[&str] = &[
    "./",
    "./index.html",
    "./app.js",
    "./manifest.json",
    "./data/presentation.json",
    "./assets/css/theme.css",
    "./assets/css/app.css",
    "./assets/img/logo_aids_40anos.png",
    "./assets/img/favicon.png",
];

/// Ordered list of resource paths to fetch on install.
///
/// Duplicate paths are dropped, keeping the first occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecacheManifest {
    paths: Vec<String>,
}

impl PrecacheManifest {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for path in paths {
            let path = path.into().trim().to_string();
            if !path.is_empty() && !out.contains(&path) {
                out.push(path);
            }
        }
        Self { paths: out }
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl Default for PrecacheManifest {
    fn default() -> Self {
        Self::new(DEFAULT_PRECACHE.iter().copied())
    }
}
