//! Scenario fixtures for the stretch IK solver, listed in `fixtures/manifest.json`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    scenarios: BTreeMap<String, String>,
}

/// Solver scenarios: an input snapshot plus the expected output pair.
pub mod scenarios {
    use super::*;

    fn fixture_file(name: &str) -> Result<PathBuf> {
        let rel = MANIFEST
            .scenarios
            .get(name)
            .with_context(|| format!("no scenario named '{name}' in the manifest"))?;
        Ok(Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures")
            .join(rel))
    }

    /// Scenario names in sorted order.
    pub fn keys() -> Vec<String> {
        MANIFEST.scenarios.keys().cloned().collect()
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        fixture_file(name)
    }

    pub fn json(name: &str) -> Result<String> {
        let file = fixture_file(name)?;
        fs::read_to_string(&file)
            .with_context(|| format!("reading scenario '{name}' from {}", file.display()))
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let text = json(name)?;
        serde_json::from_str(&text).with_context(|| format!("scenario '{name}' is not valid"))
    }
}
