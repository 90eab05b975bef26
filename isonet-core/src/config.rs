//! Per-request isochrone options.
//!
//! Options are immutable once a batch starts and are passed explicitly into
//! every pipeline run.

use std::{convert::Infallible, fmt, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// Strategy used to turn the traversed edges into an area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DetailLevel {
    /// Union of all buffered edges. Exact boundary, most expensive.
    High,
    /// Concave hull of leaf nodes with a threshold of a quarter of the reach
    /// distance, then buffered.
    Mid,
    /// Concave hull of leaf nodes with a fixed threshold, then buffered.
    #[default]
    Low,
}

impl FromStr for DetailLevel {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = if s.eq_ignore_ascii_case("high") {
            DetailLevel::High
        } else if s.eq_ignore_ascii_case("mid") {
            DetailLevel::Mid
        } else {
            DetailLevel::Low
        };
        Ok(level)
    }
}

impl From<String> for DetailLevel {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(level) => level,
            Err(never) => match never {},
        }
    }
}

impl From<DetailLevel> for String {
    fn from(value: DetailLevel) -> Self {
        value.to_string()
    }
}

impl fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DetailLevel::High => "high",
            DetailLevel::Mid => "mid",
            DetailLevel::Low => "low",
        };
        f.write_str(name)
    }
}

/// Options shared by every point of a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsochroneOptions {
    /// Width used to buffer the reached sub-network, in projected units
    pub buffer_size: f64,
    /// Polygon construction strategy
    pub detail_level: DetailLevel,
    /// Fixed concave hull threshold used by [`DetailLevel::Low`]
    pub concave_hull_threshold: f64,
    /// Generated coordinates are snapped to a grid of `1 / precision_scale`
    pub precision_scale: f64,
    /// Radius of the whole-edge buffers used for chopped edge containment tests
    pub cover_radius: f64,
    /// Drop interior rings from the resulting polygons
    pub remove_holes: bool,
    /// Worker pool size, defaults to the available hardware parallelism
    pub worker_threads: Option<usize>,
}

impl Default for IsochroneOptions {
    fn default() -> Self {
        Self {
            buffer_size: 50.0,
            detail_level: DetailLevel::default(),
            concave_hull_threshold: 100.0,
            precision_scale: 100.0,
            cover_radius: 1.0,
            remove_holes: false,
            worker_threads: None,
        }
    }
}

impl IsochroneOptions {
    pub fn with_buffer_size(mut self, buffer_size: f64) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn with_detail_level(mut self, detail_level: DetailLevel) -> Self {
        self.detail_level = detail_level;
        self
    }

    pub fn with_concave_hull_threshold(mut self, threshold: f64) -> Self {
        self.concave_hull_threshold = threshold;
        self
    }

    pub fn with_remove_holes(mut self, remove_holes: bool) -> Self {
        self.remove_holes = remove_holes;
        self
    }

    pub fn with_worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = Some(worker_threads);
        self
    }

    /// Parses options from a TOML document and validates them
    pub fn from_toml_str(source: &str) -> Result<Self, Error> {
        let options: Self = toml::from_str(source).map_err(|e| Error::Config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, Error> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Concavity threshold for the hull strategies, `None` for the union strategy
    pub fn hull_threshold(&self, reach_distance: f64) -> Option<f64> {
        match self.detail_level {
            DetailLevel::High => None,
            DetailLevel::Mid => Some(reach_distance / 4.0),
            DetailLevel::Low => Some(self.concave_hull_threshold),
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        check_positive("buffer_size", self.buffer_size)?;
        check_positive("concave_hull_threshold", self.concave_hull_threshold)?;
        check_positive("precision_scale", self.precision_scale)?;
        check_positive("cover_radius", self.cover_radius)?;

        if self.worker_threads == Some(0) {
            return Err(Error::Config(
                "worker_threads must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

fn check_positive(name: &str, value: f64) -> Result<(), Error> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "{name} must be a finite positive number, got {value}"
        )))
    }
}
