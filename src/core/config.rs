//! Remeshing thresholds and engine configuration.
//!
//! All tunables that govern topological rearrangements live in a single
//! [`RemeshConfig`] value owned by the mesh. There is no global state: the config is
//! handed to the mesh at construction and read by every operation through it.
//!
//! # Examples
//!
//! ```rust
//! use vertex_mesh::core::config::{RemeshConfig, RemeshConfigBuilder};
//!
//! let config = RemeshConfigBuilder::default()
//!     .cell_rearrangement_threshold(0.05)
//!     .t2_threshold(0.01)
//!     .build()
//!     .unwrap();
//! assert!(config.validate().is_ok());
//! assert_eq!(config.t1_new_edge_length(), 0.05);
//!
//! let defaults = RemeshConfig::default();
//! assert_eq!(defaults.cell_rearrangement_threshold, 0.01);
//! ```

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a [`RemeshConfig`] is inconsistent.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A threshold is zero, negative, or not finite.
    #[error("Threshold `{name}` must be positive and finite, got {value}")]
    NonPositiveThreshold {
        /// Name of the offending field.
        name: &'static str,
        /// Value supplied.
        value: f64,
    },
    /// The rearrangement ratio would create edges that immediately re-trigger a swap.
    #[error("cell_rearrangement_ratio must be >= 1, got {ratio}")]
    RatioBelowOne {
        /// Value supplied.
        ratio: f64,
    },
    /// Dividing an edge at the division threshold would produce halves short enough to
    /// be merged straight back.
    #[error(
        "edge_division_threshold ({edge_division_threshold}) must exceed twice the cell_rearrangement_threshold ({cell_rearrangement_threshold})"
    )]
    DivisionBelowRearrangement {
        /// Edge division threshold supplied.
        edge_division_threshold: f64,
        /// Cell rearrangement threshold supplied.
        cell_rearrangement_threshold: f64,
    },
    /// The per-pass operation budget is zero.
    #[error("max_operations_per_pass must be at least 1")]
    ZeroOperationBudget,
}

/// Thresholds and switches for vertex-mesh remeshing.
#[derive(Builder, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[builder(default)]
#[serde(default)]
pub struct RemeshConfig {
    /// Edges shorter than this trigger a node merge or T1 swap.
    pub cell_rearrangement_threshold: f64,
    /// A T1 swap leaves its new edge `ratio × cell_rearrangement_threshold` long; the
    /// default of 1 makes it exactly the threshold.
    pub cell_rearrangement_ratio: f64,
    /// Triangular elements with area below this are removed by a T2 swap.
    pub t2_threshold: f64,
    /// Edges longer than this are divided at their midpoint.
    pub edge_division_threshold: f64,
    /// Run the boundary-overlap (T3) repair pass during remeshing.
    pub check_for_intersections: bool,
    /// Upper bound on operations executed by a single remesh pass.
    pub max_operations_per_pass: usize,
    /// Seed of the generator used for the short axis of isotropic elements.
    pub short_axis_seed: u64,
}

impl Default for RemeshConfig {
    fn default() -> Self {
        Self {
            cell_rearrangement_threshold: 0.01,
            cell_rearrangement_ratio: 1.0,
            t2_threshold: 0.001,
            edge_division_threshold: f64::MAX,
            check_for_intersections: false,
            max_operations_per_pass: 100_000,
            short_axis_seed: 0,
        }
    }
}

impl RemeshConfig {
    /// Length of the new edge created by a T1 swap.
    #[inline]
    #[must_use]
    pub fn t1_new_edge_length(&self) -> f64 {
        self.cell_rearrangement_ratio * self.cell_rearrangement_threshold
    }

    /// Minimum distance kept between a node inserted by element division and the
    /// existing nodes of the divided edge.
    #[inline]
    #[must_use]
    pub fn division_node_clearance(&self) -> f64 {
        2.0 * self.cell_rearrangement_threshold
    }

    /// Checks that the configuration is self-consistent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] describing the first inconsistency found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            (
                "cell_rearrangement_threshold",
                self.cell_rearrangement_threshold,
            ),
            ("t2_threshold", self.t2_threshold),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositiveThreshold { name, value });
            }
        }
        if self.edge_division_threshold.is_nan() || self.edge_division_threshold <= 0.0 {
            return Err(ConfigError::NonPositiveThreshold {
                name: "edge_division_threshold",
                value: self.edge_division_threshold,
            });
        }
        if !(self.cell_rearrangement_ratio >= 1.0 && self.cell_rearrangement_ratio.is_finite()) {
            return Err(ConfigError::RatioBelowOne {
                ratio: self.cell_rearrangement_ratio,
            });
        }
        if self.edge_division_threshold <= 2.0 * self.cell_rearrangement_threshold {
            return Err(ConfigError::DivisionBelowRearrangement {
                edge_division_threshold: self.edge_division_threshold,
                cell_rearrangement_threshold: self.cell_rearrangement_threshold,
            });
        }
        if self.max_operations_per_pass == 0 {
            return Err(ConfigError::ZeroOperationBudget);
        }
        Ok(())
    }
}
