//! Discrete Bayesian networks with tabular CPDs and exact inference.
//!
//! This module is composed of:
//! - `product`: mixed-radix enumeration of parent-state combinations.
//! - `cpt`: conditional probability tables and their validation.
//! - `heuristic`: additive risk scores compiled into a terminal CPT.
//! - `network`: variables, DAG validation and the network builder.
//! - `inference`: exact posterior queries by enumeration.
//! - `snapshot`: serializable view of a compiled network.

mod cpt;
mod heuristic;
mod inference;
mod network;
mod product;
pub mod snapshot;

pub use cpt::{Cpt, SUM_TOLERANCE};
pub use heuristic::{AdditiveRiskModel, RISK_VARIABLE, RiskTerm, STATE_RISKY, STATE_SAFE};
pub use inference::{InferenceError, PosteriorResult};
pub use network::{BayesianNetwork, NetworkBuilder, NetworkError, RandomVariable};
pub use product::{CartesianProduct, column_index};
