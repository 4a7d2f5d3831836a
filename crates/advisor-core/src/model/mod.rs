//! Questionnaire vocabulary: sports, answer fields and the evidence they produce.

pub mod evidence;
pub mod field;
pub mod sport;

pub use evidence::{Evidence, EvidenceError};
pub use field::{Bucket, FieldSpec, NormalizeError, fold_input};
pub use sport::{ParseSportError, Sport};
