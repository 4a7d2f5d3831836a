#![deny(warnings)]
pub mod bayes;
pub mod model;
pub mod profile;
