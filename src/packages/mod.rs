// src/packages/mod.rs

//! Package records and RPM header reading
//!
//! Every package in the universe is reduced to a [`PackageRecord`]: its
//! identity plus the raw provide/require expressions the header builder
//! consumes. Records come from repository metadata or, for the seed package,
//! straight from an RPM file.

pub mod record;
pub mod rpm;

pub use record::{PackageRecord, Requirement};
