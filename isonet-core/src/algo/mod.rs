//! Isochrone algorithms: network traversal, polygon synthesis and the
//! per-point and batch pipelines built on them.

pub mod batch;
pub mod hull;
pub mod isochrone;
pub mod synthesis;
pub mod traversal;
