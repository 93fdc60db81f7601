//! Local media transformations.
//!
//! - [`bisect`]: Split before/after comparison photos at the horizontal midpoint
//! - [`checkerboard`]: Color-key fake transparency checkerboards out of PNGs
//! - [`pdf`]: Extract plain text from PDF documents
//!
//! These jobs touch only the local filesystem. Each input file is one unit of
//! work and yields an [`Outcome`](crate::outcome::Outcome).

pub mod bisect;
pub mod checkerboard;
pub mod pdf;
