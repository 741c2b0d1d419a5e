//! Task graph interchange formats.
//!
//! Two formats, both grounded in the originals this crate was distilled
//! from: [`json`] mirrors `estee.serialization.dask_json`'s flat array of
//! task records, and [`dax`] mirrors `schedsim.serialization.dax`'s Pegasus
//! workflow XML. Both round-trip through a [`crate::graph::TaskGraph`] (task
//! ids renumbered densely; arc structure preserved).

pub mod dax;
pub mod json;
