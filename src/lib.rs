//! GPFS I/O, pool and quota metrics in prometheus text format.
//!
//! One collection cycle runs `mmpmon` for the per node I/O counters and,
//! for every locally administrable file system found there, `mmlspool`,
//! `mmlsfileset` and `mmrepquota`. Only `mmpmon` failing aborts a cycle.

#![deny(clippy::all)]
#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]

pub mod catalog;
pub mod command;
pub mod config;
pub mod correlate;
pub mod fileset;
pub mod iostat;
pub mod normalize;
pub mod pipeline;
pub mod pool;
pub mod quota;
pub mod render;
pub mod table;

pub use config::Config;
pub use pipeline::{collect, scrape, Backend, Collection, Commands};
