//! Office simulation kernel: walkability grid, incremental pathfinding,
//! per-agent motion/state machines, and the wander & social schedulers,
//! composed into a deterministic tick executor.
//!
//! All activity is interleaved cooperatively inside `OfficeWorld::step`:
//! there are no threads, no locks, and no wall-clock time. A run is a pure
//! function of its configuration and command schedule.

pub mod agent;
pub mod grid;
pub mod path;
pub mod rng;
pub mod social;
pub mod wander;
pub mod world;
