pub mod seed;
pub mod status_monitor;

pub use seed::{SeedStats, seed_sample_data};
pub use status_monitor::{StatusMonitor, SweepStats};
