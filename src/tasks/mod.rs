//! Background Tasks Module
//!
//! - Expiry sweep: drops expired cache entries at a fixed interval
//! - Staleness watch: flags a mounted query whose entry has expired

mod cleanup;
mod staleness;

pub use cleanup::spawn_cleanup_task;
pub use staleness::spawn_staleness_watch;
