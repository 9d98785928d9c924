pub mod config;
pub mod field;
pub mod registry;
pub mod snapshot;
pub mod task;

pub use config::*;
pub use field::*;
pub use registry::*;
pub use snapshot::*;
pub use task::*;
