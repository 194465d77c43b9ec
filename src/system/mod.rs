pub mod probe;
pub mod process;
pub mod snapshot;
