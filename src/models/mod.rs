pub mod generation;
pub mod job;
pub mod vehicle;

pub use generation::*;
pub use job::*;
pub use vehicle::*;
