//! Fixture loading: sources, the load barrier, the registry and the session that ties
//! them together.

pub mod barrier;
pub mod registry;
pub mod session;
pub mod source;

pub use barrier::{LoadBarrier, LoadToken};
pub use registry::{FixtureEntry, FixtureRegistry};
pub use session::FixtureSession;
pub use source::{DirFixtureSource, FixtureSource, MemoryFixtureSource};
