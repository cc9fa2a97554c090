//! Compute module - Mass-loss bookkeeping, wind models and particle emission.

pub mod constants;
mod driver;
mod emitter;
mod ensemble;
mod evolution;
mod model;
mod sink;
mod velocity;

pub use driver::*;
pub use emitter::*;
pub use ensemble::*;
pub use evolution::*;
pub use model::*;
pub use sink::*;
pub use velocity::*;
