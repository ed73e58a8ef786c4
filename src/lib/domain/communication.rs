//! Communication primitives: recipients and the delivery backends that reach them.

pub mod delivery;
pub mod recipients;
