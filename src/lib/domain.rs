//! Domain layer: recipients, delivery backends and send campaigns.

pub mod campaigns;
pub mod communication;
