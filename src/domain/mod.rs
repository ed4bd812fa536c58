// Domain layer: card/placement models and ports (interfaces).

pub mod model;
pub mod ports;
