// Domain layer: signal models and the signal source port.

pub mod model;
pub mod ports;
