// Domain layer: typed catalog records and the ports the display side plugs into.

pub mod model;
pub mod ports;
