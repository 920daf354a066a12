// Domain layer: upstream records and ports (interfaces) the client depends on.

pub mod model;
pub mod ports;
