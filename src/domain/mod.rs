// Domain layer: models and ports (interfaces) shared by every tool.

pub mod model;
pub mod ports;
