// Domain layer
// Plain data models and the services that operate on them

pub mod models;
pub mod services;
