//! Runtime infrastructure shared by the services

pub mod lifecycle;

pub use lifecycle::{PeriodicTask, ShutdownCoordinator};
