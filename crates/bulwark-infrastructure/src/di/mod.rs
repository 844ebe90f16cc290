//! Composition root
//!
//! [`AppContext`] is built once at process start and handed to callers in
//! place of global service singletons.

mod bootstrap;

pub use bootstrap::{AppContext, ServiceModes};
