#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod dependency;
mod error;
mod index;
mod node;
mod plugs;
mod resolve;
mod router;
mod topology;
mod wiring;

#[cfg(test)]
mod fixture;

#[doc(hidden)]
pub mod prelude;

pub use config::{EnabledSource, SwitchConfig, SwitchConfigBuilder, SwitchConfigBuilderError};
pub use error::{SwitchError, SwitchResult};
pub use node::{Switch, SwitchBehavior};
pub use plugs::{ENABLED_PLUG, IN_PLUG, INDEX_PLUG, OUT_PLUG};
pub use wiring::WiringState;

/// Tracing target for input selection and routed evaluation.
pub const TRACING_TARGET_ROUTE: &str = "plexus_switch::route";

/// Tracing target for setup and direct wiring changes.
pub const TRACING_TARGET_WIRING: &str = "plexus_switch::wiring";
