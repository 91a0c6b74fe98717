//! Convenient re-exports for common use.

pub use crate::{EnabledSource, Switch, SwitchConfig, SwitchError, SwitchResult, WiringState};
