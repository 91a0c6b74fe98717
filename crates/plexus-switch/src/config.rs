//! Switch configuration.

use derive_builder::Builder;
use plexus_graph::PlugId;

/// Where a switch reads its enabled flag from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnabledSource {
    /// The switch creates its own `enabled` plug with this default.
    Own {
        /// Default value of the plug.
        default: bool,
    },
    /// The switch reads an existing plug owned elsewhere, such as the
    /// enabled flag of an enclosing node.
    Shared(PlugId),
}

impl Default for EnabledSource {
    fn default() -> Self {
        Self::Own { default: true }
    }
}

/// Configuration for a [`Switch`](crate::Switch).
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct SwitchConfig {
    /// Name of the switch node.
    #[builder(default = "\"switch\".to_owned()")]
    pub name: String,

    /// Initial value of the `index` plug.
    #[builder(default)]
    pub default_index: i64,

    /// Source of the enabled flag.
    #[builder(default)]
    pub enabled: EnabledSource,

    /// Context variables that only have meaning for the selected input.
    ///
    /// A context-varying index is evaluated with these variables removed,
    /// so that choosing an input never depends on state the input itself
    /// defines.
    #[builder(default, setter(each(name = "local_context_key", into)))]
    pub local_context_keys: Vec<String>,
}

impl SwitchConfig {
    /// Returns a builder for creating a switch configuration.
    pub fn builder() -> SwitchConfigBuilder {
        SwitchConfigBuilder::default()
    }
}

impl SwitchConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err("switch name cannot be empty".into());
            }
        }
        Ok(())
    }
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            name: "switch".to_owned(),
            default_index: 0,
            enabled: EnabledSource::default(),
            local_context_keys: Vec::new(),
        }
    }
}
