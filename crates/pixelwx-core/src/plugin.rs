use anyhow::Result;
use chrono::{DateTime, Local};
use std::time::Duration;

use crate::frame::RenderableFrame;

/// Display plugin trait: the host pushes ticks, the plugin returns frames.
///
/// The host owns the render loop and the clock. Plugins hold no timers of
/// their own; everything they do happens inside `tick`.
pub trait DisplayPlugin: Send {
    /// Unique identifier for this plugin
    fn id(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Called when the host shows this plugin. Failing here keeps the
    /// plugin inactive.
    fn activate(&mut self, ctx: &PluginContext) -> Result<()>;

    /// Called when the host hides this plugin.
    fn deactivate(&mut self);

    /// Advance internal state by one host tick and return the frame to
    /// render. `elapsed` is the wall-clock time since the previous tick.
    ///
    /// Must return promptly: anything slow belongs on the runtime in
    /// `PluginContext`.
    fn tick(&mut self, now: DateTime<Local>, elapsed: Duration) -> RenderableFrame;
}

/// Context provided to plugins on activation.
pub struct PluginContext {
    /// Runtime for background work (network fetches). Plugins spawn onto
    /// this and consume completions on later ticks.
    pub runtime: tokio::runtime::Handle,
}

impl PluginContext {
    pub fn new(runtime: tokio::runtime::Handle) -> Self {
        Self { runtime }
    }
}
