//! Automatic invocation on document save.

use crate::config::Config;
use crate::invocation::ToolInvocation;
use crate::orchestrator::WatchOrchestrator;
use crate::sink::ResultSink;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// One save notification from the editor integration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveEvent {
    pub path: PathBuf,

    /// True when the save targets a different location than the
    /// document's current path ("save a copy as").
    pub is_save_as_copy: bool,
}

/// Maps save notifications into tool invocations.
///
/// Enabled only through startup configuration; there is no runtime
/// toggle.
pub struct SaveTrigger {
    enabled: bool,
}

impl SaveTrigger {
    pub fn from_config(config: &Config) -> Self {
        SaveTrigger {
            enabled: config.watch.on_save,
        }
    }

    /// The invocation a save event maps to, if any.
    ///
    /// Copies saved to another location are suppressed; everything
    /// else produces an invocation whose sole target is the saved
    /// path.
    pub fn invocation_for(&self, event: &SaveEvent, config: &Config) -> Option<ToolInvocation> {
        if !self.enabled || event.is_save_as_copy {
            return None;
        }
        ToolInvocation::new(config, vec![event.path.clone()]).ok()
    }

    /// Consume save events until the channel closes, running an
    /// invocation per accepted event.
    ///
    /// Events are read one at a time and each invocation completes
    /// before the next event is taken, so submissions to the
    /// orchestrator never overlap.
    pub async fn watch<S: ResultSink>(
        &self,
        mut events: mpsc::Receiver<SaveEvent>,
        orchestrator: &WatchOrchestrator<S>,
        config: &Config,
    ) {
        while let Some(event) = events.recv().await {
            if let Some(invocation) = self.invocation_for(&event, config) {
                let _ = orchestrator.run(invocation).await;
            }
        }
    }
}
