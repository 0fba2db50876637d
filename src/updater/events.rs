//! Status events fanned out to the presentation layer.

use serde::Serialize;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::updater::download::DownloadProgress;

/// Event emitted during a check or install cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum UpdateEvent {
    Checking,
    Available {
        version: String,
        #[serde(rename = "downloadUrl")]
        download_url: String,
        changelog: Vec<String>,
    },
    NotAvailable,
    Downloading {
        version: String,
    },
    Progress {
        percent: Option<f64>,
        downloaded: u64,
        total: Option<u64>,
    },
    Downloaded {
        version: String,
    },
    Error {
        message: String,
    },
}

impl UpdateEvent {
    /// Wire name of the event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::Available {
                ..
            } => "available",
            Self::NotAvailable => "not-available",
            Self::Downloading {
                ..
            } => "downloading",
            Self::Progress {
                ..
            } => "progress",
            Self::Downloaded {
                ..
            } => "downloaded",
            Self::Error {
                ..
            } => "error",
        }
    }
}

impl From<DownloadProgress> for UpdateEvent {
    fn from(p: DownloadProgress) -> Self {
        Self::Progress {
            percent: p.percent,
            downloaded: p.transferred,
            total: p.total,
        }
    }
}

/// Receives orchestrator events. Must not block.
pub trait EventSink: Send + Sync {
    fn notify(&self, event: UpdateEvent);
}

/// Sink that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn notify(&self, event: UpdateEvent) {
        match &event {
            UpdateEvent::Error {
                message,
            } => error!(event = event.name(), "{message}"),
            UpdateEvent::Progress {
                ..
            } => debug!(?event, "update progress"),
            _ => info!(event = event.name(), ?event, "update event"),
        }
    }
}

/// Sink forwarding events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<UpdateEvent>,
}

impl ChannelSink {
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<UpdateEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
            },
            rx,
        )
    }
}

impl EventSink for ChannelSink {
    fn notify(&self, event: UpdateEvent) {
        // a dropped receiver just means nobody is listening any more
        let _ = self.tx.send(event);
    }
}

/// Sink that records every event, for inspection after the fact.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<UpdateEvent>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of events received so far.
    pub fn events(&self) -> Vec<UpdateEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Names of events received so far, progress events collapsed.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Vec::new();
        for event in self.events() {
            let name = event.name();
            if name == "progress" && names.last() == Some(&"progress") {
                continue;
            }
            names.push(name);
        }
        names
    }
}

impl EventSink for RecordingSink {
    fn notify(&self, event: UpdateEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
