//! Shared fixtures for the integration tests.

use jnu_exam::progress::{ChannelSink, EventSink, ProgressEvent};
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

/// A small listing with one nested directory and two files.
pub fn listing_json(base_url: &str) -> String {
    serde_json::json!({
        "name": "root",
        "path": "",
        "dirs": [
            {
                "name": "Math",
                "path": "Math",
                "dirs": [],
                "files": [
                    {
                        "name": "final-2023.pdf",
                        "path": "Math/final-2023.pdf",
                        "size": 11,
                        "cf_url": format!("{base_url}/files/final-2023.pdf"),
                        "github_url": ""
                    }
                ]
            }
        ],
        "files": [
            {
                "name": "README.txt",
                "path": "README.txt",
                "size": "5",
                "cf_url": format!("{base_url}/files/README.txt")
            }
        ]
    })
    .to_string()
}

/// Sink that forwards into a channel, plus the receiving half.
pub fn channel_sink() -> (Arc<dyn EventSink>, UnboundedReceiver<ProgressEvent>) {
    let (tx, rx) = unbounded_channel();
    (Arc::new(ChannelSink::new(tx)), rx)
}

/// Everything received so far.
pub fn drain(rx: &mut UnboundedReceiver<ProgressEvent>) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    hex::encode(Sha256::digest(data))
}
