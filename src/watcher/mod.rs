use std::io;

use inotify::{EventMask, Inotify, WatchMask};
use tokio::sync::mpsc::Sender;

#[derive(Debug, Clone)]
pub enum WatchEvent {
    Create { name: String, base_path: String },
    Delete { name: String, base_path: String },
}

/// Watch for filesystem changes on the given path, sending [WatchEvent]
/// to the given channel. Blocks until the receiving side is dropped or
/// reading events fails.
pub fn watch(path: String, tx: Sender<WatchEvent>) -> io::Result<()> {
    let mut inotify = Inotify::init()?;
    inotify
        .watches()
        .add(path.clone(), WatchMask::CREATE | WatchMask::DELETE)?;

    // Listen for watch events
    let mut buffer = [0u8; 4096];
    loop {
        let events = inotify.read_events_blocking(&mut buffer)?;

        for event in events {
            let Some(name) = event.name.and_then(|name| name.to_str()) else {
                continue;
            };
            let name = name.to_string();

            let value = if event.mask.contains(EventMask::CREATE) {
                log::debug!("inotify CREATE: {name}");
                WatchEvent::Create {
                    name,
                    base_path: path.clone(),
                }
            } else if event.mask.contains(EventMask::DELETE) {
                log::debug!("inotify DELETE: {name}");
                WatchEvent::Delete {
                    name,
                    base_path: path.clone(),
                }
            } else {
                continue;
            };

            // Send the event over our channel
            if let Err(e) = tx.blocking_send(value) {
                log::debug!("Watcher channel closed: {e}");
                return Ok(());
            }
        }
    }
}
