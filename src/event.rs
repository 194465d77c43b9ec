use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind};
use futures::StreamExt;
use tokio::sync::mpsc;

use crate::config::ViewerConfig;

#[derive(Clone, Debug)]
pub enum Event {
    Key(KeyEvent),
    Resize,
    /// Viewer clock, every `viewer.tick_rate_ms`.
    Tick,
    /// A followed session gained rows since the last poll.
    SessionChanged,
}

/// Detects appends to a session directory by the combined size of its
/// records. Records only ever grow, so any change means new rows.
#[derive(Debug)]
pub struct SessionWatch {
    dir: PathBuf,
    last_size: u64,
}

impl SessionWatch {
    pub fn new(dir: &Path) -> Self {
        SessionWatch {
            dir: dir.to_path_buf(),
            last_size: records_size(dir),
        }
    }

    /// True when the records grew (or shrank) since the previous call.
    pub fn poll(&mut self) -> bool {
        let size = records_size(&self.dir);
        let changed = size != self.last_size;
        self.last_size = size;
        changed
    }
}

fn records_size(dir: &Path) -> u64 {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    entries
        .flatten()
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "csv"))
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    _task: tokio::task::JoinHandle<()>,
}

impl EventHandler {
    /// Spawns the input task. With `watch`, the session is polled every
    /// `viewer.follow_poll_ms` and `SessionChanged` is sent when it grows.
    pub fn new(config: &ViewerConfig, watch: Option<SessionWatch>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<Event>();
        let tick_rate = Duration::from_millis(config.tick_rate_ms.max(1));
        let poll_rate = Duration::from_millis(config.follow_poll_ms.max(1));

        let task = tokio::spawn(async move {
            let mut reader = EventStream::new();
            let mut tick = tokio::time::interval(tick_rate);
            let mut poll = tokio::time::interval(poll_rate);
            let mut watch = watch;

            loop {
                let event = tokio::select! {
                    maybe_event = reader.next() => match maybe_event {
                        Some(Ok(CrosstermEvent::Key(key))) if key.kind == KeyEventKind::Press => {
                            Some(Event::Key(key))
                        }
                        Some(Ok(CrosstermEvent::Resize(_, _))) => Some(Event::Resize),
                        Some(Ok(_)) => None,
                        Some(Err(_)) | None => break,
                    },
                    _ = tick.tick() => Some(Event::Tick),
                    _ = poll.tick(), if watch.is_some() => watch
                        .as_mut()
                        .is_some_and(SessionWatch::poll)
                        .then_some(Event::SessionChanged),
                };
                if let Some(e) = event
                    && tx.send(e).is_err()
                {
                    break;
                }
            }
        });

        Self { rx, _task: task }
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}
