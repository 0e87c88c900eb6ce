use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{self as term, KeyEvent, KeyEventKind, MouseEvent};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::error::{AppError, Result};

/// Everything the main loop reacts to.
#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// No input arrived within the tick interval.
    Tick,
    Resize(u16, u16),
    /// Directories touched on disk, as reported by the watcher.
    FsChange(Vec<PathBuf>),
}

impl Event {
    /// Map a terminal event onto ours. Key releases are dropped so each
    /// keystroke dispatches once on terminals that report them.
    fn from_terminal(raw: term::Event) -> Option<Self> {
        match raw {
            term::Event::Key(key) if key.kind == KeyEventKind::Release => None,
            term::Event::Key(key) => Some(Event::Key(key)),
            term::Event::Mouse(mouse) => Some(Event::Mouse(mouse)),
            term::Event::Resize(cols, rows) => Some(Event::Resize(cols, rows)),
            _ => None,
        }
    }
}

/// Queue of events fed by a background terminal reader and the watcher.
pub struct EventHandler {
    queue: UnboundedReceiver<Event>,
    feed: UnboundedSender<Event>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (feed, queue) = mpsc::unbounded_channel();
        tokio::spawn(read_terminal(feed.clone(), tick_rate));
        Self { queue, feed }
    }

    /// Another producer for the same queue.
    pub fn sender(&self) -> UnboundedSender<Event> {
        self.feed.clone()
    }

    /// True when further events are already waiting.
    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    pub async fn next(&mut self) -> Result<Event> {
        self.queue
            .recv()
            .await
            .ok_or_else(|| AppError::Terminal("event queue closed".into()))
    }
}

/// Poll the terminal until the queue's receiving side goes away.
async fn read_terminal(feed: UnboundedSender<Event>, tick_rate: Duration) {
    loop {
        let next = match term::poll(tick_rate) {
            Ok(true) => term::read().ok().and_then(Event::from_terminal),
            Ok(false) | Err(_) => Some(Event::Tick),
        };
        let Some(event) = next else { continue };
        if feed.send(event).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    #[test]
    fn key_release_is_dropped() {
        let mut key = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        key.kind = KeyEventKind::Release;
        assert!(Event::from_terminal(term::Event::Key(key)).is_none());
    }

    #[test]
    fn key_press_and_resize_pass_through() {
        let key = KeyEvent::new(KeyCode::Down, KeyModifiers::NONE);
        assert!(matches!(
            Event::from_terminal(term::Event::Key(key)),
            Some(Event::Key(k)) if k.code == KeyCode::Down
        ));
        assert!(matches!(
            Event::from_terminal(term::Event::Resize(80, 24)),
            Some(Event::Resize(80, 24))
        ));
    }

    #[test]
    fn focus_events_are_ignored() {
        assert!(Event::from_terminal(term::Event::FocusGained).is_none());
    }
}
