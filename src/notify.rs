//! Notices.
//!
//! One notice is visible at a time; a newer one replaces the current
//! one immediately. Notices posted with [`Notifier::post`] hide
//! themselves after the configured time to live, and a replaced
//! notice's expiry must not touch its successor. That is what the
//! generation counter is for: every shown notice gets a fresh
//! generation, and a scheduled hide fires only if its generation is
//! still the current one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// A message for the person behind the screen.
///
/// Hiding flips `visible` instead of clearing the value, so embedders
/// can fade the last message out instead of dropping it abruptly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub severity: Severity,
    pub visible: bool,
}

/// Publishes notices to watchers, last write wins.
#[derive(Clone)]
pub struct Notifier(Arc<NotifierInner>);

struct NotifierInner {
    current: watch::Sender<Option<Notice>>,
    generation: AtomicU64,
    ttl: Duration,
}

impl Notifier {
    pub fn new(ttl: Duration) -> Notifier {
        let (current, _) = watch::channel(None);
        Notifier(Arc::new(NotifierInner {
            current,
            generation: AtomicU64::new(0),
            ttl,
        }))
    }

    /// Shows a notice and schedules it to hide after the ttl.
    pub fn post(&self, severity: Severity, message: impl Into<String>) {
        let generation = self.show(severity, message.into());
        let notifier = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(notifier.0.ttl).await;
            notifier.hide(generation);
        });
    }

    /// Shows a notice that stays until something replaces it. Used
    /// for conditions the person has to resolve, like a missing
    /// wallet.
    pub fn post_sticky(&self, severity: Severity, message: impl Into<String>) {
        self.show(severity, message.into());
    }

    /// The current notice, hidden or not.
    pub fn current(&self) -> Option<Notice> {
        self.0.current.borrow().clone()
    }

    /// Watch channel carrying every notice change.
    pub fn watch(&self) -> watch::Receiver<Option<Notice>> {
        self.0.current.subscribe()
    }

    // The generation moves inside the send closure. The sender's lock
    // then orders bump and replacement as one step against any hide.
    fn show(&self, severity: Severity, message: String) -> u64 {
        let mut generation = 0;
        self.0.current.send_modify(|current| {
            generation = self.0.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *current = Some(Notice {
                message,
                severity,
                visible: true,
            });
        });
        generation
    }

    fn hide(&self, generation: u64) {
        self.0.current.send_if_modified(|current| {
            if self.0.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            match current {
                Some(notice) if notice.visible => {
                    notice.visible = false;
                    true
                }
                _ => false,
            }
        });
    }
}
