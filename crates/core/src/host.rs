//! Game server host interface
//!
//! The admin core never talks to the engine directly. Everything it needs
//! from the server (chat output, console commands, the clock) goes through
//! [`Host`], which the plugin layer implements over the engine callbacks.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Services the admin core consumes from the game server
pub trait Host: Send {
    /// Send a chat line to every connected client
    fn broadcast(&self, message: &str);

    /// Send a chat line to a single slot
    fn send_to(&self, slot: usize, message: &str);

    /// Queue a line for the server console
    fn execute(&self, command: &str);

    /// Current wall-clock time in seconds since the Unix epoch
    fn now(&self) -> i64;
}

/// One call made against a [`RecordingHost`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Broadcast(String),
    SendTo(usize, String),
    Execute(String),
}

/// Host that records every call instead of reaching a server.
///
/// Clones share the same log and clock, so a test can keep one handle while
/// the core owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    calls: Arc<Mutex<Vec<HostCall>>>,
    clock: Arc<AtomicI64>,
}

impl RecordingHost {
    pub fn new(now: i64) -> Self {
        let host = Self::default();
        host.set_now(now);
        host
    }

    pub fn set_now(&self, now: i64) {
        self.clock.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: i64) {
        self.clock.fetch_add(seconds, Ordering::SeqCst);
    }

    /// Snapshot of every recorded call, oldest first
    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().clone()
    }

    pub fn broadcasts(&self) -> Vec<String> {
        self.filter(|call| match call {
            HostCall::Broadcast(msg) => Some(msg.clone()),
            _ => None,
        })
    }

    pub fn messages_to(&self, slot: usize) -> Vec<String> {
        self.filter(|call| match call {
            HostCall::SendTo(s, msg) if *s == slot => Some(msg.clone()),
            _ => None,
        })
    }

    pub fn executed(&self) -> Vec<String> {
        self.filter(|call| match call {
            HostCall::Execute(cmd) => Some(cmd.clone()),
            _ => None,
        })
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    fn filter<F>(&self, pick: F) -> Vec<String>
    where
        F: Fn(&HostCall) -> Option<String>,
    {
        self.calls.lock().iter().filter_map(pick).collect()
    }
}

impl Host for RecordingHost {
    fn broadcast(&self, message: &str) {
        self.calls.lock().push(HostCall::Broadcast(message.to_string()));
    }

    fn send_to(&self, slot: usize, message: &str) {
        self.calls
            .lock()
            .push(HostCall::SendTo(slot, message.to_string()));
    }

    fn execute(&self, command: &str) {
        self.calls.lock().push(HostCall::Execute(command.to_string()));
    }

    fn now(&self) -> i64 {
        self.clock.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_host_shares_log_between_clones() {
        let host = RecordingHost::new(100);
        let boxed: Box<dyn Host> = Box::new(host.clone());

        boxed.broadcast("hello");
        boxed.send_to(3, "psst");
        boxed.execute("kick 3");
        host.advance(5);

        assert_eq!(host.broadcasts(), vec!["hello"]);
        assert_eq!(host.messages_to(3), vec!["psst"]);
        assert!(host.messages_to(4).is_empty());
        assert_eq!(host.executed(), vec!["kick 3"]);
        assert_eq!(boxed.now(), 105);
    }
}
