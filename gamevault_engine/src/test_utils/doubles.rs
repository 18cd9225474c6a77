use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::{helpers::clock::Clock, notify::NotificationGateway};

/// A message the [`MemoryGateway`] was asked to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub phone: String,
    pub message: String,
}

/// In-memory notification gateway that records everything it is asked to send.
#[derive(Clone, Default)]
pub struct MemoryGateway {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends report failure, the way a dead WhatsApp channel would.
    /// Attempts are still recorded.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, phone: &str) -> Vec<SentMessage> {
        self.sent().into_iter().filter(|m| m.phone == phone).collect()
    }

    /// Number of recorded messages whose body contains `needle`.
    pub fn messages_containing(&self, needle: &str) -> usize {
        self.sent().iter().filter(|m| m.message.contains(needle)).count()
    }
}

#[async_trait]
impl NotificationGateway for MemoryGateway {
    async fn send(&self, phone: &str, message: &str) -> bool {
        self.sent
            .lock()
            .unwrap()
            .push(SentMessage { phone: phone.to_string(), message: message.to_string() });
        !self.failing.load(Ordering::SeqCst)
    }
}

/// A clock that only moves when the test says so.
#[derive(Clone)]
pub struct TestClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl TestClock {
    pub fn at(start: DateTime<Utc>) -> Self {
        Self { now: Arc::new(Mutex::new(start)) }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap() = to;
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
