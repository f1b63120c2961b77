use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

/// One named display element of the dashboard page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub text: String,
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone: Option<&'static str>,
}

impl Slot {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), visible: true, tone: None }
    }

    pub fn hidden() -> Self {
        Self { text: String::new(), visible: false, tone: None }
    }

    pub fn toned(text: impl Into<String>, tone: &'static str) -> Self {
        Self { text: text.into(), visible: true, tone: Some(tone) }
    }
}

pub type SlotUpdate = (&'static str, Slot);

/// Server-side copy of everything the dashboard shows, keyed by element id.
/// Writers overwrite whole slots; the last write wins.
#[derive(Default)]
pub struct DisplayBoard {
    slots: RwLock<BTreeMap<&'static str, Slot>>,
}

impl DisplayBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&self, updates: Vec<SlotUpdate>) {
        let mut slots = self.slots.write().unwrap();
        for (key, slot) in updates {
            slots.insert(key, slot);
        }
    }

    pub fn get(&self, key: &str) -> Option<Slot> {
        self.slots.read().unwrap().get(key).cloned()
    }

    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).map(|s| s.text)
    }

    pub fn snapshot(&self) -> BTreeMap<&'static str, Slot> {
        self.slots.read().unwrap().clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub id: u64,
    pub ts: String,
    pub kind: NoticeKind,
    pub message: String,
    #[serde(skip)]
    pub expires_at: DateTime<Utc>,
}

const MAX_NOTICES: usize = 50;

/// Transient user-facing messages. Each notice disappears after the TTL.
pub struct Notifier {
    ttl: chrono::Duration,
    next_id: AtomicU64,
    notices: Mutex<VecDeque<Notice>>,
}

impl Notifier {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl: chrono::Duration::seconds(ttl_secs as i64),
            next_id: AtomicU64::new(1),
            notices: Mutex::new(VecDeque::with_capacity(MAX_NOTICES)),
        }
    }

    pub fn push(&self, kind: NoticeKind, message: &str) -> u64 {
        match kind {
            NoticeKind::Error => tracing::warn!(text = message, "notice"),
            _ => tracing::info!(kind = ?kind, text = message, "notice"),
        }
        let now = Utc::now();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut notices = self.notices.lock().unwrap();
        if notices.len() >= MAX_NOTICES {
            notices.pop_front();
        }
        notices.push_back(Notice {
            id,
            ts: now.format("%H:%M:%S").to_string(),
            kind,
            message: message.to_string(),
            expires_at: now + self.ttl,
        });
        id
    }

    pub fn success(&self, message: &str) -> u64 {
        self.push(NoticeKind::Success, message)
    }

    pub fn error(&self, message: &str) -> u64 {
        self.push(NoticeKind::Error, message)
    }

    pub fn info(&self, message: &str) -> u64 {
        self.push(NoticeKind::Info, message)
    }

    /// Unexpired notices, oldest first. Expired ones are dropped.
    pub fn active(&self, now: DateTime<Utc>) -> Vec<Notice> {
        let mut notices = self.notices.lock().unwrap();
        notices.retain(|n| n.expires_at > now);
        notices.iter().cloned().collect()
    }

    pub fn dismiss(&self, id: u64) -> bool {
        let mut notices = self.notices.lock().unwrap();
        let before = notices.len();
        notices.retain(|n| n.id != id);
        notices.len() != before
    }
}
