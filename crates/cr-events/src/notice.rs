//! User-facing notices, delivered to explicit recipients rather than to every
//! event subscriber.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tokio::sync::broadcast;
use utoipa::ToSchema;

/// A kind of notice users can receive, e.g. `repository_new`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NoticeType {
    pub label: String,
    pub display: String,
    pub description: String,
    /// Delivery medium preference applied to users who never chose one.
    pub default_medium: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", content = "users")]
pub enum Recipients {
    Users(Vec<String>),
    AllExcept(Vec<String>),
}

impl Recipients {
    pub fn includes(&self, user: &str) -> bool {
        match self {
            Self::Users(users) => users.iter().any(|value| value == user),
            Self::AllExcept(excluded) => !excluded.iter().any(|value| value == user),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Notice {
    pub label: String,
    pub recipients: Recipients,
    pub context: Value,
    pub at: DateTime<Utc>,
}

/// A notice as kept for its recipients to read back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StoredNotice {
    pub seq: i64,
    pub label: String,
    pub context: Value,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum NoticeError {
    #[error("unknown notice type: {label}")]
    UnknownType { label: String },
    #[error("no notice subscribers")]
    NoSubscribers,
}

#[derive(Clone)]
pub struct NoticeBus {
    sender: broadcast::Sender<Notice>,
    types: Arc<RwLock<BTreeMap<String, NoticeType>>>,
}

impl NoticeBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            types: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }

    /// Registers `notice_type`, replacing any previous definition with the
    /// same label.
    pub fn register_type(&self, notice_type: NoticeType) {
        let mut types = match self.types.write() {
            Ok(types) => types,
            Err(poisoned) => poisoned.into_inner(),
        };
        types.insert(notice_type.label.clone(), notice_type);
    }

    pub fn notice_type(&self, label: &str) -> Option<NoticeType> {
        let types = match self.types.read() {
            Ok(types) => types,
            Err(poisoned) => poisoned.into_inner(),
        };
        types.get(label).cloned()
    }

    /// Returns how many subscribers received the notice.
    pub fn send(
        &self,
        label: &str,
        recipients: Recipients,
        context: Value,
    ) -> Result<usize, NoticeError> {
        if self.notice_type(label).is_none() {
            return Err(NoticeError::UnknownType {
                label: label.to_string(),
            });
        }
        let notice = Notice {
            label: label.to_string(),
            recipients,
            context,
            at: Utc::now(),
        };
        self.sender
            .send(notice)
            .map_err(|_| NoticeError::NoSubscribers)
    }
}
