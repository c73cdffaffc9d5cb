use crate::groups::Group;
use crate::types::{Registration, UserId};
use cr_events::notice::{NoticeBus, NoticeType, Recipients};
use serde_json::{Value, json};
use thiserror::Error;

pub const REPOSITORY_NEW: &str = "repository_new";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification delivery failed: {message}")]
    Delivery { message: String },
}

/// Optional outbound notification channel.
pub trait Notifier: Send + Sync {
    fn ensure_notice_type(&self, notice_type: &NoticeType) -> Result<(), NotifyError>;
    fn send(&self, label: &str, recipients: Recipients, context: Value)
    -> Result<(), NotifyError>;
}

pub fn repository_new_notice_type() -> NoticeType {
    NoticeType {
        label: REPOSITORY_NEW.to_string(),
        display: "New Repository".to_string(),
        description: "a new repository been created".to_string(),
        default_medium: 2,
    }
}

/// Members of the owning group, or everybody for ungrouped registrations.
/// The creator is never notified about their own registration.
pub fn new_repository_recipients(creator: &UserId, group: Option<&dyn Group>) -> Recipients {
    match group {
        Some(group) => Recipients::Users(
            group
                .members()
                .into_iter()
                .filter(|member| member != creator)
                .map(|member| member.as_str().to_string())
                .collect(),
        ),
        None => Recipients::AllExcept(vec![creator.as_str().to_string()]),
    }
}

pub fn new_repository_context(registration: &Registration, group: Option<&dyn Group>) -> Value {
    json!({
        "repository": registration,
        "group": group.map(|group| json!({
            "ref": group.group_ref(),
            "name": group.name(),
        })),
    })
}

impl Notifier for NoticeBus {
    fn ensure_notice_type(&self, notice_type: &NoticeType) -> Result<(), NotifyError> {
        if self.notice_type(&notice_type.label).is_none() {
            self.register_type(notice_type.clone());
        }
        Ok(())
    }

    fn send(
        &self,
        label: &str,
        recipients: Recipients,
        context: Value,
    ) -> Result<(), NotifyError> {
        NoticeBus::send(self, label, recipients, context)
            .map(|_| ())
            .map_err(|err| NotifyError::Delivery {
                message: err.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GroupRef, MemberGroup};

    fn user(name: &str) -> UserId {
        UserId::new(name.to_string()).unwrap()
    }

    #[test]
    fn group_members_minus_creator() {
        let group = MemberGroup {
            group: GroupRef::new("project", "1"),
            name: "Widgets".to_string(),
            members: vec![user("u"), user("w")],
        };
        let recipients = new_repository_recipients(&user("u"), Some(&group));
        assert_eq!(recipients, Recipients::Users(vec!["w".to_string()]));
    }

    #[test]
    fn everyone_but_creator_when_ungrouped() {
        let recipients = new_repository_recipients(&user("u"), None);
        assert!(!recipients.includes("u"));
        assert!(recipients.includes("anyone"));
    }

    #[test]
    fn notice_bus_without_listeners_is_a_failed_delivery() {
        let bus = NoticeBus::new(8);
        Notifier::ensure_notice_type(&bus, &repository_new_notice_type()).unwrap();
        let err = Notifier::send(&bus, REPOSITORY_NEW, Recipients::Users(Vec::new()), json!({}));
        assert!(matches!(err, Err(NotifyError::Delivery { .. })));
    }

    #[test]
    fn notice_bus_rejects_unregistered_types() {
        let bus = NoticeBus::new(8);
        let _rx = bus.subscribe();
        let err = Notifier::send(&bus, "unknown", Recipients::Users(Vec::new()), json!({}));
        assert!(matches!(err, Err(NotifyError::Delivery { .. })));
    }

    #[test]
    fn notice_bus_delivers_to_subscribers() {
        let bus = NoticeBus::new(8);
        let mut rx = bus.subscribe();
        Notifier::ensure_notice_type(&bus, &repository_new_notice_type()).unwrap();
        Notifier::send(
            &bus,
            REPOSITORY_NEW,
            Recipients::Users(vec!["w".to_string()]),
            json!({"slug": "widgets"}),
        )
        .unwrap();
        let notice = rx.try_recv().unwrap();
        assert_eq!(notice.label, REPOSITORY_NEW);
        assert!(notice.recipients.includes("w"));
    }
}
