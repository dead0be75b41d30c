use crate::MenuAction;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Warning,
}

/// A status message shown to the user, optionally offering an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub title: String,
    pub text: String,
    pub kind: MessageKind,
    pub action: Option<MenuAction>,
}

impl Message {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            title: crate::MENU_NAME.to_string(),
            text: text.into(),
            kind: MessageKind::Info,
            action: None,
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Warning,
            ..Self::info(text)
        }
    }

    #[must_use]
    pub fn with_action(mut self, action: MenuAction) -> Self {
        self.action = Some(action);
        self
    }
}

/// Host messaging UI.
pub trait Notifier: Send + Sync {
    fn show(&self, message: Message);
}

/// Writes messages to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show(&self, message: Message) {
        let action = message
            .action
            .map(|action| format!(" [action: {}]", action.label()))
            .unwrap_or_default();
        match message.kind {
            MessageKind::Info => log::info!("{}: {}{action}", message.title, message.text),
            MessageKind::Warning => log::warn!("{}: {}{action}", message.title, message.text),
        }
    }
}

/// Keeps every message; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<Message>>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<Message> {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn last(&self) -> Option<Message> {
        self.messages().pop()
    }
}

impl Notifier for RecordingNotifier {
    fn show(&self, message: Message) {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(message);
    }
}
