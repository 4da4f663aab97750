use std::fmt;

/// Identity of one chat conversation (the Telegram chat id for the bot).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub i64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message delivered by a transport. `text` is `None` for stickers, photos
/// and anything else that is not plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub session: SessionId,
    pub text: Option<String>,
}

impl InboundMessage {
    pub fn text(session: SessionId, text: impl Into<String>) -> Self {
        Self {
            session,
            text: Some(text.into()),
        }
    }

    pub fn non_text(session: SessionId) -> Self {
        Self {
            session,
            text: None,
        }
    }
}

/// Fixed-choice keyboard offered alongside a reply. Rendering hint only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickReplyMenu {
    pub rows: Vec<Vec<String>>,
}

impl QuickReplyMenu {
    pub fn commands() -> Self {
        Self {
            rows: vec![
                vec!["new".to_owned(), "timein".to_owned(), "timeout".to_owned()],
                vec!["report".to_owned()],
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub menu: Option<QuickReplyMenu>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            menu: None,
        }
    }

    pub fn with_menu(text: impl Into<String>, menu: QuickReplyMenu) -> Self {
        Self {
            text: text.into(),
            menu: Some(menu),
        }
    }
}
