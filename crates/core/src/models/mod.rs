//! Domain models served by the paginated listings.
//!
//! These models are storage-agnostic. Each implements [`Entity`] so the
//! pagination engine can read its identifier and sort fields by name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ports::{Entity, Value};

/// Field names shared by filters, sort tables and storage adapters.
pub mod fields {
    pub const ID: &str = crate::ports::ID_FIELD;

    pub const NICKNAME: &str = "nickname";
    pub const REG_TIME: &str = "reg_time";
    pub const LAST_LOGIN: &str = "last_login";
    pub const SCORE: &str = "score";
    pub const BIRTH: &str = "birth";
    pub const GENDER: &str = "gender";
    pub const BAN_TIME: &str = "ban_time";
    pub const PHONE: &str = "phone";
    pub const ABOUT: &str = "about";
    pub const HOBBY: &str = "hobby";

    pub const AUTHOR: &str = "author";
    pub const PARENT: &str = "parent";
    pub const TAGS: &str = "tags";
    pub const CONTENT: &str = "content";
    pub const PUB_TIME: &str = "pub_time";

    pub const SENDER: &str = "sender";
    pub const RECIPIENT: &str = "recipient";
    pub const SENT_AT: &str = "sent_at";
}

// =============================================================================
// Accounts
// =============================================================================

/// Registered user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// User id chosen at registration.
    pub id: String,
    pub nickname: String,
    /// Registration time. The Unix epoch marks a placeholder account that
    /// never completed registration.
    pub reg_time: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
    /// Accumulated activity score.
    pub score: i64,
    /// Birth date as Unix seconds, `None` when unknown.
    pub birth: Option<i64>,
    /// Free-form gender marker (`"f"`, `"female"`, `"m"`, `"male"`, ...).
    pub gender: Option<String>,
    /// Ban marker: 0 for normal, positive for a timed lock, negative for a
    /// permanent ban.
    pub ban_time: i64,
    pub phone: Option<String>,
    pub about: Option<String>,
    pub hobby: Option<String>,
}

impl Entity for Account {
    const COLLECTION: &'static str = "accounts";

    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<Value> {
        let value = match name {
            fields::ID => self.id.as_str().into(),
            fields::NICKNAME => self.nickname.as_str().into(),
            fields::REG_TIME => self.reg_time.into(),
            fields::LAST_LOGIN => self.last_login.into(),
            fields::SCORE => self.score.into(),
            fields::BIRTH => self.birth.into(),
            fields::GENDER => self.gender.clone().into(),
            fields::BAN_TIME => self.ban_time.into(),
            fields::PHONE => self.phone.clone().into(),
            fields::ABOUT => self.about.clone().into(),
            fields::HOBBY => self.hobby.clone().into(),
            _ => return None,
        };
        Some(value)
    }
}

// =============================================================================
// Articles
// =============================================================================

/// Timeline post. Comments are articles with a parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    /// Account id of the author.
    pub author: String,
    /// Article this one comments on, `None` for top-level posts.
    pub parent: Option<String>,
    pub tags: Vec<String>,
    pub content: String,
    pub pub_time: DateTime<Utc>,
}

impl Entity for Article {
    const COLLECTION: &'static str = "articles";

    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<Value> {
        let value = match name {
            fields::ID => self.id.as_str().into(),
            fields::AUTHOR => self.author.as_str().into(),
            fields::PARENT => self.parent.clone().into(),
            fields::TAGS => Value::List(self.tags.iter().map(|t| t.as_str().into()).collect()),
            fields::CONTENT => self.content.as_str().into(),
            fields::PUB_TIME => self.pub_time.into(),
            _ => return None,
        };
        Some(value)
    }
}

// =============================================================================
// Messages
// =============================================================================

/// Direct chat message between two accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender: String,
    pub recipient: String,
    /// Body kind (`"text"`, `"image"`, ...).
    pub kind: String,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

impl Entity for Message {
    const COLLECTION: &'static str = "messages";

    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<Value> {
        let value = match name {
            fields::ID => self.id.as_str().into(),
            fields::SENDER => self.sender.as_str().into(),
            fields::RECIPIENT => self.recipient.as_str().into(),
            fields::CONTENT => self.content.as_str().into(),
            fields::SENT_AT => self.sent_at.into(),
            _ => return None,
        };
        Some(value)
    }
}

// =============================================================================
// Tests
// =============================================================================
