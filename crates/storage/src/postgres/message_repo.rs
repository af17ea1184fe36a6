//! Message table mapping.

use chrono::{DateTime, Utc};

use strider_core::error::{StorageError, StorageResult};
use strider_core::models::{Message, fields};

use super::collection::PgEntity;
use super::sql::Column;

impl PgEntity for Message {
    type Row = MessageRow;

    const TABLE: &'static str = "messages";

    const SELECT: &'static str = "id, sender, recipient, kind, content, sent_at";

    const COLUMNS: &'static [Column] = &[
        Column::scalar(fields::ID),
        Column::scalar(fields::SENDER),
        Column::scalar(fields::RECIPIENT),
        Column::scalar(fields::CONTENT),
        Column::scalar(fields::SENT_AT),
    ];

    fn from_row(row: MessageRow) -> StorageResult<Self> {
        row.into_message()
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(sqlx::FromRow)]
pub struct MessageRow {
    id: String,
    sender: String,
    recipient: String,
    kind: String,
    content: String,
    sent_at: DateTime<Utc>,
}

impl MessageRow {
    fn into_message(self) -> StorageResult<Message> {
        if self.kind.is_empty() {
            return Err(StorageError::SerializationError(format!(
                "message {} has an empty kind",
                self.id
            )));
        }

        Ok(Message {
            id: self.id,
            sender: self.sender,
            recipient: self.recipient,
            kind: self.kind,
            content: self.content,
            sent_at: self.sent_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test critique: erreurs incluent l'identifiant du message pour debug
    #[test]
    fn test_empty_kind_is_rejected() {
        let row = MessageRow {
            id: "m1".into(),
            sender: "ann".into(),
            recipient: "bob".into(),
            kind: String::new(),
            content: "hi".into(),
            sent_at: DateTime::<Utc>::UNIX_EPOCH,
        };
        let err = row.into_message().unwrap_err().to_string();
        assert!(err.contains("m1"));
    }
}
