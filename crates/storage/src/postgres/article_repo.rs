//! Article table mapping. Comments live in the same table with a parent.

use chrono::{DateTime, Utc};

use strider_core::error::StorageResult;
use strider_core::models::{Article, fields};

use super::collection::PgEntity;
use super::sql::Column;

impl PgEntity for Article {
    type Row = ArticleRow;

    const TABLE: &'static str = "articles";

    const SELECT: &'static str = "id, author, parent, tags, content, pub_time";

    const COLUMNS: &'static [Column] = &[
        Column::scalar(fields::ID),
        Column::scalar(fields::AUTHOR),
        Column::scalar(fields::PARENT),
        Column::text_array(fields::TAGS),
        Column::scalar(fields::CONTENT),
        Column::scalar(fields::PUB_TIME),
    ];

    fn from_row(row: ArticleRow) -> StorageResult<Self> {
        Ok(row.into_article())
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(sqlx::FromRow)]
pub struct ArticleRow {
    id: String,
    author: String,
    parent: Option<String>,
    tags: Vec<String>,
    content: String,
    pub_time: DateTime<Utc>,
}

impl ArticleRow {
    fn into_article(self) -> Article {
        Article {
            id: self.id,
            author: self.author,
            parent: self.parent,
            tags: self.tags,
            content: self.content,
            pub_time: self.pub_time,
        }
    }
}
