//! Account table mapping.

use chrono::{DateTime, Utc};

use strider_core::error::StorageResult;
use strider_core::models::{Account, fields};

use super::collection::PgEntity;
use super::sql::Column;

impl PgEntity for Account {
    type Row = AccountRow;

    const TABLE: &'static str = "accounts";

    const SELECT: &'static str = "id, nickname, reg_time, last_login, score, birth, gender, \
                                  ban_time, phone, about, hobby";

    const COLUMNS: &'static [Column] = &[
        Column::scalar(fields::ID),
        Column::scalar(fields::NICKNAME),
        Column::scalar(fields::REG_TIME),
        Column::scalar(fields::LAST_LOGIN),
        Column::scalar(fields::SCORE),
        Column::scalar(fields::BIRTH),
        Column::scalar(fields::GENDER),
        Column::scalar(fields::BAN_TIME),
        Column::scalar(fields::PHONE),
        Column::scalar(fields::ABOUT),
        Column::scalar(fields::HOBBY),
    ];

    fn from_row(row: AccountRow) -> StorageResult<Self> {
        Ok(row.into_account())
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(sqlx::FromRow)]
pub struct AccountRow {
    id: String,
    nickname: String,
    reg_time: DateTime<Utc>,
    last_login: DateTime<Utc>,
    score: i64,
    birth: Option<i64>,
    gender: Option<String>,
    ban_time: i64,
    phone: Option<String>,
    about: Option<String>,
    hobby: Option<String>,
}

impl AccountRow {
    fn into_account(self) -> Account {
        Account {
            id: self.id,
            nickname: self.nickname,
            reg_time: self.reg_time,
            last_login: self.last_login,
            score: self.score,
            birth: self.birth,
            gender: self.gender,
            ban_time: self.ban_time,
            phone: self.phone,
            about: self.about,
            hobby: self.hobby,
        }
    }
}
