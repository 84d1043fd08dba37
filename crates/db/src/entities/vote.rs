//! Vote entity (one signed vote from a voter onto a votable record).

use ballot_common::{AppError, AppResult};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Direction of a vote.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum VoteSign {
    /// +1
    #[sea_orm(num_value = 1)]
    Up,
    /// -1
    #[sea_orm(num_value = -1)]
    Down,
}

impl VoteSign {
    /// The integer stored in the `sign` column.
    #[must_use]
    pub const fn value(self) -> i32 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

impl TryFrom<i32> for VoteSign {
    type Error = AppError;

    fn try_from(value: i32) -> AppResult<Self> {
        match value {
            1 => Ok(Self::Up),
            -1 => Ok(Self::Down),
            other => Err(AppError::Validation(format!(
                "vote sign must be 1 or -1, got {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "votes")]
pub struct Model {
    /// Type tag of the voter (e.g. "user")
    #[sea_orm(primary_key, auto_increment = false)]
    pub voter_type: String,

    #[sea_orm(primary_key, auto_increment = false)]
    pub voter_id: String,

    /// Type tag of the record being voted on (e.g. "post")
    #[sea_orm(primary_key, auto_increment = false)]
    pub votable_type: String,

    #[sea_orm(primary_key, auto_increment = false)]
    pub votable_id: String,

    pub sign: VoteSign,

    pub created_at: DateTimeWithTimeZone,

    /// Refreshed whenever the sign changes
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
