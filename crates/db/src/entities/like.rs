//! Like entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// `target_type` value for likes on comments.
pub const TARGET_COMMENT: &str = "comment";
/// `target_type` value for likes on replies.
pub const TARGET_REPLY: &str = "reply";

/// A user's like on a comment or reply.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "like")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(indexed)]
    pub user_id: String,

    /// "comment" or "reply"
    pub target_type: String,

    pub target_id: i64,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
