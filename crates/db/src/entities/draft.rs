//! Draft entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Unpublished scratch copy of an article.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "draft")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub title: String,

    pub excerpt: String,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    pub cover: String,

    #[sea_orm(indexed)]
    pub user_id: String,

    #[sea_orm(nullable, indexed)]
    pub category_id: Option<i64>,

    /// Published post this draft edits, if any
    #[sea_orm(nullable, unique)]
    pub post_id: Option<i64>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
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
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_delete = "SetNull"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::post::Entity",
        from = "Column::PostId",
        to = "super::post::Column::Id",
        on_delete = "SetNull"
    )]
    Post,
    #[sea_orm(has_many = "super::draft_tag::Entity")]
    DraftTag,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        super::draft_tag::Relation::Tag.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::draft_tag::Relation::Draft.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
