//! Post entity for SeaORM.
//!
//! The post is stored as one row. Media, likes and comments live in `jsonb`
//! columns so every mutation of the aggregate is a single-row write.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{FromJsonQueryResult, Set};
use serde::{Deserialize, Serialize};

use blog_core::domain::{Comment, MediaRef};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub media: MediaList,
    #[sea_orm(column_type = "JsonBinary")]
    pub likes: LikedBy,
    #[sea_orm(column_type = "JsonBinary")]
    pub comments: CommentList,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMedia {
    pub url: String,
    pub key: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct MediaList(pub Vec<StoredMedia>);

impl From<Vec<MediaRef>> for MediaList {
    fn from(media: Vec<MediaRef>) -> Self {
        Self(
            media
                .into_iter()
                .map(|m| StoredMedia {
                    url: m.url,
                    key: m.key,
                })
                .collect(),
        )
    }
}

/// Liker set, in like order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct LikedBy(pub Vec<Uuid>);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredComment {
    pub id: Uuid,
    pub content: String,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<Comment> for StoredComment {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id,
            content: c.content,
            author_id: c.author_id,
            created_at: c.created_at,
        }
    }
}

/// Embedded comments, in append order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct CommentList(pub Vec<StoredComment>);

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
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

/// Conversion from SeaORM Model to Domain Post.
impl From<Model> for blog_core::domain::Post {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            title: model.title,
            content: model.content,
            media: model
                .media
                .0
                .into_iter()
                .map(|m| MediaRef {
                    url: m.url,
                    key: m.key,
                })
                .collect(),
            likes: model.likes.0,
            comments: model
                .comments
                .0
                .into_iter()
                .map(|c| Comment {
                    id: c.id,
                    content: c.content,
                    author_id: c.author_id,
                    created_at: c.created_at,
                })
                .collect(),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

/// Conversion from Domain Post to SeaORM ActiveModel.
impl From<blog_core::domain::Post> for ActiveModel {
    fn from(post: blog_core::domain::Post) -> Self {
        Self {
            id: Set(post.id),
            user_id: Set(post.user_id),
            title: Set(post.title),
            content: Set(post.content),
            media: Set(post.media.into()),
            likes: Set(LikedBy(post.likes)),
            comments: Set(CommentList(
                post.comments.into_iter().map(StoredComment::from).collect(),
            )),
            created_at: Set(post.created_at.into()),
            updated_at: Set(post.updated_at.into()),
        }
    }
}
