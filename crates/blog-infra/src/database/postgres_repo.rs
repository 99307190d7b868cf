//! PostgreSQL repository implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::{Set, Unchanged};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    Statement,
};
use uuid::Uuid;

use blog_core::domain::{Comment, LikeOutcome, Post, User};
use blog_core::error::RepoError;
use blog_core::ports::{PostRepository, UserRepository};

use super::entity::post::{self, Entity as PostEntity, LikedBy, StoredComment};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};
use crate::redact::mask_email;

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

impl PostgresUserRepository {
    async fn find_one_by(
        &self,
        filter: sea_orm::sea_query::SimpleExpr,
    ) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find()
            .filter(filter)
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");
        self.find_one_by(user::Column::Email.eq(email)).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        self.find_one_by(user::Column::Username.eq(username)).await
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let result = UserEntity::find()
            .filter(user::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, RepoError> {
        self.find_one_by(user::Column::ResetToken.eq(token)).await
    }

    async fn consume_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
        password_hash: &str,
    ) -> Result<bool, RepoError> {
        let now = DateTimeWithTimeZone::from(now);
        let result = UserEntity::update_many()
            .col_expr(user::Column::PasswordHash, Expr::value(password_hash))
            .col_expr(user::Column::ResetToken, Expr::value(Option::<String>::None))
            .col_expr(
                user::Column::ResetTokenExpiry,
                Expr::value(Option::<DateTimeWithTimeZone>::None),
            )
            .col_expr(user::Column::UpdatedAt, Expr::value(now))
            .filter(user::Column::ResetToken.eq(token))
            .filter(user::Column::ResetTokenExpiry.gt(now))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected > 0)
    }

    async fn consume_verification_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, RepoError> {
        let updated = UserEntity::update_many()
            .col_expr(user::Column::EmailVerified, Expr::value(true))
            .col_expr(
                user::Column::VerificationToken,
                Expr::value(Option::<String>::None),
            )
            .col_expr(
                user::Column::UpdatedAt,
                Expr::value(DateTimeWithTimeZone::from(now)),
            )
            .filter(user::Column::VerificationToken.eq(token))
            .exec_with_returning(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(updated.into_iter().next().map(Into::into))
    }

    async fn clear_expired_reset_tokens(&self, now: DateTime<Utc>) -> Result<u64, RepoError> {
        let result = UserEntity::update_many()
            .col_expr(user::Column::ResetToken, Expr::value(Option::<String>::None))
            .col_expr(
                user::Column::ResetTokenExpiry,
                Expr::value(Option::<DateTimeWithTimeZone>::None),
            )
            .filter(user::Column::ResetTokenExpiry.lte(DateTimeWithTimeZone::from(now)))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected)
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn list_recent(&self) -> Result<Vec<Post>, RepoError> {
        let result = PostEntity::find()
            .order_by_desc(post::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Vec<Post>, RepoError> {
        let result = PostEntity::find()
            .filter(post::Column::UserId.eq(user_id))
            .order_by_desc(post::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn update_content(&self, post: Post) -> Result<Post, RepoError> {
        let edit = post::ActiveModel {
            id: Unchanged(post.id),
            title: Set(post.title),
            content: Set(post.content),
            media: Set(post.media.into()),
            updated_at: Set(post.updated_at.into()),
            ..Default::default()
        };
        let model = edit.update(&self.db).await.map_err(map_db_err)?;

        Ok(model.into())
    }

    async fn toggle_like(
        &self,
        post_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<LikeOutcome>, RepoError> {
        // Membership test and write in one statement; `-` also drops duplicates.
        let stmt = Statement::from_sql_and_values(
            self.db.get_database_backend(),
            r#"UPDATE "posts"
               SET "likes" = CASE WHEN "likes" @> $2 THEN "likes" - $3 ELSE "likes" || $2 END
               WHERE "id" = $1
               RETURNING "likes""#,
            [
                post_id.into(),
                serde_json::json!([user_id]).into(),
                user_id.to_string().into(),
            ],
        );

        let Some(row) = self.db.query_one(stmt).await.map_err(map_db_err)? else {
            return Ok(None);
        };
        let likes: LikedBy = row.try_get("", "likes").map_err(map_db_err)?;

        Ok(Some(LikeOutcome {
            likes_count: likes.0.len(),
            user_liked: likes.0.contains(&user_id),
        }))
    }

    async fn append_comment(&self, post_id: Uuid, comment: Comment) -> Result<(), RepoError> {
        let appended = serde_json::to_value([StoredComment::from(comment)])
            .map_err(|e| RepoError::Query(e.to_string()))?;
        let stmt = Statement::from_sql_and_values(
            self.db.get_database_backend(),
            r#"UPDATE "posts" SET "comments" = "comments" || $2 WHERE "id" = $1"#,
            [post_id.into(), appended.into()],
        );

        let result = self.db.execute(stmt).await.map_err(map_db_err)?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}
