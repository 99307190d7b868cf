use chrono::Utc;
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use uuid::Uuid;

use blog_core::domain::{Comment, Post, User};
use blog_core::error::RepoError;
use blog_core::ports::{BaseRepository, PostRepository, UserRepository};

use crate::database::entity::post::{self, CommentList, LikedBy, MediaList, StoredComment};
use crate::database::entity::user;
use crate::database::postgres_repo::{PostgresPostRepository, PostgresUserRepository};

fn post_model(id: Uuid, user_id: Uuid, likes: Vec<Uuid>) -> post::Model {
    let now = Utc::now();
    post::Model {
        id,
        user_id,
        title: "Test Post".to_owned(),
        content: "Content".to_owned(),
        media: MediaList::default(),
        likes: LikedBy(likes),
        comments: CommentList(vec![StoredComment {
            id: Uuid::new_v4(),
            content: "First".to_owned(),
            author_id: user_id,
            created_at: now,
        }]),
        created_at: now.into(),
        updated_at: now.into(),
    }
}

fn user_model(id: Uuid, email: &str) -> user::Model {
    let now = Utc::now();
    user::Model {
        id,
        email: email.to_owned(),
        username: Some("alice".to_owned()),
        name: None,
        bio: None,
        image: None,
        password_hash: None,
        email_verified: false,
        verification_token: None,
        reset_token: None,
        reset_token_expiry: None,
        created_at: now.into(),
        updated_at: now.into(),
    }
}

#[tokio::test]
async fn test_find_post_by_id() {
    let post_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    let liker = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![post_model(post_id, user_id, vec![liker])]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let result: Option<Post> = repo.find_by_id(post_id).await.unwrap();

    let post = result.unwrap();
    assert_eq!(post.title, "Test Post");
    assert_eq!(post.id, post_id);
    assert_eq!(post.likes, vec![liker]);
    assert_eq!(post.comments.len(), 1);
    assert_eq!(post.comments[0].content, "First");
}

#[tokio::test]
async fn test_insert_post_returns_stored_row() {
    let user_id = Uuid::new_v4();
    let draft = Post::new(user_id, "Test Post".to_owned(), "Content".to_owned(), vec![]);
    let stored = post_model(draft.id, user_id, vec![]);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![stored]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let post = repo.insert(draft.clone()).await.unwrap();

    assert_eq!(post.id, draft.id);
    assert_eq!(post.user_id, user_id);
}

#[tokio::test]
async fn test_delete_missing_post_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let result = BaseRepository::<Post, Uuid>::delete(&repo, Uuid::new_v4()).await;

    assert!(matches!(result, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn test_find_user_by_email() {
    let user_id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![user_model(user_id, "alice@example.com")]])
        .into_connection();

    let repo = PostgresUserRepository::new(db);
    let user: User = repo
        .find_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(user.id, user_id);
    assert_eq!(user.username.as_deref(), Some("alice"));
}

#[tokio::test]
async fn test_find_by_ids_skips_query_when_empty() {
    // No results are queued, so any query would fail.
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

    let repo = PostgresUserRepository::new(db);
    let users = repo.find_by_ids(&[]).await.unwrap();

    assert!(users.is_empty());
}

#[tokio::test]
async fn test_clear_expired_reset_tokens_reports_rows() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 0,
            rows_affected: 3,
        }])
        .into_connection();

    let repo = PostgresUserRepository::new(db);
    let cleared = repo.clear_expired_reset_tokens(Utc::now()).await.unwrap();

    assert_eq!(cleared, 3);
}

#[tokio::test]
async fn test_list_recent_posts() {
    let author = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![
            post_model(Uuid::new_v4(), author, vec![]),
            post_model(Uuid::new_v4(), author, vec![author]),
        ]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let posts = repo.list_recent().await.unwrap();

    assert_eq!(posts.len(), 2);
    assert_eq!(posts[1].likes, vec![author]);
}

#[tokio::test]
async fn test_toggle_like_is_single_statement() {
    let post_id = Uuid::new_v4();
    let author = Uuid::new_v4();
    let liker = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![post_model(post_id, author, vec![author, liker])]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let outcome = repo.toggle_like(post_id, liker).await.unwrap().unwrap();

    assert_eq!(outcome.likes_count, 2);
    assert!(outcome.user_liked);

    let log = repo.db.into_transaction_log();
    assert_eq!(log.len(), 1);
    let sql = format!("{:?}", log[0]).replace('\\', "");
    assert!(sql.contains("UPDATE"));
    assert!(sql.contains("@>"));
    assert!(sql.contains("RETURNING"));
}

#[tokio::test]
async fn test_toggle_like_on_missing_post() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![Vec::<post::Model>::new()])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let outcome = repo.toggle_like(Uuid::new_v4(), Uuid::new_v4()).await.unwrap();

    assert!(outcome.is_none());
}

#[tokio::test]
async fn test_append_comment_concatenates_jsonb() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            },
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            },
        ])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let comment = Comment::new(Uuid::new_v4(), "Nice".to_owned());

    repo.append_comment(Uuid::new_v4(), comment.clone()).await.unwrap();
    let missing = repo.append_comment(Uuid::new_v4(), comment).await;
    assert!(matches!(missing, Err(RepoError::NotFound)));

    let log = repo.db.into_transaction_log();
    let sql = format!("{:?}", log[0]).replace('\\', "");
    assert!(sql.contains(r#""comments" || $2"#));
    assert!(sql.contains("Nice"));
}

#[tokio::test]
async fn test_update_content_leaves_likes_and_comments_out() {
    let post_id = Uuid::new_v4();
    let author = Uuid::new_v4();
    let liker = Uuid::new_v4();
    let stored = post_model(post_id, author, vec![liker]);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![stored]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let mut edit = Post::new(author, "Edited".to_owned(), "Body".to_owned(), vec![]);
    edit.id = post_id;

    let post = repo.update_content(edit).await.unwrap();

    // The stored row's likes and comments come back untouched.
    assert_eq!(post.likes, vec![liker]);
    assert_eq!(post.comments.len(), 1);

    let log = repo.db.into_transaction_log();
    let sql = format!("{:?}", log[0]).replace('\\', "");
    assert!(sql.contains(r#""title""#));
    assert!(!sql.contains(r#""likes" ="#));
    assert!(!sql.contains(r#""comments" ="#));
}

#[tokio::test]
async fn test_consume_reset_token_reports_whether_a_row_changed() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            },
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            },
        ])
        .into_connection();

    let repo = PostgresUserRepository::new(db);
    let now = Utc::now();

    assert!(repo.consume_reset_token("tok", now, "hash").await.unwrap());
    assert!(!repo.consume_reset_token("tok", now, "hash").await.unwrap());

    let log = repo.db.into_transaction_log();
    let sql = format!("{:?}", log[0]).replace('\\', "");
    assert!(sql.contains(r#""reset_token" = $"#));
    assert!(sql.contains(r#""reset_token_expiry" > $"#));
}

#[tokio::test]
async fn test_consume_verification_token_returns_updated_user() {
    let id = Uuid::new_v4();
    let mut verified = user_model(id, "alice@example.com");
    verified.email_verified = true;

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![verified], vec![]])
        .into_connection();

    let repo = PostgresUserRepository::new(db);
    let now = Utc::now();

    let user: User = repo
        .consume_verification_token("tok", now)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.id, id);
    assert!(user.email_verified);

    assert!(repo.consume_verification_token("tok", now).await.unwrap().is_none());
}
