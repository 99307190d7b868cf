//! Domain entities - the core business objects.

mod media;
mod post;
mod session;
mod user;
mod views;

pub use media::{MediaKind, MediaUpload};
pub use post::{Comment, MediaRef, Post};
pub use session::{Identity, Session};
pub use user::User;
pub use views::{AuthorSummary, CommentView, LikeOutcome, PostDetail, PostSummary};
