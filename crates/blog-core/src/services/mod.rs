//! Services - one request-scoped operation per method.
//!
//! Each operation checks the session, validates input, applies a single
//! change through a port, and returns a shaped result.

mod accounts;
mod media;
mod posts;
mod session;

pub use accounts::{
    AccountService, AccountSettings, ProfileUpdate, Registration, normalize_email,
    normalize_username,
};
pub use media::MediaService;
pub use posts::{PostDraft, PostService};
pub use session::SessionAuthority;
