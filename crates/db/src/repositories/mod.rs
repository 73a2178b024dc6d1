//! Repositories over the blog tables.
//!
//! Every repository holds the pooled connection. Operations the publish
//! workflow runs inside a transaction also come in a `*_with` form that
//! takes any [`sea_orm::ConnectionTrait`].

pub mod category;
pub mod comment;
pub mod draft;
pub mod like;
pub mod post;
pub mod reply;
pub mod tag;
pub mod user;

pub use category::CategoryRepository;
pub use comment::CommentRepository;
pub use draft::DraftRepository;
pub use like::LikeRepository;
pub use post::PostRepository;
pub use reply::ReplyRepository;
pub use tag::{TagRepository, TagTarget};
pub use user::UserRepository;
