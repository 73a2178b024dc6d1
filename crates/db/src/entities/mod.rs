//! Database entities.

#![allow(missing_docs)]

pub mod category;
pub mod comment;
pub mod draft;
pub mod draft_tag;
pub mod like;
pub mod post;
pub mod post_tag;
pub mod reply;
pub mod tag;
pub mod user;

pub use category::Entity as Category;
pub use comment::Entity as Comment;
pub use draft::Entity as Draft;
pub use draft_tag::Entity as DraftTag;
pub use like::Entity as Like;
pub use post::Entity as Post;
pub use post_tag::Entity as PostTag;
pub use reply::Entity as Reply;
pub use tag::Entity as Tag;
pub use user::Entity as User;
