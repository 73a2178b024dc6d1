//! Business logic services.

#![allow(missing_docs)]

pub mod article;
pub mod comment;
pub mod email;
pub mod like;
pub mod recovery;
pub mod tags;
pub mod token;
pub mod user;
pub mod verification;

pub use article::{
    Article, ArticleBasic, ArticleInput, ArticleService, AuthorProfile, DraftDetail,
    DraftSummary, Paged, PostDetail, PostSummary, SeriesEntry,
};
pub use comment::{
    CommentService, CommentView, CreateCommentInput, CreateReplyInput, ModifyCommentInput,
    ModifyReplyInput, ReplyView,
};
pub use email::EmailService;
pub use like::{LikeService, LikeTarget};
pub use recovery::{RecoveryService, SendCodeInput, VerifyCodeInput};
pub use tags::{ReconcileReport, TagDiff, TagReconciler, normalize_tag, reconcile_tags};
pub use token::{Claims, TokenKind, TokenService};
pub use user::{
    LoginInput, LoginResponse, Profile, RefreshResponse, RegisterInput, UserInfo, UserService,
};
pub use verification::VerificationCodeCache;
