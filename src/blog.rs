//! The reader-facing blog: posts listed in a manifest, plus the per-reader
//! state (views, comments, reactions) and admin tooling kept in a
//! [`ClientStore`](crate::store::ClientStore).

pub(crate) mod admin;
pub(crate) mod engagement;
pub(crate) mod listing;
pub(crate) mod render;
pub(crate) mod source;
