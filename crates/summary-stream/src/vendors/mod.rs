//! Transport integrations implementing [`crate::upload::Uploader`].
pub mod http;
