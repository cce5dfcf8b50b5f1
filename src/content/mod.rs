//! Content module - post models exchanged between the content source and the pages

mod post;

pub use post::{BodyFragment, ContentSection, Page, PostDetail, PostSummary};
