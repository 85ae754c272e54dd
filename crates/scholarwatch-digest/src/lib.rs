//! scholarwatch-digest: Turning a `DailyDigest` into an email.
//! - HTML rendering (minijinja template, Markdown review)
//! - SMTP delivery

pub mod authors;
pub mod mailer;
pub mod markup;
pub mod render;

pub use authors::format_authors;
pub use mailer::{DigestMailer, SmtpMailer};
pub use render::DigestRenderer;
