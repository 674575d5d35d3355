pub mod render;
pub mod smtp;

pub use render::{render_digest_html, subject_line};
pub use smtp::{EmailDelivery, SmtpConfig};
