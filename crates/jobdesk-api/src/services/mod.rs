pub mod email;
pub mod notify;

pub use email::{EmailSender, NoopEmailSender, SmtpEmailSender};
