pub mod basic_auth;
pub mod discover;
pub mod dispatch;
pub mod form;
pub mod timing;
pub mod types;

#[cfg(test)]
pub mod stub;

pub use basic_auth::BasicAuthSubmitter;
pub use discover::discover_form;
pub use dispatch::HttpSettings;
pub use form::FormSubmitter;
pub use types::{Submitter, SubmitterKind};
