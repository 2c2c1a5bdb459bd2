//! Email-delivery provider implementations

pub mod mailgun;
pub mod mock;
pub mod traits;

pub use mailgun::{MailgunCredentials, MailgunProvider};
pub use mock::MockEmailDeliveryProvider;
pub use traits::EmailDeliveryPort;
