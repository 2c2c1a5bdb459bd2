//! DNS provider implementations

pub mod mock;
pub mod porkbun;
pub mod traits;

pub use mock::MockDnsProvider;
pub use porkbun::{PorkbunCredentials, PorkbunDnsProvider};
pub use traits::DnsPort;
