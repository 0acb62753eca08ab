pub mod account;
pub mod grant;
pub mod identity;
pub mod opportunity;
pub mod tenant;

pub use account::Account;
pub use grant::PermissionGrant;
pub use identity::Identity;
pub use opportunity::Opportunity;
pub use tenant::Tenant;
