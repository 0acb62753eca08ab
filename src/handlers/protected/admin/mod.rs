pub mod grants;
pub mod identities;
