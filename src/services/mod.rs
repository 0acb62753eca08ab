pub mod account_service;
pub mod grant_service;
pub mod identity_service;
pub mod opportunity_service;
pub mod tenant_service;
