pub mod accounts;
pub mod catalog;
pub mod error;
pub mod ledger;
pub mod locks;
pub mod ports;
pub mod repo;
pub mod session;
pub mod validation;
