//! Domain types, the ledger error classifier, and the ports the application
//! layer talks through.

pub mod classifier;
pub mod payment;
pub mod ports;
pub mod transaction;
pub mod wallet;
