//! Application layer: the payment workflows and the submission state machine.
//!
//! [`coordinator::PaymentCoordinator`] is the entry point. It keeps open
//! payments in a [`registry::PaymentRegistry`], builds transactions with
//! [`builder::TransactionBuilder`] and drives them to a terminal outcome with
//! [`submission::SubmissionCoordinator`].

pub mod builder;
pub mod coordinator;
pub mod registry;
pub mod submission;
