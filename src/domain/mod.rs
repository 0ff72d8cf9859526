//! Domain model of the purchase-and-enrollment workflow: value objects,
//! catalog and account entities, purchase artifacts, and the collaborator
//! ports the application layer is wired against.

pub mod account;
pub mod course;
pub mod ports;
pub mod purchase;
