//! Core business logic - framework-agnostic purchase and order workflow.
//!
//! Everything here takes a database handle (or a [`uow::UnitOfWork`]) and
//! returns [`crate::errors::Result`]; the HTTP layer only decodes requests and
//! maps errors.

pub mod cart;
pub mod cart_item;
pub mod category;
pub mod order;
pub mod person;
pub mod product;
pub mod status;
pub mod stock;
pub mod uow;
