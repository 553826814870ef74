//! Route handlers, one module per resource.

pub mod carts;
pub mod health;
pub mod orders;
pub mod persons;
pub mod products;
