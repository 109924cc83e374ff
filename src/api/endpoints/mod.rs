//! Route handlers, one module per resource.

pub mod analysis;
pub mod health;
pub mod images;
pub mod page;
pub mod report;
pub mod results;
