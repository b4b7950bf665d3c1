//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod counter;
pub mod invoice;
pub mod kot;
pub mod order;

// Re-export specific types to avoid conflicts
pub use counter::{Column as CounterColumn, Entity as Counter, Model as CounterModel};
pub use invoice::{Column as InvoiceColumn, Entity as Invoice, Model as InvoiceModel};
pub use kot::{Column as KotColumn, Entity as Kot, Model as KotModel};
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel};
