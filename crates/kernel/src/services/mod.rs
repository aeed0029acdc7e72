//! Services layered over the models.

pub mod category;

pub use category::CategoryService;
