pub mod aggregate;
pub mod csv;
