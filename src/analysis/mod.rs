pub mod aggregate;
pub mod regression;
pub mod trends;
