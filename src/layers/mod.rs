pub mod manager;
pub mod marker;
