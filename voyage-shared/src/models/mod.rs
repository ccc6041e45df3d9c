pub mod components;
pub mod fields;
