pub mod table;
pub mod view;
