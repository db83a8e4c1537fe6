pub mod form;
pub mod row;
pub mod table;
pub mod vector;
