pub mod convert;
pub mod data_type;
pub mod hash;
pub mod temporal;
pub mod value;
