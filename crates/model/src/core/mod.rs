pub mod data_type;
pub mod entity;
pub mod value;
