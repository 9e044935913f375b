pub mod design;
pub mod garment;
pub mod image;
pub mod quote;
