pub mod axes;
pub mod bounds;
