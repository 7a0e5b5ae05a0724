pub mod appearance;
pub mod names;
