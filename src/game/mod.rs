pub mod bot;
pub mod constants;
pub mod engine;
pub mod levels;
pub mod room;
pub mod spawn;
pub mod types;
