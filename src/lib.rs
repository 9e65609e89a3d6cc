pub mod collection;
pub mod runner;
pub mod store;
pub mod vars;
