pub mod errors;
pub mod db;
pub mod module;
