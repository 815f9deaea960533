// Core infrastructure modules
pub mod core;

// Console front end
pub mod config;
pub mod repl;
pub mod table_printer;

#[cfg(test)]
mod test_utils;
