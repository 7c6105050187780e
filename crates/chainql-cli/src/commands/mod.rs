pub mod analyze;
pub mod check;
pub mod loader;

#[cfg(test)]
mod loader_tests;
