pub mod config;
pub mod error;
pub mod models;
pub mod publisher;
pub mod reconciler;
pub mod resolver;

#[cfg(test)]
mod testing;
