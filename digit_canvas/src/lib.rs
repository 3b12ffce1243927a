pub mod canvas;
pub mod data;
pub mod error;
pub mod inference;
pub mod model;
pub mod panel;
pub mod session;
pub mod weights;

#[cfg(test)]
mod testing;
