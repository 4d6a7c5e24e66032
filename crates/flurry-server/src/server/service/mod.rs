pub mod handler;

pub use handler::{AppState, DecodedId, router};
