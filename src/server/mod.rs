mod account;
pub mod dto;
mod notes;
pub mod response;
mod router;
mod tags;
pub mod validation;

pub use router::{AppState, create_router};
