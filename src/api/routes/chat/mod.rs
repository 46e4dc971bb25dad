pub mod public;
mod reply;
mod router;
pub use router::router;
