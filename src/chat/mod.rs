mod session;
mod store;
mod turn;

pub use session::{ChatSession, Transcript};
pub use store::{SessionHandle, SessionStore};
pub use turn::{Reply, TurnOutcome};
