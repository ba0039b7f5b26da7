// Keychord State Layer
// Transient key state tracking

mod keystate;

pub use keystate::{KeyState, STUCK_KEY_TIMEOUT_MS};
