mod input;
mod overlay_session;
mod ticker;

pub use input::{PlaybackCommand, SessionInput};
pub use overlay_session::{OverlaySession, SessionReport};
pub use ticker::RedrawTicker;
