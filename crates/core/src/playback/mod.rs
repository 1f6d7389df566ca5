mod controller;
mod media;
mod simulated;

pub use controller::{PlaybackController, PlaybackState};
pub use media::{MediaElement, MediaEvent};
pub use simulated::{ClockPump, SimulatedMedia};
