pub mod clock;
pub mod manager;
pub mod style;

pub use clock::{FrameClock, FrameHandle};
pub use manager::{OverlayManager, OverlayOptions, OverlaySettings, OverlayState, OverlayTask};
pub use style::{hex_to_rgba, Glow, OverlayStyle};
