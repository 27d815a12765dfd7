mod detected;
mod layout;
mod rect;

pub use detected::Detected;
pub use layout::{FrameLayout, MAX_FRAME_SIZE, MAX_OFFSET, MAX_SPACING};
pub use rect::Rect;
