//! Detectors for sprite sheet layout parameters.

pub mod background;
pub mod coordinator;
pub mod frame;
pub mod margin;
pub mod spacing;

pub use background::{detect_background_color, detect_color_key, BackgroundDetector, ColorKey};
pub use coordinator::{
    comprehensive_auto_detect, cross_validate, validate_layout, ConfidenceLevel,
    DetectionCoordinator, DetectionResult, DetectionStatus,
};
pub use frame::{
    detect_content_based, detect_frame_size, detect_rectangular_frames, FrameDetector, FrameSize,
    FrameStrategy,
};
pub use margin::{detect_margins, MarginDetector, Margins, RawMargins};
pub use spacing::{detect_spacing, Spacing, SpacingConfidence, SpacingDetector};
