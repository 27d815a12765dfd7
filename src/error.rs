use miette::Diagnostic;
use thiserror::Error;

/// Main error type for pxdetect operations
#[derive(Error, Diagnostic, Debug)]
pub enum DetectError {
    #[error("No sprite sheet provided")]
    #[diagnostic(code(pxdetect::no_image))]
    NoImage,

    #[error("Invalid frame size {width}x{height}: {message}")]
    #[diagnostic(code(pxdetect::frame_size))]
    InvalidFrameSize {
        width: u32,
        height: u32,
        message: String,
    },

    #[error("No content detected: {message}")]
    #[diagnostic(
        code(pxdetect::no_content),
        help("The sheet appears fully transparent or no candidate grid tiles it")
    )]
    NoContentDetected { message: String },

    #[error("Insufficient components: found {found}")]
    #[diagnostic(code(pxdetect::components))]
    InsufficientComponents { found: usize },

    #[error("Frame count {frames} outside [{min}, {max}]")]
    #[diagnostic(code(pxdetect::out_of_range))]
    OutOfRange { frames: u32, min: u32, max: u32 },

    #[error("IO error: {0}")]
    #[diagnostic(code(pxdetect::io))]
    IoError(#[from] std::io::Error),

    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(pxdetect::io))]
    Io {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Parse error: {message}")]
    #[diagnostic(code(pxdetect::parse))]
    Parse {
        message: String,
        #[help]
        help: Option<String>,
    },
}

impl DetectError {
    pub(crate) fn frame_size(width: u32, height: u32, message: impl Into<String>) -> Self {
        Self::InvalidFrameSize {
            width,
            height,
            message: message.into(),
        }
    }

    pub(crate) fn no_content(message: impl Into<String>) -> Self {
        Self::NoContentDetected {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DetectError>;
