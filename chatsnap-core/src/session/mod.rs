//! Capture session lifecycle

mod capture;
mod state;

pub use capture::CaptureSession;
pub use state::SessionState;
