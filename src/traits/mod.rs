pub mod detector;
pub mod dispatcher;
pub mod linker;

pub use detector::FeatureDetector;
pub use dispatcher::Dispatcher;
pub use linker::{FrameStream, LinkedStream, Linker};
