use crate::errors::PipelineError;
use crate::features::FrameFeatures;
use crate::linking::LinkedFrame;

/// Lazily produced per-frame point sets, in strictly increasing frame order.
pub type FrameStream<'a> = Box<dyn Iterator<Item = Result<FrameFeatures, PipelineError>> + 'a>;

/// Lazily produced linked frames, one per input frame.
pub type LinkedStream<'a> = Box<dyn Iterator<Item = Result<LinkedFrame, PipelineError>> + 'a>;

/// Assigns persistent track identities across frames.
///
/// Implementations must pull frames one at a time, keep at most `memory`
/// frames of lookback, and yield exactly one [`LinkedFrame`] per input frame
/// with the same frame number and the same number of points. Errors from the
/// input stream are passed through unchanged.
pub trait Linker: Send + Sync {
    fn link<'a>(&'a self, frames: FrameStream<'a>, search_range: f64, memory: u32) -> LinkedStream<'a>;

    fn name(&self) -> &'static str;
}
