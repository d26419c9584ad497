//! Conversion pipelines: the chaptered fan-out/fan-in coordinator and the
//! whole-book single pass.

pub mod chapters;
pub mod outcome;
pub mod single;

pub use chapters::{ChapterPipeline, PipelineConfig};
pub use outcome::ConversionOutcome;
pub use single::convert_whole_book;
