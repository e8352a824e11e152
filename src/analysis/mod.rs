/// SOW analysis - Gateway

mod classifier;
mod matcher;

pub use classifier::{classify, classify_with, preview, DocumentSummary, SowAnalysis, SowGroup};
pub use matcher::{TitleMatch, TitleMatcher};
