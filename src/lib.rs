mod config;
mod counts;
mod error;
mod format;
mod pipeline;
mod state;
mod vocabulary;
mod wordclass;
pub mod matrixfunctions;

pub use config::{files_handling, Config, VocabParams};
pub use counts::WordCounts;
pub use error::{Result, VocabularyError};
pub use format::{ClassIdRemap, VocabularyFormat};
pub use pipeline::Pipeline;
pub use state::{Dataset, Group, NetworkState};
pub use vocabulary::{Vocabulary, SENTENCE_END, SENTENCE_START, UNKNOWN_WORD};
pub use wordclass::WordClass;
