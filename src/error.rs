use thiserror::Error;

#[derive(Error, Debug)]
pub enum VocabularyError {
    #[error("{num_fields} fields on one line of vocabulary file: {line}")]
    InputFormat { num_fields: usize, line: String },

    #[error("invalid {field} on one line of vocabulary file: {line}")]
    InvalidField { field: &'static str, line: String },

    #[error("word `{0}' appears more than once in the vocabulary")]
    DuplicateWord(String),

    #[error("vocabulary requires equal-sized word and class lists, got {words} words and {classes} class ids")]
    SizeMismatch { words: usize, classes: usize },

    #[error("incompatible network state: {0}")]
    IncompatibleState(String),

    #[error("word {word_id} is already a member of class {class_id}")]
    DuplicateMember { class_id: usize, word_id: usize },

    #[error("word {word_id} is not a member of class {class_id}")]
    UnknownMember { class_id: usize, word_id: usize },

    #[error("unknown class id: {0}")]
    UnknownClass(usize),

    #[error("word {0} is not in the shortlist")]
    NotInShortlist(usize),

    #[error("inconsistent word classes: {0}")]
    InconsistentClasses(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unknown vocabulary format: {0}")]
    UnknownFormat(String),

    #[error("cannot overwrite `{key}': expected {expected}, found {found}")]
    ShapeMismatch {
        key: String,
        expected: String,
        found: String,
    },

    #[error("unigram probabilities have not been computed")]
    NoUnigramProbs,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, VocabularyError>;

impl From<bincode::Error> for VocabularyError {
    fn from(e: bincode::Error) -> Self {
        VocabularyError::Serialization(e.to_string())
    }
}

impl From<ndarray_npy::WriteNpyError> for VocabularyError {
    fn from(e: ndarray_npy::WriteNpyError) -> Self {
        VocabularyError::Serialization(e.to_string())
    }
}
