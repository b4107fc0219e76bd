use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Preprocessor error: {0}")]
    PreprocessError(String),

    #[error("Malformed syntax tree: {0}")]
    TreeError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CompileError>;

#[macro_export]
macro_rules! bail_parse {
    ($($arg:tt)*) => {
        return Err($crate::error::CompileError::ParseError(format!($($arg)*)))
    };
}

#[macro_export]
macro_rules! bail_preprocess {
    ($($arg:tt)*) => {
        return Err($crate::error::CompileError::PreprocessError(format!($($arg)*)))
    };
}

#[macro_export]
macro_rules! bail_tree {
    ($($arg:tt)*) => {
        return Err($crate::error::CompileError::TreeError(format!($($arg)*)))
    };
}
