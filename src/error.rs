use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum ScaleError {
    NotFound(PathBuf),
    Format(String),
    Index { index: usize, count: usize },
    ShapeMismatch { index: usize, expected: usize, actual: usize },
    NoValidData,
    Io(std::io::Error),
    Report(Box<serde_json::Error>),
    Config(String),
    Other(String),
}

impl ScaleError {
    /// Errors that end the whole run rather than a single file.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScaleError::NoValidData | ScaleError::Config(_))
    }
}

impl fmt::Display for ScaleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaleError::NotFound(p) => write!(f, "Not found: {}", p.display()),
            ScaleError::Format(e) => write!(f, "Format error: {}", e),
            ScaleError::Index { index, count } => {
                write!(f, "Index error: trace {} out of range (file has {})", index, count)
            }
            ScaleError::ShapeMismatch { index, expected, actual } => write!(
                f,
                "Shape mismatch: trace {} holds {} samples, got {}",
                index, expected, actual
            ),
            ScaleError::NoValidData => write!(f, "No valid sample data found in any input file"),
            ScaleError::Io(e) => write!(f, "IO error: {}", e),
            ScaleError::Report(e) => write!(f, "Report error: {}", e),
            ScaleError::Config(e) => write!(f, "Config error: {}", e),
            ScaleError::Other(e) => write!(f, "Error: {}", e),
        }
    }
}

impl std::error::Error for ScaleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScaleError::Io(e) => Some(e),
            ScaleError::Report(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ScaleError {
    fn from(err: std::io::Error) -> Self {
        ScaleError::Io(err)
    }
}

impl From<serde_json::Error> for ScaleError {
    fn from(err: serde_json::Error) -> Self {
        ScaleError::Report(Box::new(err))
    }
}

impl From<String> for ScaleError {
    fn from(err: String) -> Self {
        ScaleError::Other(err)
    }
}

impl From<&str> for ScaleError {
    fn from(err: &str) -> Self {
        ScaleError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_dataset_level_errors_are_fatal() {
        assert!(ScaleError::NoValidData.is_fatal());
        assert!(ScaleError::Config("bad".into()).is_fatal());
        assert!(!ScaleError::Format("bad header".into()).is_fatal());
        assert!(!ScaleError::NotFound(PathBuf::from("/nope")).is_fatal());
        assert!(!ScaleError::Index { index: 3, count: 2 }.is_fatal());
    }

    #[test]
    fn test_display_mentions_details() {
        let err = ScaleError::ShapeMismatch { index: 4, expected: 10, actual: 9 };
        let text = err.to_string();
        assert!(text.contains("trace 4"));
        assert!(text.contains("10"));
        assert!(text.contains("9"));
    }
}
