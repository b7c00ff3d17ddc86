//! # Utility Functions Module
//!
//! Small helpers that reduce boilerplate when building external tool commands.

/// Builds a `Vec<String>` from heterogeneous `ToString` values.
///
/// Handy for ffmpeg/ffprobe argument lists that mix literals and numbers.
///
/// # Example
/// ```rust
/// use reserve_shrink::args;
///
/// let rate = 655;
/// let args = args!["-b:v", format!("{}k", rate), "-c:a", "aac"];
/// assert_eq!(args[1], "655k");
/// ```
#[macro_export]
macro_rules! args {
    [$($item:expr),* $(,)?] => {
        vec![$(::std::string::ToString::to_string(&$item)),*]
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_args_macro_string_literals() {
        let result = args!["-v", "error"];
        assert_eq!(result, vec!["-v".to_string(), "error".to_string()]);
    }

    #[test]
    fn test_args_macro_mixed_types() {
        let timeout = 60;
        let result = args!["-timeout", timeout, "-nostdin",];
        assert_eq!(result, vec!["-timeout".to_string(), "60".to_string(), "-nostdin".to_string()]);
    }

    #[test]
    fn test_args_macro_empty() {
        let result: Vec<String> = args![];
        assert!(result.is_empty());
    }
}
