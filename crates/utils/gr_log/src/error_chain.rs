/// Format an error together with every error in its `source()` chain.
///
/// Use this when reporting an error to the user, especially an `anyhow::Error`,
/// whose `Display` only shows the outermost context.
pub fn format_error(error: impl AsRef<dyn std::error::Error>) -> String {
    format_error_ref(error.as_ref())
}

/// See [`format_error`].
pub fn format_error_ref(error: &dyn std::error::Error) -> String {
    // ": " matches anyhow's alternate (`{:#}`) formatting.
    let mut formatted = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        formatted.push_str(": ");
        formatted.push_str(&cause.to_string());
        source = cause.source();
    }
    formatted
}
