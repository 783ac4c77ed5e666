//! Turns the user's free-form URL text into the candidate list.

/// Splits on newlines, cuts each line at the first `#`, trims it and drops
/// blanks plus `#`/`//` comment lines. Order and duplicates are kept, so a
/// URL listed twice is drawn twice as often.
pub fn parse(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with("//"))
        .map(str::to_string)
        .collect()
}
