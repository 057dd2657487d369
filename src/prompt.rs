/// The instruction sent alongside every label photo.
///
/// Loaded from `prompt.txt` at compile time using `include_str!`, so the
/// wording can be edited without dealing with Rust string syntax.
///
/// The prompt tells the model to separate an ingredients list from a
/// nutrition-facts table and to answer with exactly one of the two JSON
/// shapes understood by [`crate::extract::extract_report`].
pub const LABEL_ANALYSIS_PROMPT: &str = include_str!("prompt.txt");
