use std::error::Error;
use std::fmt::{Display, Formatter};

pub use extra_name::ExtraName;
pub use package_name::PackageName;

mod extra_name;
mod package_name;

/// Validate a project or extra name and return its PEP 503 normalized form.
///
/// Normalization lowercases ASCII letters and collapses every run of `-`, `_` and `.` into a
/// single `-`.
pub(crate) fn normalize(name: &str) -> Result<String, InvalidNameError> {
    let mut normalized = String::with_capacity(name.len());
    let mut in_separator = false;

    for byte in name.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' => {
                if in_separator {
                    normalized.push('-');
                    in_separator = false;
                }
                normalized.push(byte.to_ascii_lowercase() as char);
            }
            b'-' | b'_' | b'.' => {
                // Names can't start with punctuation.
                if normalized.is_empty() {
                    return Err(InvalidNameError(name.to_string()));
                }
                in_separator = true;
            }
            _ => return Err(InvalidNameError(name.to_string())),
        }
    }

    // Names can't be empty or end with punctuation.
    if normalized.is_empty() || in_separator {
        return Err(InvalidNameError(name.to_string()));
    }

    Ok(normalized)
}

/// Invalid [`PackageName`] or [`ExtraName`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InvalidNameError(String);

impl InvalidNameError {
    /// Returns the invalid name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for InvalidNameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Not a valid project or extra name: \"{}\". Names must start and end with a letter or \
            digit and may only contain -, _, ., and alphanumeric characters.",
            self.0
        )
    }
}

impl Error for InvalidNameError {}
