use std::fmt;

/// A specific diagnostic for a hunk that couldn't be applied — never a
/// silent failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reject {
    pub file: String,
    pub hunk_header: String,
    pub line: usize,
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for Reject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{file}: hunk '{header}' at line {line}: expected '{expected}', found '{actual}'",
            file = self.file,
            header = self.hunk_header,
            line = self.line,
            expected = self.expected,
            actual = self.actual,
        )
    }
}

pub fn truncate60(s: &str) -> String {
    if s.chars().count() <= 60 {
        s.to_string()
    } else {
        let mut truncated: String = s.chars().take(60).collect();
        truncated.push_str("...");
        truncated
    }
}
