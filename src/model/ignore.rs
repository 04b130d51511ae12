//! CVS-ignore glob pattern list, matched against child leaf names.

use regex::Regex;

/// Ordered list of CVS-ignore glob patterns for one folder.
#[derive(Debug, Clone, Default)]
pub struct IgnorePatterns {
    patterns: Vec<String>,
}

impl IgnorePatterns {
    pub fn new(patterns: Vec<String>) -> Self {
        IgnorePatterns { patterns }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Append a pattern if not already present.
    pub fn add_unique(&mut self, pattern: impl Into<String>) -> bool {
        let pattern = pattern.into();
        if self.patterns.iter().any(|p| p == &pattern) {
            false
        } else {
            self.patterns.push(pattern);
            true
        }
    }

    /// Parse `CVS/.cvsignore` contents: one pattern per line, blank lines
    /// ignored, a line that is exactly `!` clears everything read so far.
    pub fn parse(contents: &str) -> Self {
        let mut patterns = Vec::new();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line == "!" {
                patterns.clear();
                continue;
            }
            patterns.push(line.to_string());
        }
        IgnorePatterns { patterns }
    }

    /// Render back to `CVS/.cvsignore` contents, one pattern per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for p in &self.patterns {
            out.push_str(p);
            out.push('\n');
        }
        out
    }

    /// Whether `name` matches any glob pattern in this list.
    pub fn matches(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| glob_matches(p, name))
    }
}

fn glob_matches(pattern: &str, name: &str) -> bool {
    match glob_to_regex(pattern) {
        Some(re) => re.is_match(name),
        None => pattern == name,
    }
}

/// Translate a shell-style glob (`*`, `?`, `[...]`) into an anchored regex.
fn glob_to_regex(pattern: &str) -> Option<Regex> {
    let mut re = String::from("^");
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            '[' => {
                re.push('[');
                while let Some(&c2) = chars.peek() {
                    chars.next();
                    re.push(c2);
                    if c2 == ']' {
                        break;
                    }
                }
            }
            c if "\\.+()|^$".contains(c) => {
                re.push('\\');
                re.push(c);
            }
            c => re.push(c),
        }
    }
    re.push('$');
    Regex::new(&re).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_matches_extension() {
        let ignore = IgnorePatterns::new(vec!["*.log".to_string()]);
        assert!(ignore.matches("debug.log"));
        assert!(!ignore.matches("debug.txt"));
    }

    #[test]
    fn bang_clears_accumulated_patterns() {
        let ignore = IgnorePatterns::parse("*.log\ntarget\n!\n*.tmp\n");
        assert_eq!(ignore.patterns(), &["*.tmp".to_string()]);
    }

    #[test]
    fn add_unique_does_not_duplicate() {
        let mut ignore = IgnorePatterns::default();
        assert!(ignore.add_unique("*.log"));
        assert!(!ignore.add_unique("*.log"));
        assert_eq!(ignore.patterns().len(), 1);
    }

    #[test]
    fn render_round_trips_through_parse() {
        let ignore = IgnorePatterns::new(vec!["*.log".to_string(), "build".to_string()]);
        let rendered = ignore.render();
        let reparsed = IgnorePatterns::parse(&rendered);
        assert_eq!(reparsed.patterns(), ignore.patterns());
    }
}
