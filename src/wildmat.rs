//! Wildmat pattern matching (RFC 3977 Section 4)
//!
//! A wildmat is a comma-separated list of patterns. `*` matches any run of
//! characters and `?` matches exactly one. A pattern prefixed with `!` is
//! negated. The last pattern that matches decides the outcome; if none
//! matches, the string does not match.

/// Compiled wildmat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wildmat {
    patterns: Vec<(bool, Vec<char>)>,
}

impl Wildmat {
    /// Compile a wildmat expression
    ///
    /// ```
    /// use nntp_server::wildmat::Wildmat;
    ///
    /// let wm = Wildmat::new("comp.*,!comp.lang.*,comp.lang.rust");
    /// assert!(wm.matches("comp.os.linux"));
    /// assert!(!wm.matches("comp.lang.c"));
    /// assert!(wm.matches("comp.lang.rust"));
    /// assert!(!wm.matches("alt.test"));
    /// ```
    pub fn new(expr: &str) -> Self {
        let patterns = expr
            .split(',')
            .filter(|p| !p.is_empty())
            .map(|p| match p.strip_prefix('!') {
                Some(rest) => (true, rest.chars().collect()),
                None => (false, p.chars().collect()),
            })
            .collect();
        Self { patterns }
    }

    /// Wildmat matching everything
    pub fn any() -> Self {
        Self::new("*")
    }

    /// Whether `text` is selected by this wildmat
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        let text: Vec<char> = text.chars().collect();
        self.patterns
            .iter()
            .rev()
            .find(|(_, pattern)| glob_match(pattern, &text))
            .is_some_and(|(negated, _)| !negated)
    }
}

/// Iterative glob match with single-star backtracking
fn glob_match(pattern: &[char], text: &[char]) -> bool {
    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                star = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match star {
                Some((sp, st)) => {
                    p = sp + 1;
                    t = st + 1;
                    star = Some((sp, st + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}
