//! Parsed command replies

use std::fmt;

/// Reply to a single ESC/VP21 command
///
/// The raw reply text is split on carriage returns, so a power query
/// answered with `"PWR=01\r:"` becomes `["PWR=01", ":"]`. The trailing
/// `:` is the projector's prompt and is kept as its own line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    lines: Vec<String>,
}

impl Reply {
    /// Error marker returned for rejected commands
    pub const ERROR: &'static str = "ERR";

    /// Build a reply from already split lines
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// Decode raw reply bytes and split them on `\r`
    pub fn parse(raw: &[u8]) -> Self {
        let text = String::from_utf8_lossy(raw);
        Self {
            lines: text.split('\r').map(str::to_owned).collect(),
        }
    }

    /// Reply lines in the order they were received
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    /// `true` when the projector rejected the command
    pub fn is_error(&self) -> bool {
        self.lines.iter().any(|line| line.trim() == Self::ERROR)
    }

    /// Value of a `KEY=VALUE` line
    ///
    /// ```
    /// use escvp_types::Reply;
    ///
    /// let reply = Reply::parse(b"PWR=01\r:");
    /// assert_eq!(reply.value("PWR"), Some("01"));
    /// assert_eq!(reply.value("SOURCE"), None);
    /// ```
    pub fn value(&self, key: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| {
            let (k, v) = line.split_once('=')?;
            (k.trim() == key).then(|| v.trim())
        })
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines.join("\r"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_on_carriage_return() {
        let reply = Reply::parse(b"PWR=01\r:");
        assert_eq!(reply.lines(), ["PWR=01", ":"]);
    }

    #[test]
    fn test_parse_bare_prompt() {
        let reply = Reply::parse(b":");
        assert_eq!(reply.lines(), [":"]);
        assert!(!reply.is_error());
    }

    #[test]
    fn test_is_error() {
        assert!(Reply::parse(b"ERR\r:").is_error());
        assert!(!Reply::parse(b"LAMP=1234\r:").is_error());
    }

    #[test]
    fn test_value_lookup() {
        let reply = Reply::parse(b"SOURCE=30\rLAMP=1500\r:");
        assert_eq!(reply.value("SOURCE"), Some("30"));
        assert_eq!(reply.value("LAMP"), Some("1500"));
        assert_eq!(reply.value("PWR"), None);
    }

    #[test]
    fn test_display_rejoins_lines() {
        let reply = Reply::parse(b"PWR=01\r:");
        assert_eq!(reply.to_string(), "PWR=01\r:");
    }
}
