//! Capabilities advertised by the server (RFC 3977 Section 5.2)
//!
//! The CAPABILITIES command returns one capability per line, each optionally
//! followed by arguments. VERSION is always the first line.

use crate::VERSION;

/// Ordered set of capabilities a session advertises
#[must_use]
#[derive(Debug, Clone)]
pub struct Capabilities {
    /// Capability name and its arguments, in advertisement order
    /// Example: "LIST" -> ["ACTIVE", "NEWSGROUPS"]
    capabilities: Vec<(String, Vec<String>)>,
}

impl Capabilities {
    /// Create an empty Capabilities instance
    pub fn new() -> Self {
        Self {
            capabilities: Vec::new(),
        }
    }

    /// Capabilities of a reader server
    ///
    /// POST is only advertised when posting is enabled.
    pub fn reader(allow_posting: bool) -> Self {
        let mut caps = Self::new()
            .with("VERSION", &["2"])
            .with("READER", &[])
            .with("HDR", &[])
            .with(
                "LIST",
                &[
                    "ACTIVE",
                    "ACTIVE.TIMES",
                    "HEADERS",
                    "NEWSGROUPS",
                    "OVERVIEW.FMT",
                    "SUBSCRIPTIONS",
                ],
            )
            .with("NEWNEWS", &[])
            .with("OVER", &["MSGID"])
            .with("AUTHINFO", &["USER"]);
        if allow_posting {
            caps = caps.with("POST", &[]);
        }
        caps.with("IMPLEMENTATION", &["nntp-server", VERSION])
    }

    /// Append a capability with its arguments
    pub fn with(mut self, capability: &str, args: &[&str]) -> Self {
        self.capabilities.push((
            capability.to_uppercase(),
            args.iter().map(|a| a.to_string()).collect(),
        ));
        self
    }

    /// Check if a capability is advertised
    #[must_use]
    pub fn has(&self, capability: &str) -> bool {
        self.get_args(capability).is_some()
    }

    /// Get arguments for a capability
    ///
    /// Returns None if the capability is not advertised
    #[must_use]
    pub fn get_args(&self, capability: &str) -> Option<&Vec<String>> {
        self.capabilities
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(capability))
            .map(|(_, args)| args)
    }

    /// Check if a capability is advertised with a specific argument
    pub fn has_arg(&self, capability: &str, arg: &str) -> bool {
        self.get_args(capability)
            .map(|args| args.iter().any(|a| a.eq_ignore_ascii_case(arg)))
            .unwrap_or(false)
    }

    /// Lines of the 101 response body
    pub fn to_lines(&self) -> Vec<String> {
        self.capabilities
            .iter()
            .map(|(name, args)| {
                if args.is_empty() {
                    name.clone()
                } else {
                    format!("{} {}", name, args.join(" "))
                }
            })
            .collect()
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::new()
    }
}
