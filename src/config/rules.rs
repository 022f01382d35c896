//! Named field predicates used by the validator.
//!
//! The table is fixed at compile time; there is no registry to mutate.
//! Rule expressions may join several names with `|`, in which case the
//! value passes when any alternative passes (`"fqdn|ip"`).

use std::fmt;
use validator::{ValidateEmail, ValidateIp};

/// Maximum length of a DNS name, excluding a trailing dot.
const MAX_DNS_NAME_LEN: usize = 253;

/// Maximum length of a single DNS label.
const MAX_DNS_LABEL_LEN: usize = 63;

/// A named validation rule over a string field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Fully-qualified DNS name.
    Fqdn,
    /// Email address.
    Email,
    /// IPv4 or IPv6 literal.
    Ip,
    /// Plausible filesystem path to a file.
    FilePath,
    /// Absolute unix path.
    UnixPath,
    /// `host:container` volume mount.
    VolumeReference,
}

impl Rule {
    /// Every rule, in table order.
    pub const ALL: [Self; 6] = [
        Self::Fqdn,
        Self::Email,
        Self::Ip,
        Self::FilePath,
        Self::UnixPath,
        Self::VolumeReference,
    ];

    /// Name used in rule expressions.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fqdn => "fqdn",
            Self::Email => "email",
            Self::Ip => "ip",
            Self::FilePath => "filepath",
            Self::UnixPath => "unix_path",
            Self::VolumeReference => "volume_reference",
        }
    }

    /// Looks a rule up by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|rule| rule.name() == name)
    }

    /// Predicate backing this rule.
    #[must_use]
    pub const fn predicate(self) -> fn(&str) -> bool {
        match self {
            Self::Fqdn => is_fqdn,
            Self::Email => is_email,
            Self::Ip => is_ip,
            Self::FilePath => is_file_path,
            Self::UnixPath => is_unix_path,
            Self::VolumeReference => is_volume_reference,
        }
    }

    /// Applies the rule to `value`.
    #[must_use]
    pub fn check(self, value: &str) -> bool {
        (self.predicate())(value)
    }

    /// Short description used in violation messages.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Fqdn => "a valid DNS name",
            Self::Email => "a valid email address",
            Self::Ip => "a valid IP address",
            Self::FilePath => "a valid file path",
            Self::UnixPath => "an absolute path starting with '/'",
            Self::VolumeReference => "a volume reference of the form 'host:container'",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parses a `|`-separated rule expression.
///
/// Returns `None` if any alternative names an unknown rule.
#[must_use]
pub fn parse_expression(expression: &str) -> Option<Vec<Rule>> {
    expression
        .split('|')
        .map(|name| Rule::from_name(name.trim()))
        .collect()
}

/// Returns true when `value` satisfies at least one of `rules`.
#[must_use]
pub fn satisfies_any(rules: &[Rule], value: &str) -> bool {
    rules.iter().any(|rule| rule.check(value))
}

/// DNS name with at least two labels and an alphabetic top-level label.
fn is_fqdn(value: &str) -> bool {
    let name = value.strip_suffix('.').unwrap_or(value);
    if name.is_empty() || name.len() > MAX_DNS_NAME_LEN {
        return false;
    }

    let labels: Vec<&str> = name.split('.').collect();
    if labels.len() < 2 || !labels.iter().all(|label| is_dns_label(label)) {
        return false;
    }

    labels
        .last()
        .and_then(|tld| tld.chars().next())
        .is_some_and(|c| c.is_ascii_alphabetic())
}

fn is_dns_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= MAX_DNS_LABEL_LEN
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn is_email(value: &str) -> bool {
    value.validate_email()
}

fn is_ip(value: &str) -> bool {
    value.validate_ip()
}

/// Non-empty, NUL-free, and not naming a directory.
fn is_file_path(value: &str) -> bool {
    !value.trim().is_empty() && !value.contains('\0') && !value.ends_with('/')
}

fn is_unix_path(value: &str) -> bool {
    value.starts_with('/')
}

/// Exactly two non-empty `:`-separated parts.
fn is_volume_reference(value: &str) -> bool {
    let mut parts = value.split(':');
    matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(host), Some(container), None) if !host.is_empty() && !container.is_empty()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_reference() {
        assert!(Rule::VolumeReference.check("host:container"));
        assert!(Rule::VolumeReference.check("data:/var/lib/postgresql/data"));

        assert!(!Rule::VolumeReference.check("host"));
        assert!(!Rule::VolumeReference.check("host:"));
        assert!(!Rule::VolumeReference.check(":container"));
        assert!(!Rule::VolumeReference.check("a:b:c"));
        assert!(!Rule::VolumeReference.check(""));
    }

    #[test]
    fn test_fqdn() {
        assert!(Rule::Fqdn.check("example.com"));
        assert!(Rule::Fqdn.check("api.my-app.example.co.uk"));
        assert!(Rule::Fqdn.check("example.com."));

        assert!(!Rule::Fqdn.check("localhost"));
        assert!(!Rule::Fqdn.check("example"));
        assert!(!Rule::Fqdn.check("-bad.example.com"));
        assert!(!Rule::Fqdn.check("exa mple.com"));
        assert!(!Rule::Fqdn.check("example.123"));
        assert!(!Rule::Fqdn.check("a..com"));
        assert!(!Rule::Fqdn.check(""));
    }

    #[test]
    fn test_email_and_ip() {
        assert!(Rule::Email.check("ops@example.com"));
        assert!(!Rule::Email.check("not-an-email"));

        assert!(Rule::Ip.check("10.0.0.1"));
        assert!(Rule::Ip.check("::1"));
        assert!(!Rule::Ip.check("10.0.0.256"));
    }

    #[test]
    fn test_paths() {
        assert!(Rule::FilePath.check("~/.ssh/id_ed25519"));
        assert!(Rule::FilePath.check("/home/deploy/.ssh/id_rsa"));
        assert!(!Rule::FilePath.check(""));
        assert!(!Rule::FilePath.check("/home/deploy/.ssh/"));

        assert!(Rule::UnixPath.check("/data"));
        assert!(!Rule::UnixPath.check("data"));
    }

    #[test]
    fn test_expression_alternation() {
        let rules = parse_expression("fqdn|ip").unwrap();
        assert_eq!(rules, vec![Rule::Fqdn, Rule::Ip]);

        assert!(satisfies_any(&rules, "deploy.example.com"));
        assert!(satisfies_any(&rules, "192.168.1.10"));
        assert!(!satisfies_any(&rules, "not a host"));
    }

    #[test]
    fn test_unknown_rule_name() {
        assert!(Rule::from_name("semver").is_none());
        assert!(parse_expression("fqdn|semver").is_none());
    }

    #[test]
    fn test_names_round_trip_through_table() {
        for rule in Rule::ALL {
            assert_eq!(Rule::from_name(rule.name()), Some(rule));
        }
    }
}
