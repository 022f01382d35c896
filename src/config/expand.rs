//! Placeholder expansion for manifest text.
//!
//! Two forms are recognised: `${NAME}` and `${NAME:-DEFAULT}`. A set variable
//! wins over the default; an unset variable without a default expands to the
//! empty string. Anything else that looks like a placeholder (`$NAME`,
//! `${NAME:?err}`, `${}`) is left untouched.

use regex::{Captures, Regex};
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

/// `${NAME}` or `${NAME:-DEFAULT}`; the default runs to the first `}`.
#[allow(clippy::expect_used)]
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").expect("placeholder pattern is valid")
});

/// A source of environment variables.
pub trait EnvSource {
    /// Returns the value of `key`, or `None` when unset.
    fn var(&self, key: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<T: EnvSource + ?Sized> EnvSource for &T {
    fn var(&self, key: &str) -> Option<String> {
        (**self).var(key)
    }
}

/// Expands every placeholder in `text` against `env`.
///
/// Never fails: unresolved variables become empty strings.
#[must_use]
pub fn expand(text: &str, env: &impl EnvSource) -> String {
    PLACEHOLDER
        .replace_all(text, |caps: &Captures<'_>| {
            let name = &caps[1];
            env.var(name)
                .or_else(|| caps.get(2).map(|default| default.as_str().to_string()))
                .unwrap_or_default()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_unset_without_default_is_empty() {
        assert_eq!(expand("port: ${X}", &env(&[])), "port: ");
    }

    #[test]
    fn test_unset_with_default() {
        assert_eq!(expand("${X:-d}", &env(&[])), "d");
    }

    #[test]
    fn test_set_overrides_default() {
        assert_eq!(expand("${X:-d}", &env(&[("X", "v")])), "v");
        assert_eq!(expand("${X}", &env(&[("X", "v")])), "v");
    }

    #[test]
    fn test_set_to_empty_is_used() {
        assert_eq!(expand("[${X:-d}]", &env(&[("X", "")])), "[]");
    }

    #[test]
    fn test_default_may_contain_colons_and_spaces() {
        assert_eq!(
            expand("${DB:-postgres://db:5432/app name}", &env(&[])),
            "postgres://db:5432/app name"
        );
        assert_eq!(expand("${X:-}", &env(&[])), "");
    }

    #[test]
    fn test_multiple_tokens_on_one_line() {
        let vars = env(&[("HOST", "example.com")]);
        assert_eq!(
            expand("${USER_NAME:-deploy}@${HOST}:${PORT:-22}", &vars),
            "deploy@example.com:22"
        );
    }

    #[test]
    fn test_other_forms_pass_through() {
        let vars = env(&[("X", "v")]);
        assert_eq!(expand("$X", &vars), "$X");
        assert_eq!(expand("${X:?missing}", &vars), "${X:?missing}");
        assert_eq!(expand("${}", &vars), "${}");
        assert_eq!(expand("${1X}", &vars), "${1X}");
        assert_eq!(expand("${X", &vars), "${X");
    }

    #[test]
    fn test_nested_default_is_not_expanded() {
        let vars = env(&[("B", "b")]);
        assert_eq!(expand("${A:-${B}}", &vars), "${B}");
    }

    #[test]
    fn test_deterministic() {
        let vars = env(&[("A", "1")]);
        let text = "a: ${A}\nb: ${B:-2}\nc: ${C}\n";
        assert_eq!(expand(text, &vars), expand(text, &vars));
    }
}
