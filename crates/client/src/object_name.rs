//! MBean object names.
//!
//! Parses names of the form:
//!
//! ```text
//! <domain>:<key>=<value>[,<key>=<value>]*
//! ```
//!
//! Patterns are supported the way a JMX server understands them:
//!
//! ```text
//! java.lang:*                      property-list pattern
//! java.lang:type=GarbageCollector,*
//! *:type=Memory                    domain wildcard
//! java.lang:type=Memory*Pool,name=?1   value wildcards
//! ```
//!
//! Values may be quoted (`"…"`), in which case `\"`, `\\`, `\*`, `\?` and
//! `\n` escapes are recognised and commas, colons and equals signs may
//! appear literally.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use regex::Regex;

use crate::errors::{JmxError, JmxResult};

/// Matches every registered MBean.
pub const ALL_MBEANS: &str = "*:*";

/// A parsed (possibly wildcarded) MBean object name.
#[derive(Debug, Clone)]
pub struct ObjectName {
    domain: String,
    /// Key properties in the order they were written.  Quoted values keep
    /// their quotes.
    properties: Vec<(String, String)>,
    /// The property list contains a `*` element.
    property_list_pattern: bool,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

fn invalid(name: &str, reason: impl Into<String>) -> JmxError {
    JmxError::InvalidObjectName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

fn validate_key(full: &str, key: &str) -> JmxResult<()> {
    if key.is_empty() {
        return Err(invalid(full, "empty key"));
    }
    if let Some(c) = key
        .chars()
        .find(|c| matches!(c, ':' | ',' | '=' | '*' | '?' | '\n'))
    {
        return Err(invalid(full, format!("illegal character '{c}' in key '{key}'")));
    }
    Ok(())
}

/// Read a quoted value starting at the opening quote.  Returns the raw value
/// (quotes included) and the number of bytes consumed.
fn read_quoted(full: &str, rest: &str) -> JmxResult<(String, usize)> {
    let mut chars = rest.char_indices();
    // Opening quote.
    chars.next();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, '"' | '\\' | '*' | '?' | 'n')) => {}
                Some((_, other)) => {
                    return Err(invalid(full, format!("invalid escape '\\{other}' in quoted value")));
                }
                None => break,
            },
            '"' => {
                let end = i + c.len_utf8();
                return Ok((rest[..end].to_string(), end));
            }
            '\n' => return Err(invalid(full, "newline in quoted value")),
            _ => {}
        }
    }
    Err(invalid(full, "unterminated quoted value"))
}

impl ObjectName {
    /// Parse an object name or pattern.
    pub fn parse(name: &str) -> JmxResult<Self> {
        let (domain, mut rest) = name
            .split_once(':')
            .ok_or_else(|| invalid(name, "expected '<domain>:<key>=<value>'"))?;

        if domain.contains('\n') {
            return Err(invalid(name, "newline in domain"));
        }

        let mut properties: Vec<(String, String)> = Vec::new();
        let mut property_list_pattern = false;

        if rest.is_empty() {
            return Err(invalid(name, "missing key properties"));
        }

        loop {
            // A bare `*` element.
            if rest == "*" || rest.starts_with("*,") {
                if property_list_pattern {
                    return Err(invalid(name, "repeated '*' in property list"));
                }
                property_list_pattern = true;
                rest = &rest[1..];
            } else {
                let (key, after_key) = rest
                    .split_once('=')
                    .ok_or_else(|| invalid(name, format!("missing '=' in '{rest}'")))?;
                validate_key(name, key)?;
                if properties.iter().any(|(k, _)| k == key) {
                    return Err(invalid(name, format!("duplicate key '{key}'")));
                }

                let (value, consumed) = if after_key.starts_with('"') {
                    read_quoted(name, after_key)?
                } else {
                    let end = after_key.find(',').unwrap_or(after_key.len());
                    let value = &after_key[..end];
                    if value.is_empty() {
                        return Err(invalid(name, format!("empty value for key '{key}'")));
                    }
                    if let Some(c) = value.chars().find(|c| matches!(c, '=' | ':' | '"' | '\n')) {
                        return Err(invalid(
                            name,
                            format!("illegal character '{c}' in value of '{key}' (quote it)"),
                        ));
                    }
                    (value.to_string(), end)
                };

                properties.push((key.to_string(), value));
                rest = &after_key[consumed..];
            }

            match rest.strip_prefix(',') {
                Some(next) if next.is_empty() => {
                    return Err(invalid(name, "trailing ',' in property list"));
                }
                Some(next) => rest = next,
                None if rest.is_empty() => break,
                None => {
                    return Err(invalid(name, format!("unexpected text '{rest}' after value")));
                }
            }
        }

        Ok(Self {
            domain: domain.to_string(),
            properties,
            property_list_pattern,
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Key properties in the order they were written.
    pub fn properties(&self) -> &[(String, String)] {
        &self.properties
    }

    /// Raw value of the key property `key` (quoted values keep their quotes).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_domain_pattern(&self) -> bool {
        self.domain.contains(['*', '?'])
    }

    pub fn is_property_list_pattern(&self) -> bool {
        self.property_list_pattern
    }

    pub fn is_property_value_pattern(&self) -> bool {
        self.properties.iter().any(|(_, v)| value_is_pattern(v))
    }

    /// `true` if this name can match more than one MBean.
    pub fn is_pattern(&self) -> bool {
        self.is_domain_pattern() || self.property_list_pattern || self.is_property_value_pattern()
    }

    /// The key property list in written order, without any `*` element.
    pub fn key_property_list(&self) -> String {
        self.properties
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// The canonical form: properties sorted by key, pattern marker last.
    pub fn canonical(&self) -> String {
        let mut props: Vec<&(String, String)> = self.properties.iter().collect();
        props.sort_by(|a, b| a.0.cmp(&b.0));
        let list = props
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",");
        format!("{}:{}", self.domain, with_pattern_marker(list, self.property_list_pattern))
    }

    // -----------------------------------------------------------------------
    // Pattern matching
    // -----------------------------------------------------------------------

    /// Check whether the concrete name `other` is selected by this name.
    ///
    /// A non-pattern name only matches names that are equal to it.
    pub fn matches(&self, other: &ObjectName) -> bool {
        let domain_ok = if self.is_domain_pattern() {
            wildcard_matches(&self.domain, &other.domain)
        } else {
            self.domain == other.domain
        };
        if !domain_ok {
            return false;
        }

        if !self.property_list_pattern && self.properties.len() != other.properties.len() {
            return false;
        }

        self.properties.iter().all(|(key, pattern)| {
            other
                .get(key)
                .is_some_and(|value| value_matches(pattern, value))
        })
    }

    /// Path of this MBean inside a Jolokia `list` response
    /// (`<domain>/<key properties>`), with path escaping applied.
    pub fn list_path(&self) -> String {
        format!(
            "{}/{}",
            escape_path_element(&self.domain),
            escape_path_element(&self.key_property_list())
        )
    }
}

fn with_pattern_marker(list: String, pattern: bool) -> String {
    match (pattern, list.is_empty()) {
        (false, _) => list,
        (true, true) => "*".to_string(),
        (true, false) => format!("{list},*"),
    }
}

/// `true` if a raw property value contains an unescaped `*` or `?`.
fn value_is_pattern(raw: &str) -> bool {
    match raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
        Some(inner) => {
            let mut escaped = false;
            for c in inner.chars() {
                match c {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    '*' | '?' => return true,
                    _ => {}
                }
            }
            false
        }
        None => raw.contains(['*', '?']),
    }
}

fn value_matches(pattern: &str, value: &str) -> bool {
    if value_is_pattern(pattern) {
        wildcard_matches(pattern, value)
    } else {
        pattern == value
    }
}

/// JMX wildcard match: `*` is any run of characters (including none), `?`
/// exactly one, everything else is literal.  Inside a quoted value a
/// backslash and the character after it are matched literally.
fn wildcard_matches(pattern: &str, value: &str) -> bool {
    let quoted = pattern.starts_with('"');
    let mut re = String::with_capacity(pattern.len() * 2 + 8);
    re.push_str("(?s)^");
    let mut buf = [0u8; 4];
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' if quoted => {
                re.push_str(r"\\");
                if let Some(next) = chars.next() {
                    re.push_str(&regex::escape(next.encode_utf8(&mut buf)));
                }
            }
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            other => re.push_str(&regex::escape(other.encode_utf8(&mut buf))),
        }
    }
    re.push('$');
    Regex::new(&re).is_ok_and(|re| re.is_match(value))
}

/// Escape one element of a Jolokia request path: `!` → `!!`, `/` → `!/`.
pub fn escape_path_element(element: &str) -> String {
    let mut out = String::with_capacity(element.len());
    for c in element.chars() {
        match c {
            '!' => out.push_str("!!"),
            '/' => out.push_str("!/"),
            other => out.push(other),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Trait impls
// ---------------------------------------------------------------------------

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            self.domain,
            with_pattern_marker(self.key_property_list(), self.property_list_pattern)
        )
    }
}

impl FromStr for ObjectName {
    type Err = JmxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialEq for ObjectName {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for ObjectName {}

impl Hash for ObjectName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
