//! Backslash-style replacement templates
//!
//! Administrators write replacements the way the harvester consumes them:
//! `\1`, `\g<1>`, `\g<name>` for group references, `\n`, `\t`, `\\` and
//! friends for control characters, `\0`/`\NNN` for octal escapes. Any other
//! escaped non-letter is kept verbatim (`\:` stays `\:`), while an unknown
//! escaped ASCII letter is an error.
//!
//! A template is checked against a compiled pattern: every group it
//! references must exist in that pattern.

use regex::{Captures, Regex};
use thiserror::Error;

/// Reasons a replacement template is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("bad escape (end of template) at position {0}")]
    TrailingBackslash(usize),

    #[error("bad escape {escape} at position {pos}")]
    BadEscape { escape: String, pos: usize },

    #[error("missing < at position {0}")]
    MissingLessThan(usize),

    #[error("missing >, unterminated name at position {0}")]
    UnterminatedName(usize),

    #[error("missing group name at position {0}")]
    MissingGroupName(usize),

    #[error("bad character in group name '{name}' at position {pos}")]
    BadGroupName { name: String, pos: usize },

    #[error("unknown group name '{0}'")]
    UnknownGroupName(String),

    #[error("invalid group reference {index} at position {pos}")]
    InvalidGroupReference { index: usize, pos: usize },

    #[error("octal escape value {escape} outside of range 0-0o377 at position {pos}")]
    OctalOutOfRange { escape: String, pos: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Group(usize),
}

/// A parsed replacement template bound to a pattern's group layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementTemplate {
    pieces: Vec<Piece>,
}

impl ReplacementTemplate {
    /// Parse `template`, resolving group references against `regex`
    pub fn parse(template: &str, regex: &Regex) -> Result<Self, TemplateError> {
        let groups = regex.captures_len() - 1;
        let chars: Vec<char> = template.chars().collect();
        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            if c != '\\' {
                literal.push(c);
                i += 1;
                continue;
            }

            let start = i;
            let next = match chars.get(i + 1) {
                Some(&next) => next,
                None => return Err(TemplateError::TrailingBackslash(start)),
            };
            i += 2;

            match next {
                'g' => {
                    if chars.get(i) != Some(&'<') {
                        return Err(TemplateError::MissingLessThan(i));
                    }
                    let name_start = i + 1;
                    let close = chars[name_start..]
                        .iter()
                        .position(|&ch| ch == '>')
                        .map(|offset| name_start + offset)
                        .ok_or(TemplateError::UnterminatedName(name_start))?;
                    let name: String = chars[name_start..close].iter().collect();
                    i = close + 1;

                    let index = resolve_group_name(&name, regex, name_start)?;
                    if index > groups {
                        return Err(TemplateError::InvalidGroupReference { index, pos: name_start });
                    }
                    push_group(&mut literal, &mut pieces, index);
                }
                '0' => {
                    // \0 followed by up to two more octal digits
                    let mut value = 0u32;
                    let mut taken = 0;
                    while taken < 2 && chars.get(i).is_some_and(|ch| is_octal(*ch)) {
                        value = value * 8 + chars[i].to_digit(8).unwrap_or(0);
                        i += 1;
                        taken += 1;
                    }
                    literal.extend(char::from_u32(value));
                }
                '1'..='9' => {
                    let d1 = next;
                    match chars.get(i).copied().filter(char::is_ascii_digit) {
                        Some(d2) => {
                            let d3 = chars.get(i + 1).copied();
                            if is_octal(d1) && is_octal(d2) && d3.is_some_and(is_octal) {
                                let escape: String = chars[start..i + 2].iter().collect();
                                let value = u32::from_str_radix(&escape[1..], 8).unwrap_or(u32::MAX);
                                if value > 0o377 {
                                    return Err(TemplateError::OctalOutOfRange { escape, pos: start });
                                }
                                literal.extend(char::from_u32(value));
                                i += 2;
                                continue;
                            }
                            let index = digit(d1) * 10 + digit(d2);
                            i += 1;
                            if index > groups {
                                return Err(TemplateError::InvalidGroupReference { index, pos: start + 1 });
                            }
                            push_group(&mut literal, &mut pieces, index);
                        }
                        None => {
                            let index = digit(d1);
                            if index > groups {
                                return Err(TemplateError::InvalidGroupReference { index, pos: start + 1 });
                            }
                            push_group(&mut literal, &mut pieces, index);
                        }
                    }
                }
                other => match control_escape(other) {
                    Some(ch) => literal.push(ch),
                    None if other.is_ascii_alphabetic() => {
                        return Err(TemplateError::BadEscape {
                            escape: format!("\\{}", other),
                            pos: start,
                        });
                    }
                    None => {
                        literal.push('\\');
                        literal.push(other);
                    }
                },
            }
        }

        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }

        Ok(Self { pieces })
    }

    /// Append the expansion for one match to `out`
    ///
    /// Groups that did not participate in the match expand to nothing.
    pub fn expand(&self, caps: &Captures<'_>, out: &mut String) {
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Group(index) => {
                    if let Some(m) = caps.get(*index) {
                        out.push_str(m.as_str());
                    }
                }
            }
        }
    }
}

/// Replace every non-overlapping match of `regex` in `input`
pub fn substitute(regex: &Regex, template: &ReplacementTemplate, input: &str) -> String {
    regex
        .replace_all(input, |caps: &Captures<'_>| {
            let mut expanded = String::new();
            template.expand(caps, &mut expanded);
            expanded
        })
        .into_owned()
}

fn push_group(literal: &mut String, pieces: &mut Vec<Piece>, index: usize) {
    if !literal.is_empty() {
        pieces.push(Piece::Literal(std::mem::take(literal)));
    }
    pieces.push(Piece::Group(index));
}

fn resolve_group_name(name: &str, regex: &Regex, pos: usize) -> Result<usize, TemplateError> {
    if name.is_empty() {
        return Err(TemplateError::MissingGroupName(pos));
    }

    if name.chars().all(|c| c.is_ascii_digit()) {
        return name
            .parse::<usize>()
            .map_err(|_| TemplateError::InvalidGroupReference { index: usize::MAX, pos });
    }

    if !is_identifier(name) {
        return Err(TemplateError::BadGroupName {
            name: name.to_string(),
            pos,
        });
    }

    regex
        .capture_names()
        .position(|candidate| candidate == Some(name))
        .ok_or_else(|| TemplateError::UnknownGroupName(name.to_string()))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_alphanumeric())
}

fn control_escape(c: char) -> Option<char> {
    match c {
        'a' => Some('\x07'),
        'b' => Some('\x08'),
        'f' => Some('\x0c'),
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        'v' => Some('\x0b'),
        '\\' => Some('\\'),
        _ => None,
    }
}

fn is_octal(c: char) -> bool {
    ('0'..='7').contains(&c)
}

fn digit(c: char) -> usize {
    c.to_digit(10).unwrap_or(0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(pattern: &str, template: &str, input: &str) -> Result<String, TemplateError> {
        let regex = Regex::new(pattern).unwrap();
        let template = ReplacementTemplate::parse(template, &regex)?;
        Ok(substitute(&regex, &template, input))
    }

    #[test]
    fn test_numbered_references() {
        assert_eq!(
            apply(r"^oai:([^:]+):(.+)$", r"oai:\1:\2", "oai:test:123/456").unwrap(),
            "oai:test:123/456"
        );
        assert_eq!(
            apply(r"^oai:([^:]+):(.+)$", r"\2@\1", "oai:test:123/456").unwrap(),
            "123/456@test"
        );
    }

    #[test]
    fn test_named_and_bracketed_references() {
        assert_eq!(
            apply(r"(?P<ns>[a-z]+):(?P<id>\d+)", r"\g<id>-\g<ns>-\g<0>", "abc:42").unwrap(),
            "42-abc-abc:42"
        );
    }

    #[test]
    fn test_missing_group_rejected() {
        let err = apply(r"^(oai):", r"\2", "oai:x").unwrap_err();
        assert!(matches!(err, TemplateError::InvalidGroupReference { index: 2, .. }));

        let err = apply(r"^(oai):", r"\g<5>", "oai:x").unwrap_err();
        assert!(matches!(err, TemplateError::InvalidGroupReference { index: 5, .. }));
    }

    #[test]
    fn test_unknown_group_name_rejected() {
        let err = apply(r"(?P<ns>\w+)", r"\g<missing>", "x").unwrap_err();
        assert_eq!(err, TemplateError::UnknownGroupName("missing".to_string()));
    }

    #[test]
    fn test_malformed_group_syntax() {
        assert!(matches!(apply(r"(a)", r"\g1", "a"), Err(TemplateError::MissingLessThan(_))));
        assert!(matches!(apply(r"(a)", r"\g<1", "a"), Err(TemplateError::UnterminatedName(_))));
        assert!(matches!(apply(r"(a)", r"\g<>", "a"), Err(TemplateError::MissingGroupName(_))));
        assert!(matches!(apply(r"(a)", r"\g<a-b>", "a"), Err(TemplateError::BadGroupName { .. })));
    }

    #[test]
    fn test_escapes() {
        assert_eq!(apply("x", r"\t|\n|\\", "x").unwrap(), "\t|\n|\\");
        assert_eq!(apply("x", r"a\:b", "x").unwrap(), "a\\:b");
        assert!(matches!(apply("x", r"\q", "x"), Err(TemplateError::BadEscape { .. })));
        assert!(matches!(apply("x", "abc\\", "x"), Err(TemplateError::TrailingBackslash(3))));
    }

    #[test]
    fn test_octal_escapes() {
        assert_eq!(apply("x", r"\101", "x").unwrap(), "A");
        assert_eq!(apply("x", r"\0", "x").unwrap(), "\0");
        assert!(matches!(apply("x", r"\477", "x"), Err(TemplateError::OctalOutOfRange { .. })));
    }

    #[test]
    fn test_two_digit_group_reference() {
        let pattern = "(a)(b)(c)(d)(e)(f)(g)(h)(i)(j)(k)";
        assert_eq!(apply(pattern, r"\11", "abcdefghijk").unwrap(), "k");
        // \18 is not octal (8 is not an octal digit) so it names group 18
        assert!(apply(pattern, r"\18", "abcdefghijk").is_err());
    }

    #[test]
    fn test_unmatched_optional_group_expands_empty() {
        assert_eq!(apply(r"a(x)?b", r"[\1]", "ab").unwrap(), "[]");
    }

    #[test]
    fn test_replaces_all_matches() {
        assert_eq!(apply(r"(\d)", r"<\1>", "a1b2").unwrap(), "a<1>b<2>");
    }
}
