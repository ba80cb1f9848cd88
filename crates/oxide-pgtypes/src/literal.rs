//! PostgreSQL array literal tokenizer and writer.
//!
//! Handles one-dimensional literals of the form `{a,"b c","d\"e"}`. Quoted
//! elements may contain commas, braces and backslash-escaped quotes; bare
//! elements are trimmed.

/// One element of an array literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawElement {
    /// Element text with quotes removed and escapes resolved.
    pub text: String,
    /// Whether the element was double-quoted.
    pub quoted: bool,
}

/// A malformed literal, reported at the element where scanning stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LiteralError {
    pub index: usize,
    pub raw: String,
    pub message: &'static str,
}

/// Splits an array literal into its elements.
///
/// The literal must be enclosed in braces. `{}` yields no elements.
pub(crate) fn split(literal: &str) -> Result<Vec<RawElement>, LiteralError> {
    let trimmed = literal.trim();
    let Some(body) = trimmed
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
    else {
        return Err(LiteralError {
            index: 0,
            raw: trimmed.to_string(),
            message: "array literal must be enclosed in braces",
        });
    };

    let mut elements = Vec::new();
    if body.trim().is_empty() {
        return Ok(elements);
    }

    let mut chars = body.char_indices().peekable();
    loop {
        let index = elements.len();
        while chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}

        let start = chars.peek().map_or(body.len(), |(i, _)| *i);
        let element = if chars.next_if(|(_, c)| *c == '"').is_some() {
            let mut text = String::new();
            let mut closed = false;
            while let Some((_, c)) = chars.next() {
                match c {
                    '\\' => match chars.next() {
                        Some((_, escaped)) => text.push(escaped),
                        None => break,
                    },
                    '"' => {
                        closed = true;
                        break;
                    }
                    _ => text.push(c),
                }
            }
            if !closed {
                return Err(LiteralError {
                    index,
                    raw: body[start..].to_string(),
                    message: "unterminated quoted element",
                });
            }
            while chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
            if let Some((i, c)) = chars.peek() {
                if *c != ',' {
                    let end = body[*i..].find(',').map_or(body.len(), |n| i + n);
                    return Err(LiteralError {
                        index,
                        raw: body[start..end].to_string(),
                        message: "unexpected text after quoted element",
                    });
                }
            }
            RawElement { text, quoted: true }
        } else {
            let mut end = body.len();
            while let Some((i, c)) = chars.peek() {
                if *c == ',' {
                    end = *i;
                    break;
                }
                chars.next();
            }
            let text = body[start..end].trim();
            if text.is_empty() {
                return Err(LiteralError {
                    index,
                    raw: String::new(),
                    message: "empty unquoted element",
                });
            }
            RawElement {
                text: text.to_string(),
                quoted: false,
            }
        };
        elements.push(element);

        // Either a separator or the end of the body.
        if chars.next().is_none() {
            break;
        }
    }

    Ok(elements)
}

/// Wraps `text` in double quotes, escaping `"` and `\`.
pub(crate) fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Joins already-rendered elements into `{a,b,c}`.
pub(crate) fn join(elements: impl IntoIterator<Item = String>) -> String {
    let mut out = String::from("{");
    for (i, element) in elements.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&element);
    }
    out.push('}');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(literal: &str) -> Vec<String> {
        split(literal).unwrap().into_iter().map(|e| e.text).collect()
    }

    #[test]
    fn test_split_bare_and_quoted() {
        assert_eq!(texts("{1,2,3}"), ["1", "2", "3"]);
        assert_eq!(texts(r#"{"a","b","c"}"#), ["a", "b", "c"]);
        assert_eq!(texts(r#"{plain,"with space"}"#), ["plain", "with space"]);
        assert_eq!(texts("{ 1 , 2 }"), ["1", "2"]);
    }

    #[test]
    fn test_split_empty_body() {
        assert!(split("{}").unwrap().is_empty());
        assert!(split(" {} ").unwrap().is_empty());
        assert!(split("{ }").unwrap().is_empty());
    }

    #[test]
    fn test_split_requires_braces() {
        for literal in ["", "1,2", "{1,2", "1,2}", "}{"] {
            let err = split(literal).unwrap_err();
            assert_eq!(err.message, "array literal must be enclosed in braces", "{literal}");
        }
    }

    #[test]
    fn test_split_rejects_empty_bare_elements() {
        assert_eq!(split("{a,}").unwrap_err().index, 1);
        assert_eq!(split("{,a}").unwrap_err().index, 0);
        assert_eq!(split("{a,,b}").unwrap_err().index, 1);
        assert_eq!(texts(r#"{a,""}"#), ["a", ""]);
    }

    #[test]
    fn test_split_quoted_separators_and_escapes() {
        assert_eq!(
            texts(r#"{"a,b","c\"d","e\\f","{g}"}"#),
            ["a,b", "c\"d", "e\\f", "{g}"]
        );
        assert_eq!(texts(r#"{""}"#), [""]);
    }

    #[test]
    fn test_split_marks_quoted() {
        let elements = split(r#"{NULL,"NULL"}"#).unwrap();
        assert!(!elements[0].quoted);
        assert!(elements[1].quoted);
    }

    #[test]
    fn test_split_errors() {
        let err = split(r#"{"a","b}"#).unwrap_err();
        assert_eq!(err.index, 1);

        let err = split(r#"{"a"x,b}"#).unwrap_err();
        assert_eq!(err.index, 0);
        assert_eq!(err.raw, r#""a"x"#);
    }

    #[test]
    fn test_quote_and_join() {
        assert_eq!(quote(r#"say "hi" \o/"#), r#""say \"hi\" \\o/""#);
        assert_eq!(join(Vec::<String>::new()), "{}");
        assert_eq!(join(["1".to_string(), "2".to_string()]), "{1,2}");
    }
}
