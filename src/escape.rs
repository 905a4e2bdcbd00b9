use cssparser::{ParseError, Parser, ParserInput, Token};

/// Turns a raw class name into a selector-safe identifier.
pub trait ClassEscaper {
    fn escape(&self, class: &str) -> String;
}

/// Backslash-escapes the characters utility class names are allowed to carry
/// (`/` in fractions, `.` in decimals, `:` in variants and so on).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CssEscaper;

impl ClassEscaper for CssEscaper {
    fn escape(&self, class: &str) -> String {
        escape_selector(class)
    }
}

impl<F> ClassEscaper for F
where
    F: Fn(&str) -> String,
{
    fn escape(&self, class: &str) -> String {
        self(class)
    }
}

pub fn escape_selector(class: &str) -> String {
    let mut escaped = String::with_capacity(class.len() * 2);

    for ch in class.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            ':' => escaped.push_str("\\:"),
            '/' => escaped.push_str("\\/"),
            '[' => escaped.push_str("\\["),
            ']' => escaped.push_str("\\]"),
            '(' => escaped.push_str("\\("),
            ')' => escaped.push_str("\\)"),
            '&' => escaped.push_str("\\&"),
            '>' => escaped.push_str("\\>"),
            '+' => escaped.push_str("\\+"),
            ',' => escaped.push_str("\\,"),
            '%' => escaped.push_str("\\%"),
            '=' => escaped.push_str("\\="),
            '!' => escaped.push_str("\\!"),
            '*' => escaped.push_str("\\*"),
            '@' => escaped.push_str("\\@"),
            '#' => escaped.push_str("\\#"),
            '\'' => escaped.push_str("\\'"),
            '"' => escaped.push_str("\\\""),
            '.' => escaped.push_str("\\."),
            _ => escaped.push(ch),
        }
    }

    escaped
}

/// Escapes a custom property name. Only `[A-Za-z0-9_-]` and non-ASCII pass
/// through untouched.
pub fn escape_ident(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || !ch.is_ascii() {
            escaped.push(ch);
        } else {
            escaped.push('\\');
            escaped.push(ch);
        }
    }
    escaped
}

/// Collects the unescaped class names mentioned by a selector, in order.
///
/// `.cols-container > .w-1\/2-cols` yields `cols-container` and `w-1/2-cols`.
/// Attribute selectors are skipped so `[class*="-cols"]` contributes nothing.
pub fn selector_classes(selector: &str) -> Vec<String> {
    let mut input = ParserInput::new(selector);
    let mut parser = Parser::new(&mut input);
    let mut classes = Vec::new();
    collect_classes(&mut parser, &mut classes);
    classes
}

/// A class is a `.` delimiter immediately followed by an identifier.
/// Pseudo-class arguments are searched too.
fn collect_classes(parser: &mut Parser<'_, '_>, classes: &mut Vec<String>) {
    let mut after_dot = false;
    while let Ok(token) = parser.next_including_whitespace() {
        match token {
            Token::Delim('.') => {
                after_dot = true;
                continue;
            }
            Token::Ident(name) if after_dot => classes.push(name.to_string()),
            Token::Function(_) | Token::ParenthesisBlock => {
                let _ = parser.parse_nested_block(|nested| {
                    collect_classes(nested, classes);
                    Ok::<(), ParseError<'_, ()>>(())
                });
            }
            _ => {}
        }
        after_dot = false;
    }
}

#[cfg(test)]
mod tests {
    use super::{escape_ident, escape_selector, selector_classes, ClassEscaper, CssEscaper};

    #[test]
    fn escapes_fraction_slash() {
        assert_eq!(escape_selector("w-1/2-cols"), "w-1\\/2-cols");
        assert_eq!(CssEscaper.escape("mx-3-cols"), "mx-3-cols");
    }

    #[test]
    fn closures_act_as_escapers() {
        let upper = |class: &str| class.to_ascii_uppercase();
        assert_eq!(upper.escape("w-1-cols"), "W-1-COLS");
    }

    #[test]
    fn escapes_custom_property_names() {
        assert_eq!(escape_ident("inner-gutter"), "inner-gutter");
        assert_eq!(escape_ident("a.b"), "a\\.b");
    }

    #[test]
    fn reads_classes_back_out_of_selectors() {
        assert_eq!(
            selector_classes(".cols-container > .w-1\\/2-cols"),
            vec!["cols-container".to_string(), "w-1/2-cols".to_string()]
        );
        assert_eq!(
            selector_classes(".cols-container > [class*=\"-cols\"]"),
            vec!["cols-container".to_string()]
        );
        assert_eq!(
            selector_classes(".breakout.px-outer-gutter, .breakout > .px-outer-gutter"),
            vec![
                "breakout".to_string(),
                "px-outer-gutter".to_string(),
                "breakout".to_string(),
                "px-outer-gutter".to_string()
            ]
        );
        assert!(selector_classes(":root").is_empty());
        assert_eq!(
            selector_classes(".grid-container > :not(.ml-0)"),
            vec!["grid-container".to_string(), "ml-0".to_string()]
        );
        assert!(selector_classes(". w-2-cols").is_empty());
    }

    #[test]
    fn escaped_selectors_round_trip_through_selector_classes() {
        let selector = format!(".{}", escape_selector("-mx-2/3-cols-no-gutter"));
        assert_eq!(
            selector_classes(&selector),
            vec!["-mx-2/3-cols-no-gutter".to_string()]
        );
    }
}
