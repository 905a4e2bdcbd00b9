//! Symbolic evaluation of generated values.
//!
//! [`Env`] models the custom properties visible on one element: declared
//! values are substituted when they are declared, `inherit`/`unset` copy the
//! parent's value and `initial` clears it, so a `var()` with a fallback sees
//! the property as missing. [`evaluate`] then reduces a value to a linear
//! combination of units such as `50% - 0.5rem`. Terms in different units are
//! never converted into each other.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use cssparser::{
    BasicParseErrorKind, ParseError, ParseErrorKind, Parser, ParserInput, SourcePosition, ToCss,
    Token,
};
use indexmap::IndexMap;
use thiserror::Error;

use crate::escape::selector_classes;
use crate::rules::{Declaration, LayoutStyles, Rule, RuleBlock};

const ROOT_SELECTOR: &str = ":root";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("{name} is not set and has no fallback")]
    Unset { name: String },
    #[error("{name} refers to itself")]
    Cycle { name: String },
    #[error("unbalanced parentheses in `{0}`")]
    Unbalanced(String),
    #[error("unexpected `{token}` at offset {offset}")]
    Unexpected { token: String, offset: usize },
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("cannot multiply `{0}` by `{1}`")]
    NonLinear(String, String),
    #[error("cannot divide by `{0}`")]
    InvalidDivisor(String),
    #[error("cannot compare `{0}` with `{1}`")]
    Incomparable(String, String),
    #[error("unknown breakpoint `{0}`")]
    UnknownBreakpoint(String),
}

/// Computed custom properties of one element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Env {
    values: HashMap<String, String>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    /// A root element declaring `pairs` in order.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let rule = Rule::new(ROOT_SELECTOR).extend(
            pairs
                .into_iter()
                .map(|(name, value)| Declaration::new(name, value)),
        );
        Self::new().descend(&rule)
    }

    /// Child scope with one extra declaration.
    pub fn with(&self, name: &str, value: &str) -> Self {
        self.descend(&Rule::new("*").decl(name, value))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn descend(&self, rule: &Rule) -> Self {
        self.descend_all([rule])
    }

    /// Scope of a child element matched by `rules`, in cascade order.
    pub fn descend_all<'a>(&self, rules: impl IntoIterator<Item = &'a Rule>) -> Self {
        let mut declared = IndexMap::<&str, &str>::new();
        for rule in rules {
            for decl in &rule.declarations {
                if decl.property.starts_with("--") {
                    declared.insert(decl.property.as_str(), decl.value.trim());
                }
            }
        }

        let mut scope = self.values.clone();
        for (&name, &raw) in &declared {
            match raw {
                "inherit" | "unset" => match self.values.get(name) {
                    Some(parent) => {
                        scope.insert(name.to_string(), parent.clone());
                    }
                    None => {
                        scope.remove(name);
                    }
                },
                "initial" => {
                    scope.remove(name);
                }
                _ => {
                    scope.insert(name.to_string(), raw.to_string());
                }
            }
        }

        let lookup = Env { values: scope };
        let mut values = lookup.values.clone();
        for (&name, &raw) in &declared {
            if matches!(raw, "inherit" | "unset" | "initial") {
                continue;
            }
            match resolve_in(raw, &lookup, &mut vec![name.to_string()]) {
                Ok(resolved) => {
                    values.insert(name.to_string(), resolved);
                }
                Err(err) => {
                    log::debug!("{} is invalid at computed-value time: {}", name, err);
                    values.remove(name);
                }
            }
        }
        Env { values }
    }

    /// Root scope at `breakpoint`: the unscoped `:root` rules plus every
    /// breakpoint block up to and including the named one. `None` stops at
    /// the mobile-first tier.
    pub fn for_breakpoint(base: &[RuleBlock], breakpoint: Option<&str>) -> Result<Self, ResolveError> {
        let mut matched = Vec::new();
        let mut found = breakpoint.is_none();
        for block in base {
            match block {
                RuleBlock::Rule(rule) => matched.push(rule),
                RuleBlock::Breakpoint { name, rules, .. } => {
                    if found {
                        break;
                    }
                    matched.extend(rules.iter());
                    found = breakpoint == Some(name.as_str());
                }
            }
        }
        if !found {
            return Err(ResolveError::UnknownBreakpoint(
                breakpoint.unwrap_or_default().to_string(),
            ));
        }
        Ok(Self::new().descend_all(
            matched
                .into_iter()
                .filter(|rule| rule.selector == ROOT_SELECTOR),
        ))
    }
}

/// Every component rule whose selector mentions `class`, with each value
/// reduced in the root scope at `breakpoint`. Values that are not lengths
/// (`flex`, `auto`, gradients) keep their substituted text.
pub fn inspect(
    styles: &LayoutStyles,
    class: &str,
    breakpoint: Option<&str>,
) -> Result<Vec<Rule>, ResolveError> {
    let root = Env::for_breakpoint(&styles.base, breakpoint)?;
    let mut resolved = Vec::new();

    for rule in styles.components.iter().flat_map(RuleBlock::rules) {
        if !selector_classes(&rule.selector).iter().any(|seen| seen == class) {
            continue;
        }
        let scope = root.descend(rule);
        let mut out = Rule::new(rule.selector.as_str());
        for decl in &rule.declarations {
            let value = if decl.property.starts_with("--") {
                scope.get(&decl.property).unwrap_or("initial").to_string()
            } else {
                match evaluate(&decl.value, &scope) {
                    Ok(quantity) => quantity.to_string(),
                    Err(_) => resolve_vars(&decl.value, &scope)?,
                }
            };
            out = out.decl(decl.property.as_str(), value);
        }
        resolved.push(out);
    }

    Ok(resolved)
}

/// Substitutes every `var()` in `value`.
pub fn resolve_vars(value: &str, env: &Env) -> Result<String, ResolveError> {
    resolve_in(value, env, &mut Vec::new())
}

fn resolve_in(value: &str, env: &Env, stack: &mut Vec<String>) -> Result<String, ResolveError> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("var(") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 4..];
        let close = matching_paren(after).ok_or_else(|| ResolveError::Unbalanced(value.to_string()))?;
        out.push_str(&resolve_reference(&after[..close], env, stack)?);
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Offset of the `)` closing an already opened group.
fn matching_paren(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' if depth == 0 => return Some(idx),
            ')' => depth -= 1,
            _ => {}
        }
    }
    None
}

fn resolve_reference(args: &str, env: &Env, stack: &mut Vec<String>) -> Result<String, ResolveError> {
    let (name, fallback) = match args.split_once(',') {
        Some((name, fallback)) => (name.trim(), Some(fallback.trim())),
        None => (args.trim(), None),
    };

    let cyclic = stack.iter().any(|seen| seen == name);
    match env.get(name) {
        Some(raw) if !cyclic => {
            stack.push(name.to_string());
            let resolved = resolve_in(raw, env, stack);
            stack.pop();
            resolved
        }
        _ => match fallback {
            Some(fallback) => resolve_in(fallback, env, stack),
            None if cyclic => Err(ResolveError::Cycle {
                name: name.to_string(),
            }),
            None => Err(ResolveError::Unset {
                name: name.to_string(),
            }),
        },
    }
}

/// A sum of per-unit terms in first-seen unit order. The empty unit holds
/// plain numbers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Quantity {
    terms: Vec<(String, f64)>,
}

impl Quantity {
    pub fn number(value: f64) -> Self {
        Self::unit(value, "")
    }

    pub fn unit(value: f64, unit: &str) -> Self {
        Self {
            terms: vec![(unit.to_string(), value)],
        }
    }

    /// Terms that survive display rounding.
    pub fn terms(&self) -> impl Iterator<Item = (&str, f64)> {
        self.terms
            .iter()
            .map(|(unit, value)| (unit.as_str(), round(*value)))
            .filter(|(_, value)| *value != 0.0)
    }

    pub fn is_zero(&self) -> bool {
        self.terms().next().is_none()
    }

    /// The plain number this quantity equals, if it carries no units.
    pub fn as_number(&self) -> Option<f64> {
        if self.terms().any(|(unit, _)| !unit.is_empty()) {
            return None;
        }
        Some(
            self.terms
                .iter()
                .filter(|(unit, _)| unit.is_empty())
                .map(|(_, value)| value)
                .sum(),
        )
    }

    fn plus(mut self, other: &Quantity) -> Self {
        for (unit, value) in &other.terms {
            match self.terms.iter_mut().find(|(seen, _)| seen == unit) {
                Some((_, total)) => *total += value,
                None => self.terms.push((unit.clone(), *value)),
            }
        }
        self
    }

    fn scale(mut self, factor: f64) -> Self {
        for (_, value) in &mut self.terms {
            *value *= factor;
        }
        self
    }

    fn minus(self, other: &Quantity) -> Self {
        self.plus(&other.clone().scale(-1.0))
    }

    fn times(self, other: Quantity) -> Result<Self, ResolveError> {
        if let Some(factor) = other.as_number() {
            return Ok(self.scale(factor));
        }
        if let Some(factor) = self.as_number() {
            return Ok(other.scale(factor));
        }
        Err(ResolveError::NonLinear(self.to_string(), other.to_string()))
    }

    fn over(self, other: Quantity) -> Result<Self, ResolveError> {
        match other.as_number() {
            Some(divisor) if divisor != 0.0 => Ok(self.scale(1.0 / divisor)),
            _ => Err(ResolveError::InvalidDivisor(other.to_string())),
        }
    }

    /// Sign of `self - other` when the difference has at most one unit.
    fn compare(&self, other: &Quantity) -> Result<Ordering, ResolveError> {
        let diff = self.clone().minus(other);
        let mut terms = diff.terms();
        match (terms.next(), terms.next()) {
            (None, _) => Ok(Ordering::Equal),
            (Some((_, value)), None) => Ok(value.total_cmp(&0.0)),
            _ => Err(ResolveError::Incomparable(self.to_string(), other.to_string())),
        }
    }
}

fn round(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0 + 0.0
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (unit, value) in self.terms() {
            if first {
                write!(f, "{}{}", value, unit)?;
                first = false;
            } else if value < 0.0 {
                write!(f, " - {}{}", -value, unit)?;
            } else {
                write!(f, " + {}{}", value, unit)?;
            }
        }
        if first {
            f.write_str("0")?;
        }
        Ok(())
    }
}

/// Resolves `value` against `env` and reduces it to a [`Quantity`].
pub fn evaluate(value: &str, env: &Env) -> Result<Quantity, ResolveError> {
    let resolved = resolve_vars(value, env)?;
    let mut input = ParserInput::new(&resolved);
    let mut parser = Parser::new(&mut input);
    parser.parse_entirely(sum).map_err(into_resolve_error)
}

type EvalResult<'i, T> = Result<T, ParseError<'i, ResolveError>>;

fn into_resolve_error(err: ParseError<'_, ResolveError>) -> ResolveError {
    let ParseError { kind, location } = err;
    match kind {
        ParseErrorKind::Custom(err) => err,
        ParseErrorKind::Basic(BasicParseErrorKind::EndOfInput) => ResolveError::UnexpectedEnd,
        ParseErrorKind::Basic(BasicParseErrorKind::UnexpectedToken(token)) => ResolveError::Unexpected {
            token: token.to_css_string(),
            offset: location.column.saturating_sub(1) as usize,
        },
        ParseErrorKind::Basic(other) => ResolveError::Unexpected {
            token: format!("{:?}", other),
            offset: location.column.saturating_sub(1) as usize,
        },
    }
}

fn sum<'i>(input: &mut Parser<'i, '_>) -> EvalResult<'i, Quantity> {
    let mut total = product(input)?;
    loop {
        let state = input.state();
        match input.next() {
            Ok(Token::Delim('+')) => total = total.plus(&product(input)?),
            Ok(Token::Delim('-')) => total = total.minus(&product(input)?),
            _ => {
                input.reset(&state);
                return Ok(total);
            }
        }
    }
}

fn product<'i>(input: &mut Parser<'i, '_>) -> EvalResult<'i, Quantity> {
    let mut total = factor(input)?;
    loop {
        let state = input.state();
        let result = match input.next() {
            Ok(Token::Delim('*')) => {
                let rhs = factor(input)?;
                total.times(rhs)
            }
            Ok(Token::Delim('/')) => {
                let rhs = factor(input)?;
                total.over(rhs)
            }
            _ => {
                input.reset(&state);
                return Ok(total);
            }
        };
        match result {
            Ok(next) => total = next,
            Err(err) => return Err(input.new_custom_error(err)),
        }
    }
}

fn factor<'i>(input: &mut Parser<'i, '_>) -> EvalResult<'i, Quantity> {
    input.skip_whitespace();
    let start = input.position();
    let token = input.next()?.clone();
    match token {
        Token::Number { value, .. } => Ok(Quantity::number(exact(input, start, "", value))),
        Token::Percentage { unit_value, .. } => {
            Ok(Quantity::unit(exact(input, start, "%", unit_value * 100.0), "%"))
        }
        Token::Dimension { value, ref unit, .. } => Ok(Quantity::unit(
            exact(input, start, unit, value),
            &unit.to_ascii_lowercase(),
        )),
        Token::Delim('-') => Ok(factor(input)?.scale(-1.0)),
        Token::Delim('+') => factor(input),
        Token::ParenthesisBlock => input.parse_nested_block(|inner| inner.parse_entirely(sum)),
        Token::Function(ref name) if name.eq_ignore_ascii_case("calc") => {
            input.parse_nested_block(|inner| inner.parse_entirely(sum))
        }
        Token::Function(ref name) if name.eq_ignore_ascii_case("max") || name.eq_ignore_ascii_case("min") => {
            let want = if name.eq_ignore_ascii_case("max") {
                Ordering::Greater
            } else {
                Ordering::Less
            };
            input.parse_nested_block(|inner| {
                let mut candidates = inner.parse_comma_separated(sum)?.into_iter();
                let Some(mut best) = candidates.next() else {
                    return Err(inner.new_custom_error(ResolveError::UnexpectedEnd));
                };
                for candidate in candidates {
                    match candidate.compare(&best) {
                        Ok(order) if order == want => best = candidate,
                        Ok(_) => {}
                        Err(err) => return Err(inner.new_custom_error(err)),
                    }
                }
                Ok(best)
            })
        }
        other => Err(input.new_custom_error(ResolveError::Unexpected {
            token: other.to_css_string(),
            offset: start.byte_index(),
        })),
    }
}

/// The numeric token just read, re-read from its source text at `f64`
/// precision. Falls back to the tokenizer's `f32` value.
fn exact(input: &Parser<'_, '_>, start: SourcePosition, unit: &str, fallback: f32) -> f64 {
    let text = input.slice_from(start).trim();
    text.len()
        .checked_sub(unit.len())
        .and_then(|end| text.get(..end))
        .and_then(|number| number.parse::<f64>().ok())
        .unwrap_or(f64::from(fallback))
}

#[cfg(test)]
mod tests {
    use super::{evaluate, inspect, resolve_vars, Env, Quantity, ResolveError};
    use crate::config::Config;
    use crate::escape::CssEscaper;
    use crate::generator::generate;
    use crate::rules::{Rule, RuleBlock};
    use crate::vars::VarRegistry;

    #[test]
    fn substitutes_nested_fallbacks() {
        let env = Env::from_pairs([("--b", "2px")]);
        assert_eq!(
            resolve_vars("calc(var(--a, var(--b, 0)) * 2)", &env).expect("resolves"),
            "calc(2px * 2)"
        );
        assert_eq!(
            resolve_vars("var(--a, var(--c, calc(1px + (2px))))", &env).expect("resolves"),
            "calc(1px + (2px))"
        );
    }

    #[test]
    fn unset_reference_without_fallback_fails() {
        let err = resolve_vars("var(--missing)", &Env::new()).expect_err("unset");
        assert_eq!(
            err,
            ResolveError::Unset {
                name: "--missing".to_string()
            }
        );
        assert_eq!(err.to_string(), "--missing is not set and has no fallback");
    }

    #[test]
    fn unbalanced_reference_fails() {
        let err = resolve_vars("var(--a, (1px)", &Env::new()).expect_err("unbalanced");
        assert!(matches!(err, ResolveError::Unbalanced(_)));
    }

    #[test]
    fn cyclic_declarations_become_unset() {
        let env = Env::from_pairs([("--a", "var(--b)"), ("--b", "var(--a)"), ("--c", "1px")]);
        assert_eq!(env.get("--a"), None);
        assert_eq!(env.get("--b"), None);
        assert_eq!(
            resolve_vars("var(--a, var(--c))", &env).expect("fallback"),
            "1px"
        );
    }

    #[test]
    fn declarations_see_siblings_on_the_same_element() {
        let env = Env::from_pairs([("--total", "calc(var(--one) * 2)"), ("--one", "3px")]);
        assert_eq!(env.get("--total"), Some("calc(3px * 2)"));
    }

    #[test]
    fn keywords_follow_custom_property_inheritance() {
        let parent = Env::from_pairs([("--a", "1px"), ("--b", "unset")]);
        assert_eq!(parent.get("--b"), None);

        let child = parent.descend(
            &Rule::new(".child")
                .decl("--a", "2px")
                .decl("--b", "inherit")
                .decl("--a", "inherit"),
        );
        assert_eq!(child.get("--a"), Some("1px"));
        assert_eq!(child.get("--b"), None);

        let cleared = child.with("--a", "initial");
        assert_eq!(cleared.get("--a"), None);
    }

    #[test]
    fn evaluates_linear_combinations() {
        let env = Env::from_pairs([("--g", "1rem"), ("--cols", "4")]);
        let value = evaluate(
            "calc(((2 / var(--cols)) * 100%) - (var(--g) - ((2 / var(--cols)) * var(--g))))",
            &env,
        )
        .expect("evaluates");
        assert_eq!(value.to_string(), "50% - 0.5rem");
        assert_eq!(evaluate("calc(1rem * -1)", &env).expect("evaluates").to_string(), "-1rem");
        assert_eq!(evaluate("-(2px + 1px)", &env).expect("evaluates").to_string(), "-3px");
        assert!(evaluate("calc(2px - 2px)", &env).expect("evaluates").is_zero());
        assert_eq!(evaluate("calc(2 - 1)", &env).expect("evaluates").as_number(), Some(1.0));
    }

    #[test]
    fn max_and_min_pick_comparable_terms() {
        let env = Env::new();
        assert_eq!(
            evaluate("max(1rem, calc((100% - 100%) / 2))", &env)
                .expect("evaluates")
                .to_string(),
            "1rem"
        );
        assert_eq!(evaluate("min(3px, 2px, 4px)", &env).expect("evaluates").to_string(), "2px");
        assert!(matches!(
            evaluate("max(1rem, 10%)", &env),
            Err(ResolveError::Incomparable(_, _))
        ));
    }

    #[test]
    fn rejects_non_linear_and_unknown_tokens() {
        let env = Env::new();
        assert!(matches!(
            evaluate("calc(1px * 1px)", &env),
            Err(ResolveError::NonLinear(_, _))
        ));
        assert!(matches!(
            evaluate("calc(1px / 0)", &env),
            Err(ResolveError::InvalidDivisor(_))
        ));
        assert_eq!(
            evaluate("calc(undefined * 2)", &env),
            Err(ResolveError::Unexpected {
                token: "undefined".to_string(),
                offset: 5
            })
        );
        assert_eq!(evaluate("calc(1px +", &env), Err(ResolveError::UnexpectedEnd));
    }

    #[test]
    fn displays_terms_in_first_seen_order() {
        let value = Quantity::unit(100.0, "vw").plus(&Quantity::unit(-15.0, "px"));
        assert_eq!(value.to_string(), "100vw - 15px");
        assert_eq!(Quantity::default().to_string(), "0");
        assert_eq!(Quantity::number(1.0 / 3.0).to_string(), "0.333333");
    }

    #[test]
    fn breakpoint_scopes_cascade_mobile_first() {
        let base = vec![
            RuleBlock::Rule(Rule::new(":root").decl("--cols", "4").decl("--g", "1rem")),
            RuleBlock::Breakpoint {
                name: "md".to_string(),
                query: None,
                rules: vec![Rule::new(":root").decl("--cols", "8")],
            },
            RuleBlock::Breakpoint {
                name: "lg".to_string(),
                query: None,
                rules: vec![Rule::new(":root").decl("--cols", "12")],
            },
        ];

        let default = Env::for_breakpoint(&base, None).expect("default");
        assert_eq!(default.get("--cols"), Some("4"));
        let md = Env::for_breakpoint(&base, Some("md")).expect("md");
        assert_eq!(md.get("--cols"), Some("8"));
        assert_eq!(md.get("--g"), Some("1rem"));
        let lg = Env::for_breakpoint(&base, Some("lg")).expect("lg");
        assert_eq!(lg.get("--cols"), Some("12"));
        assert_eq!(
            Env::for_breakpoint(&base, Some("xl")),
            Err(ResolveError::UnknownBreakpoint("xl".to_string()))
        );
    }

    #[test]
    fn inspect_reduces_every_rule_naming_the_class() {
        let styles = generate(&Config::default(), &VarRegistry::standard(), &CssEscaper);
        let rules = inspect(&styles, "w-2-cols", Some("md")).expect("inspects");
        let selectors = rules.iter().map(|rule| rule.selector.as_str()).collect::<Vec<_>>();
        assert_eq!(
            selectors,
            vec![".w-2-cols", ".cols-container > .w-2-cols", ".w-2-cols > *"]
        );
        assert_eq!(rules[0].value("width"), Some("25% - 0.75rem"));
        assert_eq!(rules[2].value("--container-grid-columns"), Some("2"));
    }

    #[test]
    fn inspect_keeps_keyword_values_and_scoped_variables() {
        let styles = generate(&Config::default(), &VarRegistry::standard(), &CssEscaper);
        let rules = inspect(&styles, "breakout", None).expect("inspects");
        let breakout = &rules[0];
        assert_eq!(breakout.selector, ".breakout");
        assert_eq!(breakout.value("position"), Some("relative"));
        assert_eq!(breakout.value("width"), Some("100vw"));
        assert_eq!(
            breakout.value("--breakout-outer-gutter"),
            Some("max(1rem, calc((100% - 100%) / 2))")
        );
        assert!(matches!(
            inspect(&styles, "breakout", Some("tablet")),
            Err(ResolveError::UnknownBreakpoint(_))
        ));
    }
}
