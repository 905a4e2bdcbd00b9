use crate::calc::assign;
use crate::config::{parse_leading_int, Breakpoint};
use crate::rules::{Rule, RuleBlock};
use crate::vars::VarRegistry;

pub const ROOT_SELECTOR: &str = ":root";

/// Placeholder written for a value the breakpoint does not configure.
pub const MISSING_VALUE: &str = "undefined";

/// One `:root` block per breakpoint. The first tier is unscoped and also
/// carries the overlay colour; every later tier is wrapped in its breakpoint.
pub fn root_variable_blocks(
    breakpoints: &[Breakpoint],
    grid_column_background: &str,
    vars: &VarRegistry,
) -> Vec<RuleBlock> {
    breakpoints
        .iter()
        .enumerate()
        .map(|(idx, breakpoint)| {
            let mut rule = Rule::new(ROOT_SELECTOR)
                .with(assign(&vars.container_width, container_width(breakpoint)))
                .with(assign(
                    &vars.inner_gutter,
                    value_or_missing(breakpoint, "inner gutter", &breakpoint.inner_gutter),
                ))
                .with(assign(
                    &vars.outer_gutter,
                    value_or_missing(breakpoint, "outer gutter", &breakpoint.outer_gutter),
                ))
                .with(assign(
                    &vars.grid_columns,
                    value_or_missing(breakpoint, "column count", &breakpoint.columns),
                ));

            if idx == 0 {
                rule = rule.with(assign(&vars.grid_column_background, grid_column_background));
                return RuleBlock::Rule(rule);
            }

            RuleBlock::Breakpoint {
                name: breakpoint.name.clone(),
                query: breakpoint
                    .screen
                    .as_ref()
                    .map(|screen| format!("(min-width: {})", screen)),
                rules: vec![rule],
            }
        })
        .collect()
}

/// The configured width when it starts with a non-zero integer, else `unset`
/// so containers fall back to `100%`.
fn container_width(breakpoint: &Breakpoint) -> &str {
    match breakpoint.container_width.as_deref() {
        Some(width) if parse_leading_int(width).is_some_and(|value| value != 0) => width,
        _ => "unset",
    }
}

fn value_or_missing<'a>(breakpoint: &Breakpoint, what: &str, value: &'a Option<String>) -> &'a str {
    match value.as_deref() {
        Some(value) => value,
        None => {
            log::warn!(
                "breakpoint `{}` has no {}; writing `{}`",
                breakpoint.name,
                what,
                MISSING_VALUE
            );
            MISSING_VALUE
        }
    }
}
