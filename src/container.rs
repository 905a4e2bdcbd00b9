//! Flex-row column containers, page containers and full-bleed breakouts.
//!
//! Only the selectors built here write the outer-gutter variables. A nested
//! `.container` reads the chain
//! `breakout-container-outer-gutter -> container-outer-gutter -> outer-gutter -> 0`,
//! and every direct child of a container zeroes the first two links, so an
//! inner container never subtracts the page gutter a second time.

use crate::calc::{assign, divide, fallback, fallback_chain, multiply, subtract, Expr};
use crate::columns::COLS_CONTAINER_SELECTOR;
use crate::rules::Rule;
use crate::vars::VarRegistry;

const CONTAINER: &str = ".container";
const BREAKOUT: &str = ".breakout";

pub fn cols_container_rules(vars: &VarRegistry) -> Vec<Rule> {
    vec![
        Rule::new(COLS_CONTAINER_SELECTOR)
            .decl("display", "flex")
            .decl("flex-flow", "row wrap")
            .decl("margin-left", multiply(&vars.inner_gutter, -1).into_string()),
        Rule::new(format!("{} > [class*=\"-cols\"]", COLS_CONTAINER_SELECTOR))
            .decl("margin-left", vars.inner_gutter.reference()),
        Rule::new(format!("{} > .ml-0", COLS_CONTAINER_SELECTOR)).decl("margin-left", "0px"),
    ]
}

/// The gutter a `.container` subtracts on each side.
pub fn effective_outer_gutter(vars: &VarRegistry) -> Expr {
    fallback_chain(
        &[
            &vars.breakout_container_outer_gutter,
            &vars.container_outer_gutter,
            &vars.outer_gutter,
        ],
        "0",
    )
}

/// Width of the viewport minus any visible scrollbar.
fn visible_viewport(vars: &VarRegistry) -> Expr {
    subtract("100vw", fallback(&vars.scrollbar_visible_width, "0px"))
}

pub fn container_rules(vars: &VarRegistry) -> Vec<Rule> {
    let breakout_gutter = vars.breakout_outer_gutter.reference();
    let breakout_gutter_max = format!(
        "max({}, {})",
        vars.outer_gutter,
        divide(subtract("100%", fallback(&vars.container_width, "100%")), 2)
    );

    vec![
        Rule::new(CONTAINER)
            .decl(
                "width",
                subtract(
                    fallback(&vars.container_width, "100%"),
                    multiply(2, effective_outer_gutter(vars)),
                )
                .into_string(),
            )
            .decl("margin-right", "auto")
            .decl("margin-left", "auto"),
        Rule::new(format!("{} > *", CONTAINER))
            .with(assign(&vars.container_outer_gutter, "0"))
            .with(assign(&vars.breakout_container_outer_gutter, "0")),
        Rule::new(format!("{}-reset", CONTAINER))
            .decl("width", "unset")
            .decl("margin-right", "unset")
            .decl("margin-left", "unset"),
        Rule::new(format!("{}-reset > *", CONTAINER))
            .with(assign(
                &vars.container_outer_gutter,
                fallback(&vars.outer_gutter, "0"),
            ))
            .with(assign(&vars.breakout_container_outer_gutter, "inherit")),
        Rule::new(BREAKOUT)
            .with(assign(&vars.breakout_outer_gutter, breakout_gutter_max))
            .with(assign(&vars.breakout_container_outer_gutter, &vars.outer_gutter))
            .decl("position", "relative")
            .decl("left", "50%")
            .decl("width", visible_viewport(vars).into_string())
            .decl("margin-left", divide(visible_viewport(vars), -2).into_string()),
        Rule::new(outer_gutter_selector("px"))
            .decl("padding-left", breakout_gutter.as_str())
            .decl("padding-right", breakout_gutter.as_str()),
        Rule::new(outer_gutter_selector("pr")).decl("padding-right", breakout_gutter.as_str()),
        Rule::new(outer_gutter_selector("pl")).decl("padding-left", breakout_gutter.as_str()),
        Rule::new(format!("{} > .w-outer-gutter", BREAKOUT)).decl("width", breakout_gutter.as_str()),
        Rule::new(format!("{}-reset", BREAKOUT))
            .with(assign(&vars.breakout_outer_gutter, &vars.outer_gutter))
            .with(assign(&vars.breakout_container_outer_gutter, "0"))
            .decl("position", "unset")
            .decl("left", "unset")
            .decl("width", "unset")
            .decl("margin-left", "unset"),
    ]
}

/// `.breakout.{kind}-outer-gutter, .breakout > .{kind}-outer-gutter`
fn outer_gutter_selector(kind: &str) -> String {
    format!(
        "{b}.{k}-outer-gutter, {b} > .{k}-outer-gutter",
        b = BREAKOUT,
        k = kind
    )
}
