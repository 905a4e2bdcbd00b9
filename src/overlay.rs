//! Debug overlay: a toggle button and a fixed layer painting one tinted
//! stripe per grid column with transparent gutters.

use crate::calc::{add, divide, fallback, multiply, subtract, Expr};
use crate::rules::Rule;
use crate::vars::VarRegistry;

const OVERLAY: &str = ".layout-overlay";
const TRANSPARENT: &str = "rgba(0,0,0,0)";

/// Width of one column of the page grid.
fn grid_column(vars: &VarRegistry) -> Expr {
    divide(
        subtract(
            "100%",
            multiply(subtract(&vars.grid_columns, "1"), &vars.inner_gutter),
        ),
        &vars.grid_columns,
    )
}

pub fn overlay_rules(vars: &VarRegistry) -> Vec<Rule> {
    let column = grid_column(vars);
    let column_and_gutter = add(&column, &vars.inner_gutter);
    let tint = vars.grid_column_background.reference();
    let background = format!(
        "repeating-linear-gradient(90deg, {tint}, {tint} {column}, {clear} {column}, {clear} {column_and_gutter})",
        tint = tint,
        column = column,
        clear = TRANSPARENT,
        column_and_gutter = column_and_gutter,
    );
    let toggle = format!("{}-toggle", OVERLAY);

    vec![
        Rule::new(OVERLAY)
            .decl("position", "fixed")
            .decl("z-index", "9999999999")
            .decl("left", "0")
            .decl("bottom", "0")
            .decl("font-size", "0"),
        Rule::new(toggle.as_str())
            .decl("position", "relative")
            .decl("z-index", "2")
            .decl("width", "30px")
            .decl("height", "30px")
            .decl("border", "0")
            .decl("background", "black")
            .decl("color", "transparent")
            .decl("font", "0/0 a")
            .decl("appearance", "none")
            .decl("cursor", "pointer"),
        Rule::new(format!("{t}::before, {t}::after", t = toggle))
            .decl("content", "''")
            .decl("position", "absolute")
            .decl("left", "8px")
            .decl("top", "10px")
            .decl("width", "5px")
            .decl("height", "10px")
            .decl("border-left", "1px solid white")
            .decl("border-right", "1px solid white"),
        Rule::new(format!("{}::after", toggle)).decl("left", "16px"),
        Rule::new(format!("{}-grid", OVERLAY))
            .decl("position", "fixed")
            .decl("z-index", "1")
            .decl("left", "0")
            .decl("right", "0")
            .decl("top", "0")
            .decl("bottom", "0")
            .decl(
                "width",
                subtract(
                    fallback(&vars.container_width, "100%"),
                    multiply(2, fallback(&vars.outer_gutter, "0")),
                )
                .into_string(),
            )
            .decl("height", "100%")
            .decl("margin", "0 auto")
            .decl("background", background)
            .decl("pointer-events", "none"),
    ]
}
