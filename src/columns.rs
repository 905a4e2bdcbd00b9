//! Width expressions for the column-span and fraction utilities, and the
//! rules that carry them.
//!
//! Every class definition yields up to three selectors per variant: the bare
//! class, the class as a direct child of `.cols-container` (whose negative
//! left margin already reserved one gutter) and, for column spans only, a
//! `-vw` class sized against the viewport instead of the parent.

use crate::calc::{self, add, divide, fallback, multiply, negate, subtract, Expr};
use crate::class_table::{ClassDefinition, Fraction};
use crate::escape::ClassEscaper;
use crate::rules::{Declaration, Rule};
use crate::vars::VarRegistry;

pub const COLS_CONTAINER_SELECTOR: &str = ".cols-container";

/// The three width expressions of one variant before class modifiers apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantWidths {
    pub bare: Expr,
    pub container: Expr,
    pub viewport: Option<Expr>,
}

/// Column count the current element divides by: the per-container override
/// when one is in scope, otherwise the page grid.
pub fn effective_columns(vars: &VarRegistry) -> Expr {
    fallback(&vars.container_grid_columns, &vars.grid_columns)
}

/// Share of the other columns' gutters one span gives up:
/// `g - (n / C) * g`.
fn gutter_share(cols: u32, vars: &VarRegistry) -> Expr {
    subtract(
        &vars.inner_gutter,
        multiply(divide(cols, effective_columns(vars)), &vars.inner_gutter),
    )
}

pub fn column_width(cols: u32, vars: &VarRegistry) -> Expr {
    subtract(
        multiply(divide(cols, effective_columns(vars)), "100%"),
        gutter_share(cols, vars),
    )
}

pub fn container_column_width(cols: u32, vars: &VarRegistry) -> Expr {
    subtract(
        multiply(
            divide(cols, effective_columns(vars)),
            subtract("100%", &vars.inner_gutter),
        ),
        gutter_share(cols, vars),
    )
}

pub fn viewport_column_width(cols: u32, vars: &VarRegistry) -> Expr {
    let scrollbar_width = fallback(&vars.scrollbar_visible_width, "0px");
    let single = divide(
        subtract(
            fallback(&vars.container_width, subtract("100vw", scrollbar_width)),
            add(
                multiply(subtract(&vars.grid_columns, "1"), &vars.inner_gutter),
                multiply("2", &vars.outer_gutter),
            ),
        ),
        &vars.grid_columns,
    );

    if cols <= 1 {
        return single;
    }

    add(
        multiply(single, cols),
        multiply(subtract(cols, 1), &vars.inner_gutter),
    )
}

pub fn column_widths(cols: u32, vars: &VarRegistry) -> VariantWidths {
    VariantWidths {
        bare: column_width(cols, vars),
        container: container_column_width(cols, vars),
        viewport: Some(viewport_column_width(cols, vars)),
    }
}

pub fn fraction_widths(fraction: Fraction, vars: &VarRegistry) -> VariantWidths {
    let percent = format!("{}%", fraction.percent());
    let gutter = fallback(&vars.inner_gutter, "0px");
    VariantWidths {
        bare: subtract(
            percent.as_str(),
            multiply(&gutter, fraction.complement()),
        ),
        container: subtract(percent.as_str(), gutter),
        viewport: None,
    }
}

/// Applies a definition's gutter, container-margin and inverse flags.
pub fn apply_modifiers(
    definition: &ClassDefinition,
    widths: VariantWidths,
    vars: &VarRegistry,
) -> VariantWidths {
    let VariantWidths {
        mut bare,
        mut container,
        mut viewport,
    } = widths;

    if definition.add_gutter {
        bare = add(bare, &vars.inner_gutter);
        container = add(container, multiply("2", &vars.inner_gutter));
    }

    if definition.account_for_container_margin_left {
        container = add(container, &vars.inner_gutter);
    }

    if definition.inverse {
        bare = negate(bare);
        container = negate(container);
        viewport = viewport.map(calc::negate);
    }

    VariantWidths {
        bare,
        container,
        viewport,
    }
}

fn fan_out(definition: &ClassDefinition, value: &Expr) -> Vec<Declaration> {
    definition
        .attributes
        .iter()
        .map(|attribute| Declaration::new(attribute.as_str(), value.as_str()))
        .collect()
}

/// Bare, container-nested and (when present) viewport rules for one
/// definition and variant.
pub fn class_rules(
    definition: &ClassDefinition,
    variant: &str,
    widths: VariantWidths,
    vars: &VarRegistry,
    escaper: &dyn ClassEscaper,
) -> Vec<Rule> {
    let widths = apply_modifiers(definition, widths, vars);
    let class_name = escaper.escape(&definition.class_name(variant));

    let mut rules = vec![
        Rule::new(format!(".{}", class_name)).extend(fan_out(definition, &widths.bare)),
        Rule::new(format!("{} > .{}", COLS_CONTAINER_SELECTOR, class_name))
            .extend(fan_out(definition, &widths.container)),
    ];
    if let Some(viewport) = widths.viewport.as_ref() {
        rules.push(Rule::new(format!(".{}-vw", class_name)).extend(fan_out(definition, viewport)));
    }
    rules
}

pub fn generate_by_column(
    cols: u32,
    definitions: &[ClassDefinition],
    vars: &VarRegistry,
    escaper: &dyn ClassEscaper,
) -> Vec<Rule> {
    let variant = cols.to_string();
    definitions
        .iter()
        .flat_map(|definition| {
            class_rules(definition, &variant, column_widths(cols, vars), vars, escaper)
        })
        .collect()
}

pub fn generate_by_fraction(
    fraction: Fraction,
    definitions: &[ClassDefinition],
    vars: &VarRegistry,
    escaper: &dyn ClassEscaper,
) -> Vec<Rule> {
    let variant = fraction.to_string();
    definitions
        .iter()
        .flat_map(|definition| {
            class_rules(
                definition,
                &variant,
                fraction_widths(fraction, vars),
                vars,
                escaper,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        column_width, container_column_width, effective_columns, fraction_widths,
        generate_by_column, generate_by_fraction, viewport_column_width,
    };
    use crate::calc::multiply;
    use crate::class_table::{Fraction, CLASS_DEFINITIONS};
    use crate::escape::CssEscaper;
    use crate::resolve::{evaluate, Env};
    use crate::rules::Rule;
    use crate::vars::VarRegistry;

    fn env(columns: &str, gutter: &str, outer: &str) -> Env {
        Env::from_pairs([
            ("--grid-columns", columns),
            ("--inner-gutter", gutter),
            ("--outer-gutter", outer),
        ])
    }

    fn find<'a>(rules: &'a [Rule], selector: &str) -> &'a Rule {
        rules
            .iter()
            .find(|rule| rule.selector == selector)
            .unwrap_or_else(|| panic!("missing rule {}", selector))
    }

    #[test]
    fn bare_width_expression_text() {
        let vars = VarRegistry::standard();
        assert_eq!(
            column_width(2, &vars).as_str(),
            "calc(((2 / var(--container-grid-columns, var(--grid-columns))) * 100%) - \
             (var(--inner-gutter) - ((2 / var(--container-grid-columns, var(--grid-columns))) * var(--inner-gutter))))"
        );
    }

    #[test]
    fn two_of_four_columns_is_half_minus_half_gutter() {
        let vars = VarRegistry::standard();
        let value = evaluate(column_width(2, &vars).as_str(), &env("4", "1rem", "1rem"))
            .expect("width should evaluate");
        assert_eq!(value.to_string(), "50% - 0.5rem");
    }

    #[test]
    fn container_width_substitutes_the_percentage_base() {
        let vars = VarRegistry::standard();
        let ratio = format!("(2 / {})", effective_columns(&vars));
        let bare = column_width(2, &vars).into_string();
        let container = container_column_width(2, &vars).into_string();
        assert_eq!(
            bare.replacen(
                &format!("{} * 100%", ratio),
                &format!("{} * (100% - var(--inner-gutter))", ratio),
                1
            ),
            container
        );

        let value = evaluate(&container, &env("4", "1rem", "1rem")).expect("evaluates");
        assert_eq!(value.to_string(), "50% - 1rem");
    }

    #[test]
    fn per_container_column_override_wins() {
        let vars = VarRegistry::standard();
        let nested = env("12", "1rem", "1rem").with("--container-grid-columns", "6");
        let value = evaluate(column_width(3, &vars).as_str(), &nested).expect("evaluates");
        assert_eq!(value.to_string(), "50% - 0.5rem");
    }

    #[test]
    fn viewport_width_spans_gutters() {
        let vars = VarRegistry::standard();
        let scope = env("4", "1rem", "1rem").with("--container-width", "1000px");
        let one = evaluate(viewport_column_width(1, &vars).as_str(), &scope).expect("evaluates");
        assert_eq!(one.to_string(), "250px - 1.25rem");
        let two = evaluate(viewport_column_width(2, &vars).as_str(), &scope).expect("evaluates");
        assert_eq!(two.to_string(), "500px - 1.5rem");
    }

    #[test]
    fn viewport_width_falls_back_to_the_viewport() {
        let vars = VarRegistry::standard();
        let value = evaluate(
            viewport_column_width(4, &vars).as_str(),
            &env("4", "1rem", "1rem"),
        )
        .expect("evaluates");
        assert_eq!(value.to_string(), "100vw - 2rem");
    }

    #[test]
    fn fraction_widths_use_truncated_percentages() {
        let vars = VarRegistry::standard();
        let widths = fraction_widths(Fraction::new(1, 3), &vars);
        assert_eq!(
            widths.bare.as_str(),
            "calc(33.333% - (var(--inner-gutter, 0px) * 0.666))"
        );
        assert_eq!(
            widths.container.as_str(),
            "calc(33.333% - var(--inner-gutter, 0px))"
        );
        assert!(widths.viewport.is_none());
    }

    #[test]
    fn emits_bare_container_and_viewport_selectors() {
        let vars = VarRegistry::standard();
        let rules = generate_by_column(3, &CLASS_DEFINITIONS, &vars, &CssEscaper);
        assert_eq!(rules.len(), CLASS_DEFINITIONS.len() * 3);
        find(&rules, ".w-3-cols");
        find(&rules, ".cols-container > .w-3-cols");
        find(&rules, ".w-3-cols-vw");
        find(&rules, ".-inset-x-3-cols-no-gutter-vw");
    }

    #[test]
    fn fractions_skip_the_viewport_selector() {
        let vars = VarRegistry::standard();
        let rules = generate_by_fraction(Fraction::new(1, 2), &CLASS_DEFINITIONS, &vars, &CssEscaper);
        assert_eq!(rules.len(), CLASS_DEFINITIONS.len() * 2);
        find(&rules, ".w-1\\/2-cols");
        find(&rules, ".cols-container > .mx-1\\/2-cols-no-gutter");
        assert!(rules.iter().all(|rule| !rule.selector.ends_with("-vw")));
    }

    #[test]
    fn symmetric_definitions_assign_every_attribute() {
        let vars = VarRegistry::standard();
        let rules = generate_by_column(2, &CLASS_DEFINITIONS, &vars, &CssEscaper);
        let mx = find(&rules, ".mx-2-cols");
        let properties = mx
            .declarations
            .iter()
            .map(|decl| decl.property.as_str())
            .collect::<Vec<_>>();
        assert_eq!(properties, vec!["margin-right", "margin-left"]);
        assert_eq!(mx.declarations[0].value, mx.declarations[1].value);
    }

    #[test]
    fn gutter_modifier_adds_one_gutter_bare_and_two_nested() {
        let vars = VarRegistry::standard();
        let rules = generate_by_column(2, &CLASS_DEFINITIONS, &vars, &CssEscaper);
        let scope = env("4", "1rem", "1rem");
        let bare = evaluate(find(&rules, ".ml-2-cols").declarations[0].value.as_str(), &scope)
            .expect("evaluates");
        assert_eq!(bare.to_string(), "50% + 0.5rem");
        let nested = evaluate(
            find(&rules, ".cols-container > .ml-2-cols").declarations[0].value.as_str(),
            &scope,
        )
        .expect("evaluates");
        assert_eq!(nested.to_string(), "50% + 1rem");
    }

    #[test]
    fn container_margin_modifier_only_touches_the_nested_selector() {
        let vars = VarRegistry::standard();
        let rules = generate_by_column(1, &CLASS_DEFINITIONS, &vars, &CssEscaper);
        assert_eq!(
            find(&rules, ".ml-1-cols-no-gutter").declarations[0].value,
            find(&rules, ".mr-1-cols-no-gutter").declarations[0].value
        );

        let scope = env("4", "1rem", "1rem");
        let value = |selector: &str| {
            evaluate(find(&rules, selector).declarations[0].value.as_str(), &scope)
                .expect("evaluates")
                .to_string()
        };
        assert_eq!(value(".cols-container > .mr-1-cols-no-gutter"), "25% - 1rem");
        assert_eq!(value(".cols-container > .ml-1-cols-no-gutter"), "25%");
    }

    #[test]
    fn inverse_definitions_negate_every_selector() {
        let vars = VarRegistry::standard();
        let rules = generate_by_column(2, &CLASS_DEFINITIONS, &vars, &CssEscaper);
        for (positive, negative) in [
            (".mr-2-cols", ".-mr-2-cols"),
            (".cols-container > .mr-2-cols", ".cols-container > .-mr-2-cols"),
            (".mr-2-cols-vw", ".-mr-2-cols-vw"),
            (".inset-x-2-cols-no-gutter-vw", ".-inset-x-2-cols-no-gutter-vw"),
        ] {
            let expected = multiply(find(&rules, positive).declarations[0].value.as_str(), -1);
            assert_eq!(
                find(&rules, negative).declarations[0].value,
                expected.into_string(),
                "{}",
                negative
            );
        }
    }
}
