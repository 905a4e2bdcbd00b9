use crate::calc::{assign, fallback};
use crate::rules::Rule;
use crate::vars::VarRegistry;

/// CSS grid counterpart of the flex columns: a `.grid-container` track list
/// plus span, start and end helpers for `1..=max_columns + 1`.
pub fn grid_layout_rules(max_columns: u32, vars: &VarRegistry) -> Vec<Rule> {
    let mut rules = vec![Rule::new(".grid-container")
        .decl("display", "grid")
        .decl(
            "grid-template-columns",
            format!(
                "repeat({}, 1fr)",
                fallback(&vars.container_grid_columns, &vars.grid_columns)
            ),
        )
        .decl("grid-gap", vars.inner_gutter.reference())];

    let lines = 1..=max_columns + 1;
    rules.extend(lines.clone().map(|n| {
        Rule::new(format!(".grid-col-span-{}", n))
            .with(assign(&vars.container_grid_columns, n))
            .decl("grid-column", format!("span {} / span {}", n, n))
    }));
    for n in lines {
        rules.push(Rule::new(format!(".grid-col-start-{}", n)).decl("grid-column-start", n.to_string()));
        rules.push(Rule::new(format!(".grid-col-end-{}", n)).decl("grid-column-end", n.to_string()));
    }
    rules
}

#[cfg(test)]
mod tests {
    use super::grid_layout_rules;
    use crate::vars::VarRegistry;

    #[test]
    fn container_tracks_follow_the_effective_column_count() {
        let rules = grid_layout_rules(4, &VarRegistry::standard());
        assert_eq!(rules[0].selector, ".grid-container");
        assert_eq!(
            rules[0].value("grid-template-columns"),
            Some("repeat(var(--container-grid-columns, var(--grid-columns)), 1fr)")
        );
        assert_eq!(rules[0].value("grid-gap"), Some("var(--inner-gutter)"));
    }

    #[test]
    fn spans_then_line_helpers_up_to_one_past_max() {
        let rules = grid_layout_rules(4, &VarRegistry::standard());
        assert_eq!(rules.len(), 1 + 5 + 10);
        assert_eq!(rules[1].selector, ".grid-col-span-1");
        assert_eq!(rules[5].selector, ".grid-col-span-5");
        assert_eq!(rules[5].value("--container-grid-columns"), Some("5"));
        assert_eq!(rules[5].value("grid-column"), Some("span 5 / span 5"));
        assert_eq!(rules[6].selector, ".grid-col-start-1");
        assert_eq!(rules[7].selector, ".grid-col-end-1");
        assert_eq!(rules[15].selector, ".grid-col-end-5");
        assert_eq!(rules[15].value("grid-column-end"), Some("5"));
    }
}
