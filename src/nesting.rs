use crate::calc::assign;
use crate::escape::ClassEscaper;
use crate::rules::Rule;
use crate::vars::VarRegistry;

/// Children of an `n`-column wide element divide by `n` instead of the page
/// column count, so `.w-6-cols > .w-3-cols` spans half the parent.
pub fn nesting_rules(cols: u32, vars: &VarRegistry, escaper: &dyn ClassEscaper) -> Vec<Rule> {
    let class_name = escaper.escape(&format!("w-{}-cols", cols));
    let columns = assign(&vars.container_grid_columns, cols);
    vec![
        Rule::new(format!(".{} > *", class_name)).with(columns.clone()),
        Rule::new(format!(".{}-vw > *", class_name)).with(columns),
    ]
}
