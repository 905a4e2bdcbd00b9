use std::collections::BTreeSet;
use std::fmt;
use std::ops::Deref;

use crate::class_table::{CLASS_DEFINITIONS, FRACTIONS};
use crate::columns::{generate_by_column, generate_by_fraction};
use crate::config::Config;
use crate::container::{cols_container_rules, container_rules};
use crate::escape::{selector_classes, ClassEscaper};
use crate::grid::grid_layout_rules;
use crate::nesting::nesting_rules;
use crate::overlay::overlay_rules;
use crate::root_vars::root_variable_blocks;
use crate::rules::{LayoutStyles, Rule, RuleBlock};
use crate::vars::VarRegistry;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub minify: bool,
    /// Class names found in content. `None` keeps every component rule.
    pub candidates: Option<BTreeSet<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub css: CssOutput,
    pub rule_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssOutput(String);

impl CssOutput {
    pub fn new(css: String) -> Self {
        Self(css)
    }
}

impl Deref for CssOutput {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0.as_str()
    }
}

impl fmt::Display for CssOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl From<String> for CssOutput {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<CssOutput> for String {
    fn from(value: CssOutput) -> Self {
        value.0
    }
}

/// Every layout rule for `config`, base variables first.
pub fn generate(config: &Config, vars: &VarRegistry, escaper: &dyn ClassEscaper) -> LayoutStyles {
    let breakpoints = config.breakpoints();
    let max_columns = config.max_columns();
    if max_columns == 0 {
        log::warn!("no integer column count configured; column utilities are skipped");
    }
    log::debug!(
        "generating layout for {} breakpoints up to {} columns",
        breakpoints.len(),
        max_columns
    );

    let base = root_variable_blocks(&breakpoints, &config.grid_column_background, vars);

    let mut components = Vec::<Rule>::new();
    components.extend(overlay_rules(vars));
    components.extend(container_rules(vars));
    components.extend(cols_container_rules(vars));
    for cols in 1..=max_columns {
        components.extend(generate_by_column(cols, &CLASS_DEFINITIONS, vars, escaper));
        components.extend(nesting_rules(cols, vars, escaper));
    }
    for fraction in FRACTIONS {
        components.extend(generate_by_fraction(fraction, &CLASS_DEFINITIONS, vars, escaper));
    }
    components.extend(grid_layout_rules(max_columns, vars));

    LayoutStyles {
        base,
        components: components.into_iter().map(RuleBlock::from).collect(),
    }
}

/// Drops component rules whose selector names none of `candidates`. Base
/// rules always survive because components read the variables they define.
pub fn prune(styles: LayoutStyles, candidates: &BTreeSet<String>) -> LayoutStyles {
    let used = |rule: &Rule| {
        selector_classes(&rule.selector)
            .iter()
            .any(|class| candidates.contains(class))
    };

    let components = styles
        .components
        .into_iter()
        .filter_map(|block| match block {
            RuleBlock::Rule(rule) => used(&rule).then_some(RuleBlock::Rule(rule)),
            RuleBlock::Breakpoint { name, query, rules } => {
                let rules = rules.into_iter().filter(|rule| used(rule)).collect::<Vec<_>>();
                (!rules.is_empty()).then_some(RuleBlock::Breakpoint { name, query, rules })
            }
        })
        .collect();

    LayoutStyles {
        base: styles.base,
        components,
    }
}

pub fn build(
    config: &Config,
    vars: &VarRegistry,
    escaper: &dyn ClassEscaper,
    generator: &GeneratorConfig,
) -> GenerationResult {
    let mut styles = generate(config, vars, escaper);
    if let Some(candidates) = generator.candidates.as_ref() {
        let before = styles.rule_count();
        styles = prune(styles, candidates);
        log::debug!(
            "kept {} of {} rules for {} candidates",
            styles.rule_count(),
            before,
            candidates.len()
        );
    }
    emit_css(&styles, generator.minify)
}

pub fn emit_css(styles: &LayoutStyles, minify: bool) -> GenerationResult {
    let blocks = styles
        .base
        .iter()
        .chain(styles.components.iter())
        .filter_map(|block| render_block(block, minify))
        .collect::<Vec<_>>();

    let css = if minify {
        blocks.join("")
    } else {
        blocks.join("\n")
    };

    GenerationResult {
        css: CssOutput::new(css),
        rule_count: styles.rule_count(),
    }
}

enum RuleWrapper<'a> {
    Media(&'a str),
    Screen(&'a str),
}

fn render_block(block: &RuleBlock, minify: bool) -> Option<String> {
    match block {
        RuleBlock::Rule(rule) => render_rule(rule, minify),
        RuleBlock::Breakpoint { name, query, rules } => {
            let inner = rules
                .iter()
                .filter_map(|rule| render_rule(rule, minify))
                .collect::<Vec<_>>();
            if inner.is_empty() {
                return None;
            }
            let body = inner.join(if minify { "" } else { "\n" });
            let wrapper = match query {
                Some(query) => RuleWrapper::Media(query),
                None => RuleWrapper::Screen(name),
            };
            Some(wrap_rule(&wrapper, &body, minify))
        }
    }
}

pub fn render_rule(rule: &Rule, minify: bool) -> Option<String> {
    if rule.declarations.is_empty() {
        return None;
    }
    if minify {
        let body = rule
            .declarations
            .iter()
            .map(|decl| format!("{}:{}", decl.property, decl.value))
            .collect::<Vec<_>>()
            .join(";");
        return Some(format!("{}{{{}}}", rule.selector, body));
    }
    let lines = rule
        .declarations
        .iter()
        .map(|decl| format!("  {}: {};", decl.property, decl.value))
        .collect::<Vec<_>>()
        .join("\n");
    Some(format!("{} {{\n{}\n}}", rule.selector, lines))
}

fn wrap_rule(wrapper: &RuleWrapper<'_>, rule: &str, minify: bool) -> String {
    let header = match wrapper {
        RuleWrapper::Media(query) => format!("@media {}", query),
        RuleWrapper::Screen(name) => format!("@screen {}", name),
    };
    if minify {
        format!("{}{{{}}}", header, rule)
    } else {
        format!("{} {{\n{}\n}}", header, indent_css_block(rule, 2))
    }
}

fn indent_css_block(css: &str, spaces: usize) -> String {
    let padding = " ".repeat(spaces);
    css.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", padding, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::{build, emit_css, generate, prune, render_rule, GeneratorConfig};
    use crate::config::{parse, Config};
    use crate::escape::CssEscaper;
    use crate::resolve::{evaluate, Env};
    use crate::rules::{LayoutStyles, Rule, RuleBlock};
    use crate::vars::VarRegistry;
    use std::collections::BTreeSet;

    fn candidates(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn renders_pretty_and_minified_rules() {
        let rule = Rule::new(".w-1-cols")
            .decl("width", "calc(1px + 2px)")
            .decl("left", "0");
        assert_eq!(
            render_rule(&rule, false).as_deref(),
            Some(".w-1-cols {\n  width: calc(1px + 2px);\n  left: 0;\n}")
        );
        assert_eq!(
            render_rule(&rule, true).as_deref(),
            Some(".w-1-cols{width:calc(1px + 2px);left:0}")
        );
        assert_eq!(render_rule(&Rule::new(".empty"), false), None);
    }

    #[test]
    fn wraps_breakpoints_in_media_or_screen_blocks() {
        let styles = LayoutStyles {
            base: vec![
                Rule::new(":root").decl("--a", "1").into(),
                RuleBlock::Breakpoint {
                    name: "md".to_string(),
                    query: Some("(min-width: 768px)".to_string()),
                    rules: vec![Rule::new(":root").decl("--a", "2")],
                },
                RuleBlock::Breakpoint {
                    name: "tablet".to_string(),
                    query: None,
                    rules: vec![Rule::new(":root").decl("--a", "3")],
                },
            ],
            components: Vec::new(),
        };
        let pretty = emit_css(&styles, false);
        assert_eq!(
            pretty.css.to_string(),
            ":root {\n  --a: 1;\n}\n@media (min-width: 768px) {\n  :root {\n    --a: 2;\n  }\n}\n@screen tablet {\n  :root {\n    --a: 3;\n  }\n}"
        );
        let minified = emit_css(&styles, true);
        assert_eq!(
            &*minified.css,
            ":root{--a:1}@media (min-width: 768px){:root{--a:2}}@screen tablet{:root{--a:3}}"
        );
        assert_eq!(minified.rule_count, 3);
    }

    #[test]
    fn default_config_generates_every_group_in_order() {
        let styles = generate(&Config::default(), &VarRegistry::standard(), &CssEscaper);
        assert_eq!(styles.base.len(), 6);
        // overlay 5, containers 10, cols-container 3, 12 spans of
        // (31 * 3 + 2), 5 fractions of 31 * 2, grid 1 + 13 + 26.
        assert_eq!(styles.rule_count(), 6 + 5 + 10 + 3 + 12 * 95 + 310 + 40);

        let selectors = styles
            .components
            .iter()
            .flat_map(|block| block.rules())
            .map(|rule| rule.selector.as_str())
            .collect::<Vec<_>>();
        let position = |selector: &str| {
            selectors
                .iter()
                .position(|seen| *seen == selector)
                .unwrap_or_else(|| panic!("missing {}", selector))
        };
        assert_eq!(position(".layout-overlay"), 0);
        assert!(position(".layout-overlay-grid") < position(".container"));
        assert!(position(".breakout-reset") < position(".cols-container"));
        assert!(position(".cols-container") < position(".w-1-cols"));
        assert!(position(".w-1-cols-vw > *") < position(".w-2-cols"));
        assert!(position(".w-12-cols-vw > *") < position(".w-1\\/2-cols"));
        assert!(position(".-inset-x-3\\/4-cols-no-gutter") < position(".grid-container"));
        assert_eq!(selectors.last(), Some(&".grid-col-end-13"));
    }

    #[test]
    fn end_to_end_half_width() {
        let config = parse(
            r#"
[container_widths]
DEFAULT = "100%"
[column_counts]
DEFAULT = "4"
[inner_gutters]
DEFAULT = "1rem"
[outer_gutters]
DEFAULT = "1rem"
"#,
        )
        .expect("config should parse");
        let styles = generate(&config, &VarRegistry::standard(), &CssEscaper);
        let env = Env::for_breakpoint(&styles.base, None).expect("root scope");
        let width = styles
            .component(".w-2-cols")
            .and_then(|rule| rule.value("width"))
            .expect("width rule");
        assert_eq!(evaluate(width, &env).expect("evaluates").to_string(), "50% - 0.5rem");
    }

    #[test]
    fn prefixed_registry_flows_through_every_rule() {
        let config = Config {
            prefix: "gf-".to_string(),
            ..Config::default()
        };
        let vars = VarRegistry::with_prefix(&config.prefix);
        let result = build(&config, &vars, &CssEscaper, &GeneratorConfig::default());
        assert!(result.css.contains("--gf-grid-columns: 4;"));
        assert!(result.css.contains("var(--gf-inner-gutter)"));
        assert!(!result.css.contains("var(--inner-gutter)"));
    }

    #[test]
    fn prune_keeps_base_and_matching_components() {
        let styles = generate(&Config::default(), &VarRegistry::standard(), &CssEscaper);
        let base_count = styles.base.len();
        let pruned = prune(styles, &candidates(&["w-1/2-cols", "container"]));
        assert_eq!(pruned.base.len(), base_count);
        let selectors = pruned
            .components
            .iter()
            .flat_map(|block| block.rules())
            .map(|rule| rule.selector.clone())
            .collect::<Vec<_>>();
        assert!(selectors.contains(&".w-1\\/2-cols".to_string()));
        assert!(selectors.contains(&".cols-container > .w-1\\/2-cols".to_string()));
        assert!(selectors.contains(&".container > *".to_string()));
        assert!(!selectors.contains(&".w-2-cols".to_string()));
        assert!(!selectors.contains(&".breakout".to_string()));
    }

    #[test]
    fn build_minifies_and_counts_kept_rules() {
        let generator = GeneratorConfig {
            minify: true,
            candidates: Some(candidates(&["breakout"])),
        };
        let result = build(&Config::default(), &VarRegistry::standard(), &CssEscaper, &generator);
        assert!(result.css.starts_with(":root{--container-width:100%;"));
        assert!(result.css.contains(".breakout{--breakout-outer-gutter:max(var(--outer-gutter), calc((100% - var(--container-width, 100%)) / 2));"));
        assert!(!result.css.contains('\n'));
        // 6 root blocks plus `.breakout` and its four gutter helpers.
        assert_eq!(result.rule_count, 11);
        assert!(!result.css.contains(".breakout-reset"));
    }
}
