//! Typed output of the generators: ordered declarations grouped by selector.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
}

impl Declaration {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub selector: String,
    pub declarations: Vec<Declaration>,
}

impl Rule {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            declarations: Vec::new(),
        }
    }

    pub fn decl(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.declarations.push(Declaration::new(property, value));
        self
    }

    pub fn with(mut self, declaration: Declaration) -> Self {
        self.declarations.push(declaration);
        self
    }

    pub fn extend(mut self, declarations: impl IntoIterator<Item = Declaration>) -> Self {
        self.declarations.extend(declarations);
        self
    }

    /// Value of the last declaration for `property`, matching cascade order
    /// within a single rule.
    pub fn value(&self, property: &str) -> Option<&str> {
        self.declarations
            .iter()
            .rev()
            .find(|decl| decl.property == property)
            .map(|decl| decl.value.as_str())
    }
}

/// A top-level entry of a rule group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleBlock {
    Rule(Rule),
    /// Rules that only apply from the named breakpoint upwards. `query` is
    /// the resolved media condition when the breakpoint has a known screen.
    Breakpoint {
        name: String,
        query: Option<String>,
        rules: Vec<Rule>,
    },
}

impl RuleBlock {
    pub fn rules(&self) -> &[Rule] {
        match self {
            RuleBlock::Rule(rule) => std::slice::from_ref(rule),
            RuleBlock::Breakpoint { rules, .. } => rules,
        }
    }
}

impl From<Rule> for RuleBlock {
    fn from(rule: Rule) -> Self {
        RuleBlock::Rule(rule)
    }
}

/// Everything one generation pass produces. `base` must be emitted before
/// `components` because component rules read the variables base defines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutStyles {
    pub base: Vec<RuleBlock>,
    pub components: Vec<RuleBlock>,
}

impl LayoutStyles {
    pub fn rule_count(&self) -> usize {
        self.base
            .iter()
            .chain(self.components.iter())
            .map(|block| block.rules().len())
            .sum()
    }

    /// First unscoped component rule with exactly this selector.
    pub fn component(&self, selector: &str) -> Option<&Rule> {
        self.components
            .iter()
            .flat_map(|block| match block {
                RuleBlock::Rule(rule) => std::slice::from_ref(rule),
                RuleBlock::Breakpoint { .. } => &[],
            })
            .find(|rule| rule.selector == selector)
    }
}
