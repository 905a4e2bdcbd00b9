use std::fmt;

/// CSS properties the column utilities write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CssProperty {
    Width,
    MarginLeft,
    MarginRight,
    PaddingLeft,
    PaddingRight,
    Left,
    Right,
}

impl CssProperty {
    pub fn as_str(self) -> &'static str {
        match self {
            CssProperty::Width => "width",
            CssProperty::MarginLeft => "margin-left",
            CssProperty::MarginRight => "margin-right",
            CssProperty::PaddingLeft => "padding-left",
            CssProperty::PaddingRight => "padding-right",
            CssProperty::Left => "left",
            CssProperty::Right => "right",
        }
    }
}

impl fmt::Display for CssProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassDefinition {
    pub name: &'static str,
    pub suffix: &'static str,
    pub attributes: &'static [CssProperty],
    pub inverse: bool,
    pub add_gutter: bool,
    /// Carried by the width utility; no calculation reads it.
    pub add_margin_left: bool,
    pub account_for_container_margin_left: bool,
}

impl ClassDefinition {
    const fn new(name: &'static str, suffix: &'static str, attributes: &'static [CssProperty]) -> Self {
        Self {
            name,
            suffix,
            attributes,
            inverse: false,
            add_gutter: false,
            add_margin_left: false,
            account_for_container_margin_left: false,
        }
    }

    const fn inverse(mut self) -> Self {
        self.inverse = true;
        self
    }

    const fn gutter(mut self) -> Self {
        self.add_gutter = true;
        self
    }

    const fn margin_left(mut self) -> Self {
        self.add_margin_left = true;
        self
    }

    const fn container_margin_left(mut self) -> Self {
        self.account_for_container_margin_left = true;
        self
    }

    /// `{name}-{variant}{suffix}`, unescaped.
    pub fn class_name(&self, variant: &str) -> String {
        format!("{}-{}{}", self.name, variant, self.suffix)
    }
}

const COLS: &str = "-cols";
const NO_GUTTER: &str = "-cols-no-gutter";

use CssProperty::{Left, MarginLeft, MarginRight, PaddingLeft, PaddingRight, Right, Width};

const MX: &[CssProperty] = &[MarginRight, MarginLeft];
const PX: &[CssProperty] = &[PaddingRight, PaddingLeft];
const INSET_X: &[CssProperty] = &[Right, Left];

pub static CLASS_DEFINITIONS: [ClassDefinition; 31] = [
    ClassDefinition::new("w", COLS, &[Width]).margin_left(),
    ClassDefinition::new("mr", COLS, &[MarginRight]).gutter(),
    ClassDefinition::new("ml", COLS, &[MarginLeft]).gutter(),
    ClassDefinition::new("mx", COLS, MX).gutter(),
    ClassDefinition::new("-mr", COLS, &[MarginRight]).inverse().gutter(),
    ClassDefinition::new("-ml", COLS, &[MarginLeft]).inverse().gutter(),
    ClassDefinition::new("-mx", COLS, MX).inverse().gutter(),
    ClassDefinition::new("mr", NO_GUTTER, &[MarginRight]),
    ClassDefinition::new("ml", NO_GUTTER, &[MarginLeft]).container_margin_left(),
    ClassDefinition::new("mx", NO_GUTTER, MX),
    ClassDefinition::new("-mr", NO_GUTTER, &[MarginRight]).inverse(),
    ClassDefinition::new("-ml", NO_GUTTER, &[MarginLeft]).inverse(),
    ClassDefinition::new("-mx", NO_GUTTER, MX).inverse(),
    ClassDefinition::new("pr", COLS, &[PaddingRight]).gutter(),
    ClassDefinition::new("pl", COLS, &[PaddingLeft]).gutter(),
    ClassDefinition::new("px", COLS, PX).gutter(),
    ClassDefinition::new("pr", NO_GUTTER, &[PaddingRight]),
    ClassDefinition::new("pl", NO_GUTTER, &[PaddingLeft]),
    ClassDefinition::new("px", NO_GUTTER, PX),
    ClassDefinition::new("left", COLS, &[Left]).gutter(),
    ClassDefinition::new("right", COLS, &[Right]).gutter(),
    ClassDefinition::new("inset-x", COLS, INSET_X).gutter(),
    ClassDefinition::new("left", NO_GUTTER, &[Left]),
    ClassDefinition::new("right", NO_GUTTER, &[Right]),
    ClassDefinition::new("inset-x", NO_GUTTER, INSET_X),
    ClassDefinition::new("-left", COLS, &[Left]).gutter().inverse(),
    ClassDefinition::new("-right", COLS, &[Right]).gutter().inverse(),
    ClassDefinition::new("-inset-x", COLS, INSET_X).gutter().inverse(),
    ClassDefinition::new("-left", NO_GUTTER, &[Left]).inverse(),
    ClassDefinition::new("-right", NO_GUTTER, &[Right]).inverse(),
    ClassDefinition::new("-inset-x", NO_GUTTER, INSET_X).inverse(),
];

/// A proper fraction `numerator/denominator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fraction {
    pub numerator: u32,
    pub denominator: u32,
}

impl Fraction {
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    fn ratio(self) -> f64 {
        f64::from(self.numerator) / f64::from(self.denominator)
    }

    /// The fraction as a percentage truncated to three decimals.
    pub fn percent(self) -> f64 {
        (self.ratio() * 100_000.0).floor() / 1000.0
    }

    /// `1 - fraction`, truncated to three decimals.
    pub fn complement(self) -> f64 {
        ((1.0 - self.ratio()) * 1000.0).floor() / 1000.0
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

pub static FRACTIONS: [Fraction; 5] = [
    Fraction::new(1, 2),
    Fraction::new(1, 3),
    Fraction::new(1, 4),
    Fraction::new(2, 3),
    Fraction::new(3, 4),
];
