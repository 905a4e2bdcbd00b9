//! The named custom properties shared by every generated rule.
//!
//! Generators never spell a property name themselves; they receive a
//! [`VarRegistry`] and reference its handles, so a renamed or prefixed
//! property stays consistent across the fallback chains.

use std::fmt;

use crate::escape::escape_ident;

/// A CSS custom property handle. Displays as its `var(--name)` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomProperty {
    name: String,
}

impl CustomProperty {
    pub fn new(name: &str) -> Self {
        Self {
            name: format!("--{}", escape_ident(name)),
        }
    }

    /// The property name including the leading `--`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `var(--name)`
    pub fn reference(&self) -> String {
        format!("var({})", self.name)
    }
}

impl fmt::Display for CustomProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "var({})", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarRegistry {
    pub container_width: CustomProperty,
    pub inner_gutter: CustomProperty,
    pub outer_gutter: CustomProperty,
    pub grid_columns: CustomProperty,
    pub grid_column_background: CustomProperty,
    pub container_grid_columns: CustomProperty,
    pub container_outer_gutter: CustomProperty,
    pub breakout_outer_gutter: CustomProperty,
    pub breakout_container_outer_gutter: CustomProperty,
    pub scrollbar_visible_width: CustomProperty,
}

impl VarRegistry {
    pub fn standard() -> Self {
        Self::with_prefix("")
    }

    /// Builds the registry with `prefix` prepended to every property name.
    pub fn with_prefix(prefix: &str) -> Self {
        let var = |name: &str| CustomProperty::new(&format!("{}{}", prefix, name));
        Self {
            container_width: var("container-width"),
            inner_gutter: var("inner-gutter"),
            outer_gutter: var("outer-gutter"),
            grid_columns: var("grid-columns"),
            grid_column_background: var("grid-column-bg"),
            container_grid_columns: var("container-grid-columns"),
            container_outer_gutter: var("container-outer-gutter"),
            breakout_outer_gutter: var("breakout-outer-gutter"),
            breakout_container_outer_gutter: var("breakout-container-outer-gutter"),
            scrollbar_visible_width: var("scrollbar-visible-width"),
        }
    }

    pub fn all(&self) -> [&CustomProperty; 10] {
        [
            &self.container_width,
            &self.inner_gutter,
            &self.outer_gutter,
            &self.grid_columns,
            &self.grid_column_background,
            &self.container_grid_columns,
            &self.container_outer_gutter,
            &self.breakout_outer_gutter,
            &self.breakout_container_outer_gutter,
            &self.scrollbar_visible_width,
        ]
    }
}

impl Default for VarRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
