use indexmap::IndexMap;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the mobile-first tier. Always ordered first when present.
pub const DEFAULT_BREAKPOINT: &str = "DEFAULT";

pub const DEFAULT_GRID_COLUMN_BACKGROUND: &str = "rgba(127, 255, 255, 0.25)";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub prefix: String,
    pub grid_column_background: String,
    pub screens: IndexMap<String, String>,
    pub container_widths: IndexMap<String, ScalarValue>,
    pub column_counts: IndexMap<String, ScalarValue>,
    pub inner_gutters: IndexMap<String, ScalarValue>,
    pub outer_gutters: IndexMap<String, ScalarValue>,
}

/// A config scalar. TOML lets users write `md = 8` or `md = "8"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Text(text) => f.write_str(text),
            ScalarValue::Integer(value) => write!(f, "{}", value),
            ScalarValue::Float(value) => write!(f, "{}", value),
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Text(value.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// One breakpoint tier with its layout values. `None` marks a value the
/// config does not provide for this tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoint {
    pub name: String,
    pub screen: Option<String>,
    pub container_width: Option<String>,
    pub columns: Option<String>,
    pub inner_gutter: Option<String>,
    pub outer_gutter: Option<String>,
}

pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse(text: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(text)
}

impl Config {
    /// Tiers in emission order: `DEFAULT`, then the configured names in
    /// `[screens]` order so later tiers cascade over narrower ones, then any
    /// name without a screen in the order it first appears across the four
    /// value tables.
    pub fn breakpoints(&self) -> Vec<Breakpoint> {
        let mut configured = Vec::<&str>::new();
        let tables = [
            &self.container_widths,
            &self.column_counts,
            &self.inner_gutters,
            &self.outer_gutters,
        ];
        for table in tables {
            for name in table.keys() {
                if !configured.contains(&name.as_str()) {
                    configured.push(name.as_str());
                }
            }
        }

        let mut names = Vec::<&str>::with_capacity(configured.len());
        let ordered = std::iter::once(DEFAULT_BREAKPOINT)
            .chain(self.screens.keys().map(String::as_str))
            .chain(configured.iter().copied());
        for name in ordered {
            if configured.contains(&name) && !names.contains(&name) {
                names.push(name);
            }
        }

        names
            .into_iter()
            .map(|name| Breakpoint {
                name: name.to_string(),
                screen: self.screens.get(name).cloned(),
                container_width: self.container_widths.get(name).map(ToString::to_string),
                columns: self.column_counts.get(name).map(ToString::to_string),
                inner_gutter: self.inner_gutters.get(name).map(ToString::to_string),
                outer_gutter: self.outer_gutters.get(name).map(ToString::to_string),
            })
            .collect()
    }

    /// Largest integer column count across all tiers; 0 when none parse.
    pub fn max_columns(&self) -> u32 {
        self.column_counts
            .values()
            .filter_map(|value| parse_leading_int(&value.to_string()))
            .filter_map(|count| u32::try_from(count).ok())
            .max()
            .unwrap_or(0)
    }
}

impl Default for Config {
    fn default() -> Self {
        let tiers = ["DEFAULT", "sm", "md", "lg", "xl", "2xl"];
        let table = |values: [&str; 6]| {
            tiers
                .iter()
                .zip(values)
                .map(|(tier, value)| (tier.to_string(), ScalarValue::from(value)))
                .collect::<IndexMap<_, _>>()
        };
        Self {
            prefix: String::new(),
            grid_column_background: DEFAULT_GRID_COLUMN_BACKGROUND.to_string(),
            screens: default_screens(),
            container_widths: table(["100%"; 6]),
            column_counts: table(["4", "4", "8", "12", "12", "12"]),
            inner_gutters: table(["1rem"; 6]),
            outer_gutters: table(["1rem"; 6]),
        }
    }
}

fn default_screens() -> IndexMap<String, String> {
    [
        ("sm", "640px"),
        ("md", "768px"),
        ("lg", "1024px"),
        ("xl", "1280px"),
        ("2xl", "1536px"),
    ]
    .into_iter()
    .map(|(name, width)| (name.to_string(), width.to_string()))
    .collect()
}

/// Integer prefix of `raw` the way a lenient number parser reads it:
/// `"1056px"` is 1056, `"100%"` is 100, `"auto"` is `None`. Digits past the
/// `i64` range saturate.
pub(crate) fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (sign, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let mut value: Option<i64> = None;
    for digit in digits.bytes().take_while(u8::is_ascii_digit) {
        let digit = i64::from(digit - b'0');
        value = Some(value.unwrap_or(0).saturating_mul(10).saturating_add(digit));
    }
    value.map(|value| sign * value)
}
