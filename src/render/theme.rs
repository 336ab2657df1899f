use std::collections::BTreeMap;

use crate::foundation::error::{FlowError, FlowResult};

/// Default values of every theme variable the renderer reads.
pub const DEFAULT_VARS: &[(&str, &str)] = &[
    ("--background-color", "#ffffff"),
    ("--text-color", "#1f2933"),
    ("--muted-text-color", "#7b8794"),
    ("--border-color", "#9aa5b1"),
    ("--token-color", "#4f7cac"),
    ("--new-token-color", "#e07a2e"),
    ("--cell-fill", "#eef1f5"),
    ("--embedding-color", "#7c5cbf"),
    ("--attention-color", "#3d9970"),
    ("--ffn-color", "#c2577a"),
    ("--block-fill", "#f7f8fb"),
    ("--shadow-fill", "#e4e7eb"),
    ("--arrow-color", "#52606d"),
    ("--bar-color", "#8fb3d9"),
    ("--selected-color", "#e07a2e"),
    ("--target-color", "#2e8b57"),
    ("--diff-color", "#b83280"),
    ("--label-bg", "#f0f2f5"),
    ("--label-active-bg", "#ffe8a3"),
    ("--bp-grey-color", "#c5cbd3"),
    ("--bp-green", "#2f9e44"),
    ("--bp-red", "#e03131"),
    ("--font-family", "sans-serif"),
];

/// CSS custom properties the renderer reads colors from. Never written by the core.
///
/// Deserializing a partial map keeps the defaults for every missing variable.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct Theme {
    vars: BTreeMap<String, String>,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            vars: DEFAULT_VARS
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
        }
    }
}

impl From<BTreeMap<String, String>> for Theme {
    fn from(overrides: BTreeMap<String, String>) -> Self {
        let mut theme = Self::default();
        theme.vars.extend(overrides);
        theme
    }
}

impl From<Theme> for BTreeMap<String, String> {
    fn from(theme: Theme) -> Self {
        theme.vars
    }
}

impl Theme {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Resolve a paint value: `--name` is looked up, anything else passes through.
    pub fn resolve<'a>(&'a self, value: &'a str) -> &'a str {
        if value.starts_with("--") {
            self.get(value).unwrap_or("none")
        } else {
            value
        }
    }

    pub fn with_var(mut self, name: &str, value: &str) -> Self {
        self.vars.insert(name.to_owned(), value.to_owned());
        self
    }

    pub fn validate(&self) -> FlowResult<()> {
        for (k, v) in &self.vars {
            if !k.starts_with("--") {
                return Err(FlowError::validation(format!(
                    "theme variable '{k}' must start with '--'"
                )));
            }
            if v.trim().is_empty() || v.contains(['<', '>', '"']) {
                return Err(FlowError::validation(format!(
                    "theme variable '{k}' has an invalid value"
                )));
            }
        }
        Ok(())
    }
}

/// Sizes shared by every draw call.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StyleBag {
    pub font_size: f64,
    pub small_font_size: f64,
    pub cell_font_size: f64,
    pub label_font_size: f64,
    pub stroke_width: f64,
    pub connector_width: f64,
    pub arrow_head: f64,
    /// Radius of the rounded corners on bent arrows.
    pub bend_radius: f64,
}

impl Default for StyleBag {
    fn default() -> Self {
        Self {
            font_size: 14.0,
            small_font_size: 11.0,
            cell_font_size: 10.0,
            label_font_size: 12.0,
            stroke_width: 1.5,
            connector_width: 1.2,
            arrow_head: 6.0,
            bend_radius: 8.0,
        }
    }
}
