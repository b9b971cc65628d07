//! Step model types.
//!
//! A [`Step`] is the unresolved form produced by the parser: literal text
//! fragments interleaved with parameter placeholders. A [`ResolvedStep`] is
//! the execution-ready counterpart whose fragments line up 1:1 with the
//! step's. [`Step::resolve`] folds the two into a single value.

use serde::{Deserialize, Serialize};

/// Parameter kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    #[default]
    Static,
    /// Value supplied at execution time from a data source (e.g. a table row).
    Dynamic,
    SpecialString,
    SpecialTable,
    Table,
}

impl ParameterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Dynamic => "dynamic",
            Self::SpecialString => "special_string",
            Self::SpecialTable => "special_table",
            Self::Table => "table",
        }
    }
}

/// Inline table argument.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// A step parameter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Parameter {
    pub parameter_type: ParameterType,
    pub value: String,
    /// Placeholder name as written in the step (e.g. `<username>`).
    pub name: String,
    pub table: Option<Table>,
}

impl Parameter {
    pub fn new(parameter_type: ParameterType, value: impl Into<String>) -> Self {
        Self {
            parameter_type,
            value: value.into(),
            name: String::new(),
            table: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn is_dynamic(&self) -> bool {
        self.parameter_type == ParameterType::Dynamic
    }
}

/// One piece of a step's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum Fragment {
    Text(String),
    Parameter(Parameter),
}

impl Fragment {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn parameter(&self) -> Option<&Parameter> {
        match self {
            Self::Parameter(p) => Some(p),
            Self::Text(_) => None,
        }
    }
}

/// Unresolved step as parsed from a specification.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Step {
    /// Parameterized text, e.g. `Login as {} with {}`.
    pub value: String,
    /// Text exactly as written in the source file.
    pub line_text: String,
    pub line_no: usize,
    pub fragments: Vec<Fragment>,
}

impl Step {
    pub fn new(line_text: impl Into<String>, fragments: Vec<Fragment>) -> Self {
        let line_text = line_text.into();
        let value = fragments
            .iter()
            .map(|f| match f {
                Fragment::Text(t) => t.as_str(),
                Fragment::Parameter(_) => "{}",
            })
            .collect();
        Self {
            value,
            line_text,
            line_no: 0,
            fragments,
        }
    }

    pub fn with_line_no(mut self, line_no: usize) -> Self {
        self.line_no = line_no;
        self
    }

    /// Produce the execution-ready step.
    ///
    /// Every dynamic parameter takes the value of the index-aligned fragment
    /// in `resolved`. Fragments are paired by position only; a dynamic
    /// parameter without a parameter counterpart keeps its own value. Use
    /// [`ResolvedStep::is_aligned_with`] to detect a shape mismatch first.
    pub fn resolve(&self, resolved: &ResolvedStep) -> Step {
        let mut step = self.clone();
        for (fragment, resolved_fragment) in step.fragments.iter_mut().zip(&resolved.fragments) {
            if let (Fragment::Parameter(param), Fragment::Parameter(resolved_param)) =
                (fragment, resolved_fragment)
            {
                if param.is_dynamic() {
                    param.value.clone_from(&resolved_param.value);
                }
            }
        }
        step
    }

    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.fragments.iter().filter_map(Fragment::parameter)
    }
}

/// Execution-ready step, produced upstream by parameter resolution.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResolvedStep {
    pub actual_text: String,
    pub parsed_text: String,
    pub fragments: Vec<Fragment>,
}

impl ResolvedStep {
    /// Parameters in fragment order.
    pub fn parameters(&self) -> Vec<Parameter> {
        self.fragments
            .iter()
            .filter_map(Fragment::parameter)
            .cloned()
            .collect()
    }

    /// Whether both fragment sequences have the same length and kinds.
    pub fn is_aligned_with(&self, step: &Step) -> bool {
        self.fragments.len() == step.fragments.len()
            && self
                .fragments
                .iter()
                .zip(&step.fragments)
                .all(|(a, b)| std::mem::discriminant(a) == std::mem::discriminant(b))
    }
}
