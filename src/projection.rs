//! Column selection and reordering.

use crate::error::{Result, SweeperError};
use crate::table::column_names;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Which columns to keep, and in what order.
///
/// `All` is the default when the user made no selection; `Columns(vec![])`
/// is an explicit choice of no columns.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionSpec {
    #[default]
    All,
    Columns(Vec<String>),
}

impl ProjectionSpec {
    pub fn columns<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Columns(names.into_iter().map(Into::into).collect())
    }

    /// Effective column list for `df`.
    pub fn resolve(&self, df: &DataFrame) -> Vec<String> {
        match self {
            Self::All => column_names(df),
            Self::Columns(names) => names.clone(),
        }
    }
}

/// Keep exactly the selected columns, in the selected order, with every row.
///
/// # Errors
///
/// - [`SweeperError::UnknownColumn`] for the first name the table lacks.
/// - [`SweeperError::DuplicateColumn`] when a name is selected twice.
pub fn project(df: &DataFrame, spec: &ProjectionSpec) -> Result<DataFrame> {
    let ProjectionSpec::Columns(names) = spec else {
        return Ok(df.clone());
    };

    let available: HashSet<String> = column_names(df).into_iter().collect();
    let mut selected = HashSet::with_capacity(names.len());
    for name in names {
        if !available.contains(name) {
            return Err(SweeperError::UnknownColumn(name.clone()));
        }
        if !selected.insert(name.as_str()) {
            return Err(SweeperError::DuplicateColumn(name.clone()));
        }
    }

    Ok(df.select(names.iter().map(String::as_str))?)
}
