//! Compiled query shapes

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Retrieval strategy chosen for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Binding criteria: constraints become hard filters
    Strict,
    /// Exploratory intent: constraints only nudge semantic ranking
    Flexible,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Strict => "strict",
            Strategy::Flexible => "flexible",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" | "structured" => Ok(Strategy::Strict),
            "flexible" | "semantic" => Ok(Strategy::Flexible),
            other => Err(format!("unknown strategy: {}", other)),
        }
    }
}

/// A single structured predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Clause {
    /// Field value is one of `values`
    Terms { field: String, values: BTreeSet<String> },
    /// Field value lies within the inclusive bounds
    Range {
        field: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        gte: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lte: Option<f64>,
    },
}

impl Clause {
    pub fn field(&self) -> &str {
        match self {
            Clause::Terms { field, .. } | Clause::Range { field, .. } => field,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum CompiledQuery {
    /// Every clause must hold; the semantic text only orders the survivors
    Filtered {
        clauses: Vec<Clause>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        semantic_text: Option<String>,
    },
    /// Semantic match is required, clauses are soft signals of which at
    /// least `minimum_should_match` must hold
    Scored {
        semantic_text: String,
        should_clauses: Vec<Clause>,
        minimum_should_match: usize,
    },
    SemanticOnly { semantic_text: String },
}

impl CompiledQuery {
    pub fn shape(&self) -> &'static str {
        match self {
            CompiledQuery::Filtered { .. } => "filtered",
            CompiledQuery::Scored { .. } => "scored",
            CompiledQuery::SemanticOnly { .. } => "semantic_only",
        }
    }

    /// Structured clauses, hard or soft
    pub fn clauses(&self) -> &[Clause] {
        match self {
            CompiledQuery::Filtered { clauses, .. } => clauses,
            CompiledQuery::Scored { should_clauses, .. } => should_clauses,
            CompiledQuery::SemanticOnly { .. } => &[],
        }
    }

    pub fn semantic_text(&self) -> Option<&str> {
        match self {
            CompiledQuery::Filtered { semantic_text, .. } => semantic_text.as_deref(),
            CompiledQuery::Scored { semantic_text, .. }
            | CompiledQuery::SemanticOnly { semantic_text } => Some(semantic_text),
        }
    }
}

/// Threshold actually applied to `clause_count` soft signals: never more
/// than the signals available, and at least one when any exist.
#[inline]
pub fn effective_minimum_should_match(requested: usize, clause_count: usize) -> usize {
    if clause_count == 0 {
        0
    } else {
        requested.clamp(1, clause_count)
    }
}
