//! Deterministic keyword classifier
//!
//! Recognises catalog values by phrase match and money / head-count
//! expressions by pattern, and routes by counting binding versus
//! exploratory cues. Needs no network and always answers the same way for
//! the same input.

use super::{ClassificationError, Classifier, DraftValue, ExtractionDraft, StrategyDecision};
use dealscout_core::{FieldSummary, Strategy, ValueCatalog};
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Words that signal binding, literal criteria
const STRICT_CUES: &[&str] = &[
    "exactly",
    "only",
    "must",
    "specifically",
    "strictly",
    "precisely",
    "between",
    "at least",
    "at most",
    "no more than",
    "no less than",
];

/// Words that signal exploratory, conceptual intent
const FLEXIBLE_CUES: &[&str] = &[
    "similar",
    "like",
    "promising",
    "explore",
    "ideas",
    "interesting",
    "inspired",
    "comparable",
    "kind of",
    "sort of",
    "potential",
    "emerging",
    "innovative",
    "hubs",
];

/// Exploratory cues outweigh a single literal mention
const FLEXIBLE_WEIGHT: usize = 2;

const UNIT: &str = r"(k|m|mm|b|bn|thousand|million|billion)?";

/// Plain or decimal amount, or one grouped in thousands ("2,500,000")
const NUMBER: &str = r"(\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)";

static MONEY_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\$\s*{NUMBER}\s*{UNIT}\b\s*(?:-|–|to|and)\s*\$?\s*{NUMBER}\s*{UNIT}\b"
    ))
    .unwrap()
});

static MONEY_LOWER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?:over|above|more than|at least|greater than|minimum of|min)\s+\$\s*{NUMBER}\s*{UNIT}\b"
    ))
    .unwrap()
});

static MONEY_UPPER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?:under|below|less than|at most|up to|maximum of|max)\s+\$\s*{NUMBER}\s*{UNIT}\b"
    ))
    .unwrap()
});

static HEADCOUNT_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s*(?:-|–|to)\s*(\d+)\s+(?:employees|people|staff|person)").unwrap()
});

static HEADCOUNT_LOWER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:over|more than|at least|greater than)\s+(\d+)\s+(?:employees|people|staff)").unwrap()
});

static HEADCOUNT_UPPER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:under|fewer than|less than|at most|up to)\s+(\d+)\s+(?:employees|people|staff)").unwrap()
});

#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }
}

/// Byte offsets of `needle` in `haystack` that sit on word boundaries
fn phrase_spans(haystack: &str, needle: &str) -> Vec<(usize, usize)> {
    if needle.is_empty() {
        return Vec::new();
    }
    let bytes = haystack.as_bytes();
    let is_word = |i: usize| bytes.get(i).map_or(false, |b| b.is_ascii_alphanumeric());

    haystack
        .match_indices(needle)
        .map(|(start, m)| (start, start + m.len()))
        .filter(|&(start, end)| (start == 0 || !is_word(start - 1)) && !is_word(end))
        .collect()
}

fn contains_phrase(haystack: &str, needle: &str) -> bool {
    !phrase_spans(haystack, needle).is_empty()
}

fn scale(unit: Option<&str>) -> f64 {
    match unit {
        Some("k") | Some("thousand") => 1e3,
        Some("m") | Some("mm") | Some("million") => 1e6,
        Some("b") | Some("bn") | Some("billion") => 1e9,
        _ => 1.0,
    }
}

/// A match cut short by a malformed thousands group ("$2,50") is ambiguous
fn truncated(text: &str, end: usize) -> bool {
    let mut rest = text[end..].chars();
    rest.next() == Some(',') && rest.next().map_or(false, |c| c.is_ascii_digit())
}

fn amount(caps: &Captures<'_>, number: usize, unit: Option<&str>) -> Option<f64> {
    let value: f64 = caps.get(number)?.as_str().replace(',', "").parse().ok()?;
    Some(value * scale(unit))
}

/// Money near "revenue" or "mrr" constrains monthly revenue, otherwise funding
fn money_field(text: &str, start: usize, end: usize) -> &'static str {
    let before = text[..start].chars().rev().take(30).collect::<String>();
    let after = text[end..].chars().take(30).collect::<String>();
    let window = format!("{} {}", before.chars().rev().collect::<String>(), after);
    if window.contains("revenue") || window.contains("mrr") {
        "monthly_revenue"
    } else {
        "funding_amount"
    }
}

fn merge_range(draft: &mut ExtractionDraft, field: &str, gte: Option<f64>, lte: Option<f64>) {
    let (old_gte, old_lte) = match draft.fields.get(field) {
        Some(DraftValue::Range { gte, lte }) => (*gte, *lte),
        _ => (None, None),
    };
    draft.insert(
        field,
        DraftValue::Range {
            gte: gte.or(old_gte),
            lte: lte.or(old_lte),
        },
    );
}

impl KeywordClassifier {
    fn extract_numeric(text: &str, draft: &mut ExtractionDraft) {
        let mut claimed: Vec<(usize, usize)> = Vec::new();

        for caps in MONEY_RANGE.captures_iter(text) {
            let Some(m) = caps.get(0) else { continue };
            if truncated(text, m.end()) {
                continue;
            }
            let hi_unit = caps.get(4).map(|u| u.as_str());
            // "$10-15M": the trailing unit applies to both ends
            let lo_unit = caps.get(2).map(|u| u.as_str()).or(hi_unit);
            let field = money_field(text, m.start(), m.end());
            merge_range(draft, field, amount(&caps, 1, lo_unit), amount(&caps, 3, hi_unit));
            claimed.push((m.start(), m.end()));
        }

        let overlaps = |claimed: &[(usize, usize)], s: usize, e: usize| {
            claimed.iter().any(|&(cs, ce)| s < ce && cs < e)
        };

        for caps in MONEY_LOWER.captures_iter(text) {
            let Some(m) = caps.get(0) else { continue };
            if overlaps(claimed.as_slice(), m.start(), m.end()) || truncated(text, m.end()) {
                continue;
            }
            let unit = caps.get(2).map(|u| u.as_str());
            merge_range(draft, money_field(text, m.start(), m.end()), amount(&caps, 1, unit), None);
        }
        for caps in MONEY_UPPER.captures_iter(text) {
            let Some(m) = caps.get(0) else { continue };
            if overlaps(claimed.as_slice(), m.start(), m.end()) || truncated(text, m.end()) {
                continue;
            }
            let unit = caps.get(2).map(|u| u.as_str());
            merge_range(draft, money_field(text, m.start(), m.end()), None, amount(&caps, 1, unit));
        }

        if let Some(caps) = HEADCOUNT_RANGE.captures(text) {
            merge_range(draft, "employee_count", amount(&caps, 1, None), amount(&caps, 2, None));
        }
        if let Some(caps) = HEADCOUNT_LOWER.captures(text) {
            merge_range(draft, "employee_count", amount(&caps, 1, None), None);
        }
        if let Some(caps) = HEADCOUNT_UPPER.captures(text) {
            merge_range(draft, "employee_count", None, amount(&caps, 1, None));
        }
    }

    /// Longest catalog values claim their span first, so "Pre-Seed" wins
    /// over "Seed" and a location inside an investor name is not counted
    /// twice.
    fn extract_categorical(text: &str, catalog: &ValueCatalog, draft: &mut ExtractionDraft) {
        let mut candidates: Vec<(&str, &str)> = catalog
            .fields
            .iter()
            .filter_map(|(field, summary)| match summary {
                FieldSummary::Categorical { values } => Some((field.as_str(), values)),
                FieldSummary::Numeric { .. } => None,
            })
            .flat_map(|(field, values)| values.iter().map(move |v| (field, v.as_str())))
            .collect();
        candidates.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.cmp(b)));

        let mut claimed: Vec<(usize, usize)> = Vec::new();
        for (field, value) in candidates {
            let needle = value.to_lowercase();
            let free = phrase_spans(text, &needle)
                .into_iter()
                .find(|&(s, e)| !claimed.iter().any(|&(cs, ce)| s < ce && cs < e));
            let Some(span) = free else { continue };
            claimed.push(span);

            match draft.fields.get_mut(field) {
                Some(DraftValue::Values(values)) => {
                    if !values.iter().any(|v| v == value) {
                        values.push(value.to_string());
                    }
                }
                _ => draft.insert(field, DraftValue::Values(vec![value.to_string()])),
            }
        }
    }
}

impl Classifier for KeywordClassifier {
    fn classify(
        &self,
        text: &str,
        catalog: &ValueCatalog,
    ) -> Result<StrategyDecision, ClassificationError> {
        let lower = text.to_lowercase();

        let strict_cues: Vec<&str> = STRICT_CUES.iter().copied().filter(|c| contains_phrase(&lower, c)).collect();
        let flexible_cues: Vec<&str> = FLEXIBLE_CUES.iter().copied().filter(|c| contains_phrase(&lower, c)).collect();

        let mut draft = ExtractionDraft::default();
        Self::extract_numeric(&lower, &mut draft);
        Self::extract_categorical(&lower, catalog, &mut draft);
        let named_criteria = draft.fields.len();

        let strict_score = strict_cues.len() + named_criteria;
        let flexible_score = flexible_cues.len() * FLEXIBLE_WEIGHT;

        let decision = if flexible_score > strict_score {
            StrategyDecision::new(
                Strategy::Flexible,
                format!(
                    "exploratory wording ({}) outweighs {} named criteria",
                    flexible_cues.join(", "),
                    named_criteria
                ),
            )
        } else {
            StrategyDecision::new(
                Strategy::Strict,
                format!(
                    "{} named criteria and binding wording ({})",
                    named_criteria,
                    if strict_cues.is_empty() { "none".to_string() } else { strict_cues.join(", ") }
                ),
            )
        };
        Ok(decision)
    }

    fn extract(&self, text: &str, catalog: &ValueCatalog) -> Result<ExtractionDraft, ClassificationError> {
        let lower = text.to_lowercase();
        let mut draft = ExtractionDraft::default();
        Self::extract_numeric(&lower, &mut draft);
        Self::extract_categorical(&lower, catalog, &mut draft);
        Ok(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn catalog() -> ValueCatalog {
        let mut fields = BTreeMap::new();
        let categorical = |values: &[&str]| FieldSummary::Categorical {
            values: values.iter().map(|v| v.to_string()).collect(),
        };
        fields.insert("industry".to_string(), categorical(&["fintech", "healthtech", "AI"]));
        fields.insert("location".to_string(), categorical(&["San Francisco", "New York", "Austin"]));
        fields.insert("funding_stage".to_string(), categorical(&["Seed", "Pre-Seed", "Series A", "Series B"]));
        fields.insert("lead_investor".to_string(), categorical(&["Andreessen Horowitz", "Sequoia"]));
        fields.insert(
            "funding_amount".to_string(),
            FieldSummary::Numeric { min: 5e5, max: 5e7, avg: 8e6 },
        );
        ValueCatalog::new(fields)
    }

    #[test]
    fn test_strict_scenario() {
        let text = "Find exactly Series A fintech startups in San Francisco with funding between $10M-$15M from Andreessen Horowitz";
        let classifier = KeywordClassifier::new();

        let decision = classifier.classify(text, &catalog()).unwrap();
        assert_eq!(decision.strategy, Strategy::Strict);

        let draft = classifier.extract(text, &catalog()).unwrap();
        assert_eq!(draft.fields["funding_stage"], DraftValue::Values(vec!["Series A".to_string()]));
        assert_eq!(draft.fields["industry"], DraftValue::Values(vec!["fintech".to_string()]));
        assert_eq!(draft.fields["location"], DraftValue::Values(vec!["San Francisco".to_string()]));
        assert_eq!(draft.fields["lead_investor"], DraftValue::Values(vec!["Andreessen Horowitz".to_string()]));
        assert_eq!(
            draft.fields["funding_amount"],
            DraftValue::Range { gte: Some(10_000_000.0), lte: Some(15_000_000.0) }
        );
        assert_eq!(draft.fields.len(), 5);
    }

    #[test]
    fn test_flexible_scenario() {
        let text = "Find promising early-stage startups in tech hubs similar to successful fintech companies";
        let decision = KeywordClassifier::new().classify(text, &catalog()).unwrap();
        assert_eq!(decision.strategy, Strategy::Flexible);
        assert!(decision.rationale.contains("promising"));
    }

    #[test]
    fn test_ties_route_strict() {
        let decision = KeywordClassifier::new().classify("startups", &catalog()).unwrap();
        assert_eq!(decision.strategy, Strategy::Strict);
    }

    #[test]
    fn test_longest_value_wins() {
        let draft = KeywordClassifier::new().extract("pre-seed ai companies", &catalog()).unwrap();
        assert_eq!(draft.fields["funding_stage"], DraftValue::Values(vec!["Pre-Seed".to_string()]));
        assert_eq!(draft.fields["industry"], DraftValue::Values(vec!["AI".to_string()]));
    }

    #[test]
    fn test_word_boundaries() {
        // "ai" inside "chain" and "austin" inside "austinite" must not match
        let draft = KeywordClassifier::new().extract("supply chain tools by an austinite", &catalog()).unwrap();
        assert!(draft.fields.is_empty());
    }

    #[test]
    fn test_money_bounds() {
        let classifier = KeywordClassifier::new();
        let draft = classifier.extract("raised over $5M", &catalog()).unwrap();
        assert_eq!(draft.fields["funding_amount"], DraftValue::Range { gte: Some(5e6), lte: None });

        let draft = classifier.extract("under $500k in monthly revenue", &catalog()).unwrap();
        assert_eq!(draft.fields["monthly_revenue"], DraftValue::Range { gte: None, lte: Some(5e5) });

        let draft = classifier.extract("between $1 million and $2.5 million", &catalog()).unwrap();
        assert_eq!(draft.fields["funding_amount"], DraftValue::Range { gte: Some(1e6), lte: Some(2.5e6) });

        let draft = classifier.extract("$10-15M rounds", &catalog()).unwrap();
        assert_eq!(draft.fields["funding_amount"], DraftValue::Range { gte: Some(1e7), lte: Some(1.5e7) });

        let draft = classifier.extract("startups that raised under $2,500,000", &catalog()).unwrap();
        assert_eq!(draft.fields["funding_amount"], DraftValue::Range { gte: None, lte: Some(2.5e6) });

        let draft = classifier.extract("funding over $1,000,000", &catalog()).unwrap();
        assert_eq!(draft.fields["funding_amount"], DraftValue::Range { gte: Some(1e6), lte: None });

        let draft = classifier.extract("between $1,000,000 and $2,000,000", &catalog()).unwrap();
        assert_eq!(draft.fields["funding_amount"], DraftValue::Range { gte: Some(1e6), lte: Some(2e6) });

        let draft = classifier.extract("over $1.5 million and under $3,250,000.50", &catalog()).unwrap();
        assert_eq!(draft.fields["funding_amount"], DraftValue::Range { gte: Some(1.5e6), lte: Some(3_250_000.5) });
    }

    #[test]
    fn test_malformed_thousands_group_is_dropped() {
        let classifier = KeywordClassifier::new();
        for text in ["raised under $2,50 so far", "between $1M and $2,5 in funding"] {
            let draft = classifier.extract(text, &catalog()).unwrap();
            assert!(!draft.fields.contains_key("funding_amount"), "{text}");
        }
    }

    #[test]
    fn test_headcount() {
        let draft = KeywordClassifier::new().extract("teams of 10-50 employees", &catalog()).unwrap();
        assert_eq!(draft.fields["employee_count"], DraftValue::Range { gte: Some(10.0), lte: Some(50.0) });

        let draft = KeywordClassifier::new().extract("fewer than 20 people", &catalog()).unwrap();
        assert_eq!(draft.fields["employee_count"], DraftValue::Range { gte: None, lte: Some(20.0) });
    }
}
