use crate::pipeline::SearchOutcome;
use std::fmt::Write;

/// Presentation of a finished search
pub trait ResultRenderer {
    fn render(&self, query: &str, outcome: &SearchOutcome) -> String;
}

/// Markdown report: the query, the strategy taken and one entry per result
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

fn money(amount: f64) -> String {
    if amount >= 1e9 {
        format!("${:.1}B", amount / 1e9)
    } else if amount >= 1e6 {
        format!("${:.1}M", amount / 1e6)
    } else if amount >= 1e3 {
        format!("${:.0}K", amount / 1e3)
    } else {
        format!("${:.0}", amount)
    }
}

impl ResultRenderer for MarkdownRenderer {
    fn render(&self, query: &str, outcome: &SearchOutcome) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "## Results for \"{}\"\n", query);
        let _ = writeln!(
            out,
            "**Strategy:** {} ({})\n",
            outcome.decision.strategy, outcome.decision.rationale
        );

        if outcome.result.is_empty() {
            out.push_str("_No matching companies._\n");
            return out;
        }

        for (i, hit) in outcome.result.hits.iter().enumerate() {
            let doc = &hit.document;
            let _ = writeln!(out, "{}. **{}** ({})", i + 1, doc.company_name, doc.industry);
            let _ = writeln!(
                out,
                "   - {} | {} | {} | lead: {}",
                doc.location,
                doc.funding_stage,
                money(doc.funding_amount),
                doc.lead_investor
            );
            let _ = writeln!(out, "   - score: {:.4}", hit.score);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money() {
        assert_eq!(money(12.5e6), "$12.5M");
        assert_eq!(money(500e3), "$500K");
        assert_eq!(money(2.0e9), "$2.0B");
        assert_eq!(money(10.0), "$10");
    }
}
