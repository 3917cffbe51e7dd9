// Shared fixtures for unit tests
use dealscout_core::{
    Document, DocumentSchema, Error, MemoryStore, Result, ScoredDocument, SearchStore, StoreQuery,
};

pub fn startup(
    name: &str,
    industry: &str,
    location: &str,
    stage: &str,
    funding: f64,
    investor: &str,
    description: &str,
) -> Document {
    Document {
        company_name: name.to_string(),
        industry: industry.to_string(),
        location: location.to_string(),
        funding_stage: stage.to_string(),
        funding_amount: funding,
        lead_investor: investor.to_string(),
        monthly_revenue: funding / 20.0,
        employee_count: 25,
        business_model: "B2B".to_string(),
        description: description.to_string(),
        founded_year: Some(2020),
        last_funding_date: None,
        other_investors: Vec::new(),
    }
}

/// Seven startups; ids are the company names
pub fn store() -> MemoryStore {
    let store = MemoryStore::new(DocumentSchema::startups());
    for doc in [
        startup("Ledgerly", "fintech", "San Francisco", "Series A", 12.0e6, "Andreessen Horowitz", "Payments infrastructure and ledger APIs for marketplaces"),
        startup("Coinbridge", "fintech", "New York", "Series A", 11.0e6, "Andreessen Horowitz", "Cross-border payments for small businesses"),
        startup("Vaultwise", "fintech", "San Francisco", "Series B", 40.0e6, "Sequoia", "Wealth management platform for millennials"),
        startup("Mediscan", "healthtech", "San Francisco", "Series A", 13.0e6, "Andreessen Horowitz", "AI radiology triage for hospitals"),
        startup("Cropsense", "AI", "Austin", "Seed", 2.0e6, "Y Combinator", "Computer vision for precision agriculture"),
        startup("Seedly", "fintech", "Austin", "Pre-Seed", 0.5e6, "Y Combinator", "Budgeting app for students, a promising early-stage fintech"),
        startup("Tallyhealth", "healthtech", "New York", "Seed", 3.0e6, "Accel", "Billing automation for clinics"),
    ] {
        store.upsert(doc.company_name.as_str().into(), doc);
    }
    store
}

/// Store that is always down
pub struct FailingStore;

impl SearchStore for FailingStore {
    fn search(&self, _: &StoreQuery) -> Result<Vec<ScoredDocument>> {
        Err(Error::Unavailable("search backend down".to_string()))
    }
}

/// Store that fails queries carrying a `must` branch and delegates the rest
pub struct MustFailingStore(pub MemoryStore);

impl SearchStore for MustFailingStore {
    fn search(&self, query: &StoreQuery) -> Result<Vec<ScoredDocument>> {
        if query.must.is_empty() {
            self.0.search(query)
        } else {
            Err(Error::Timeout(100))
        }
    }
}
