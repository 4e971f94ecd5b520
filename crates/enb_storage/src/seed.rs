use enb_core::lexicon::{starter_pickup_records, STARTER_COMPANIES, STARTER_KEYWORDS};
use enb_core::{LexiconStorage, PickupStorage, Result, SeedPolicy, Storage};
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub keywords: usize,
    pub companies: usize,
    pub pickup_records: usize,
}

/// Fill each empty table with the starter set. Non-empty tables are left alone.
pub async fn apply_seed_policy(storage: &dyn Storage, policy: SeedPolicy) -> Result<SeedReport> {
    let mut report = SeedReport::default();
    if !policy.is_enabled() {
        return Ok(report);
    }

    if storage.list_keywords().await?.is_empty() {
        for word in STARTER_KEYWORDS {
            storage.add_keyword(word).await?;
            report.keywords += 1;
        }
    }

    if storage.list_companies().await?.is_empty() {
        for name in STARTER_COMPANIES {
            storage.add_company(name).await?;
            report.companies += 1;
        }
    }

    if storage.list_pickup_records().await?.is_empty() {
        for record in starter_pickup_records() {
            storage.upsert_pickup_record(&record).await?;
            report.pickup_records += 1;
        }
    }

    if report != SeedReport::default() {
        info!(
            "🌱 Seeded {} keywords, {} companies, {} pickup results",
            report.keywords, report.companies, report.pickup_records
        );
    }
    Ok(report)
}
