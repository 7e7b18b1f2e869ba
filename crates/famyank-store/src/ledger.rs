//! # Sale Ledger
//!
//! Committed sales, oldest first. Sales are never edited; the ledger as a
//! whole can only be cleared.

use famyank_core::Sale;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaleLedger {
    sales: Vec<Sale>,
}

impl SaleLedger {
    pub fn sales(&self) -> &[Sale] {
        &self.sales
    }

    pub fn len(&self) -> usize {
        self.sales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sales.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Sale> {
        self.sales.iter().find(|s| s.id == id)
    }

    pub fn append(&mut self, sale: Sale) {
        self.sales.push(sale);
    }

    pub fn reset(&mut self) {
        self.sales.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn sale(id: &str) -> Sale {
        Sale {
            id: id.into(),
            timestamp: DateTime::from_timestamp_millis(1_700_000_000_000).unwrap(),
            items: Vec::new(),
            total_amount_cents: 0,
            total_profit_cents: 0,
            staff_id: "u1".into(),
            staff_name: "Admin Francisca".into(),
        }
    }

    #[test]
    fn test_append_keeps_commit_order() {
        let mut ledger = SaleLedger::default();
        for id in ["SALE-3", "SALE-1", "SALE-2"] {
            ledger.append(sale(id));
        }

        let ids: Vec<_> = ledger.sales().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["SALE-3", "SALE-1", "SALE-2"]);
        assert_eq!(ledger.get("SALE-1").map(|s| s.staff_id.as_str()), Some("u1"));
        assert!(ledger.get("SALE-9").is_none());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut ledger = SaleLedger::default();
        ledger.append(sale("SALE-1"));
        ledger.append(sale("SALE-2"));
        assert_eq!(ledger.len(), 2);

        ledger.reset();
        assert!(ledger.is_empty());
        assert!(ledger.get("SALE-1").is_none());
    }

    #[test]
    fn test_serializes_as_array() {
        let mut ledger = SaleLedger::default();
        ledger.append(sale("SALE-1"));
        let json = serde_json::to_string(&ledger).unwrap();
        assert!(json.starts_with('['));
        let back: SaleLedger = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ledger);
    }
}
