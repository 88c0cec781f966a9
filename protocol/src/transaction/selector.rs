//! UTXO selection.
//!
//! Greedy accumulation in ledger order: walk the candidates exactly as the
//! indexer returned them, add each one to the running total, and stop as
//! soon as the total covers the target. No sorting, no knapsack, no attempt
//! to minimize change or input count. The result therefore depends on
//! candidate order, and callers (and tests) can rely on that.

use super::types::Utxo;
use super::TransactionError;

/// The inputs chosen to fund a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Selected UTXOs, in the order they were supplied.
    pub inputs: Vec<Utxo>,
    /// Sum of `inputs[..].amount` in sompi.
    pub total: u64,
}

/// Selects a prefix of `candidates` whose sum is at least `target` sompi.
///
/// `target` is the payment amount plus fee. The returned selection is
/// minimal in the greedy sense: dropping the last selected input would put
/// the total below `target`.
///
/// # Errors
///
/// [`TransactionError::InsufficientFunds`] when even the sum of every
/// candidate falls short. `available` carries that sum.
pub fn select_utxos(candidates: &[Utxo], target: u64) -> Result<Selection, TransactionError> {
    let mut inputs = Vec::new();
    let mut total: u64 = 0;

    for utxo in candidates {
        total = total
            .checked_add(utxo.amount)
            .ok_or(TransactionError::AmountOverflow)?;
        inputs.push(utxo.clone());
        if total >= target {
            return Ok(Selection { inputs, total });
        }
    }

    Err(TransactionError::InsufficientFunds {
        required: target,
        available: total,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::script::ScriptPublicKey;
    use crate::transaction::types::{Outpoint, TransactionId};

    fn utxo(tag: u8, amount: u64) -> Utxo {
        Utxo::new(
            Outpoint::new(TransactionId::from_bytes([tag; 32]), u32::from(tag)),
            amount,
            ScriptPublicKey::new(0, vec![0x20, tag, 0xac]),
        )
    }

    #[test]
    fn single_utxo_covers_target() {
        let candidates = vec![utxo(1, 150_000_000)];
        let sel = select_utxos(&candidates, 100_010_000).unwrap();
        assert_eq!(sel.inputs, candidates);
        assert_eq!(sel.total, 150_000_000);
    }

    #[test]
    fn accumulates_in_ledger_order_and_stops() {
        let candidates = vec![utxo(1, 30), utxo(2, 50), utxo(3, 1_000), utxo(4, 5)];
        let sel = select_utxos(&candidates, 70).unwrap();
        assert_eq!(sel.inputs.len(), 2);
        assert_eq!(sel.inputs[0].outpoint.index, 1);
        assert_eq!(sel.inputs[1].outpoint.index, 2);
        assert_eq!(sel.total, 80);
    }

    #[test]
    fn result_depends_on_candidate_order() {
        let forward = vec![utxo(1, 10), utxo(2, 100)];
        let backward = vec![utxo(2, 100), utxo(1, 10)];
        assert_eq!(select_utxos(&forward, 50).unwrap().inputs.len(), 2);
        assert_eq!(select_utxos(&backward, 50).unwrap().inputs.len(), 1);
    }

    #[test]
    fn exact_match_stops_immediately() {
        let candidates = vec![utxo(1, 40), utxo(2, 60), utxo(3, 1)];
        let sel = select_utxos(&candidates, 100).unwrap();
        assert_eq!(sel.total, 100);
        assert_eq!(sel.inputs.len(), 2);
    }

    #[test]
    fn greedy_stop_is_minimal() {
        let amounts = [7u64, 3, 19, 2, 11, 5, 23];
        let candidates: Vec<Utxo> = amounts
            .iter()
            .enumerate()
            .map(|(i, &a)| utxo(i as u8, a))
            .collect();
        for target in 1..=amounts.iter().sum::<u64>() {
            let sel = select_utxos(&candidates, target).unwrap();
            assert!(sel.total >= target);
            let last = sel.inputs.last().unwrap().amount;
            assert!(sel.total - last < target, "target {target} over-selected");
        }
    }

    #[test]
    fn insufficient_funds_reports_totals() {
        let candidates = vec![utxo(1, 20_000_000), utxo(2, 30_000_000)];
        let err = select_utxos(&candidates, 100_000_000).unwrap_err();
        assert_eq!(
            err,
            TransactionError::InsufficientFunds {
                required: 100_000_000,
                available: 50_000_000
            }
        );
    }

    #[test]
    fn empty_candidate_set_is_insufficient() {
        assert!(matches!(
            select_utxos(&[], 1),
            Err(TransactionError::InsufficientFunds { available: 0, .. })
        ));
    }

    #[test]
    fn overflow_is_an_error() {
        let candidates = vec![utxo(1, u64::MAX), utxo(2, 1)];
        assert_eq!(
            select_utxos(&candidates, u64::MAX).unwrap().inputs.len(),
            1
        );
        assert_eq!(
            select_utxos(&[utxo(1, u64::MAX - 1), utxo(2, 2)], u64::MAX),
            Err(TransactionError::AmountOverflow)
        );
    }
}
