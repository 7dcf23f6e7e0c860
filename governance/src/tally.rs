//! Folding voter choices into a per-candidate tally.

use chief_types::{Address, MkrAmount};
use ethabi::Uint;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::TallyError;

/// One voter's weight and the candidates of the slate they chose.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoterChoice {
    pub voter: Address,
    pub deposits: MkrAmount,
    pub candidates: Arc<[Address]>,
}

/// A voter's share of a candidate's approvals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Contribution {
    pub address: Address,
    pub deposits: MkrAmount,
    /// Share of the candidate's approvals, two decimals, e.g. `"33.33"`.
    pub percent: String,
}

/// Candidate → contributing voters, largest deposit first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VoteTally(BTreeMap<Address, Vec<Contribution>>);

struct Bucket {
    approvals: MkrAmount,
    voters: Vec<(Address, MkrAmount)>,
}

/// `deposits * 100 / approvals`, rounded half-up to two decimals.
///
/// Worked in whole basis points on 256-bit integers, so any pair of `u128`
/// amounts is exact. Zero approvals (every contributor has zero deposits)
/// give zero.
pub fn percent_of(deposits: MkrAmount, approvals: MkrAmount) -> Decimal {
    if approvals.is_zero() {
        return Decimal::ZERO;
    }
    let total = Uint::from(approvals.raw());
    // half-up: floor((2 * deposits * 10_000 + approvals) / (2 * approvals))
    let doubled = Uint::from(deposits.raw()) * Uint::from(20_000u64) + total;
    let basis_points = doubled / (total * Uint::from(2u64));
    Decimal::new(basis_points.low_u64() as i64, 2)
}

impl VoteTally {
    /// Build the tally from every voter's choice.
    ///
    /// A candidate listed twice in one slate counts that voter twice, exactly
    /// as the chief's own approval accounting does.
    pub fn fold(choices: &[VoterChoice]) -> Result<Self, TallyError> {
        let mut buckets: BTreeMap<Address, Bucket> = BTreeMap::new();
        for choice in choices {
            for candidate in choice.candidates.iter() {
                let bucket = buckets.entry(*candidate).or_insert_with(|| Bucket {
                    approvals: MkrAmount::ZERO,
                    voters: Vec::new(),
                });
                bucket.approvals = bucket
                    .approvals
                    .checked_add(choice.deposits)
                    .ok_or_else(|| {
                        TallyError::Arithmetic(format!("approvals overflow for {candidate}"))
                    })?;
                bucket.voters.push((choice.voter, choice.deposits));
            }
        }

        let mut tally = BTreeMap::new();
        for (candidate, mut bucket) in buckets {
            // stable: equal deposits keep discovery order
            bucket.voters.sort_by(|a, b| b.1.cmp(&a.1));
            let contributions = bucket
                .voters
                .into_iter()
                .map(|(address, deposits)| Contribution {
                    address,
                    deposits,
                    percent: format!("{:.2}", percent_of(deposits, bucket.approvals)),
                })
                .collect();
            tally.insert(candidate, contributions);
        }
        Ok(Self(tally))
    }

    pub fn get(&self, candidate: &Address) -> Option<&[Contribution]> {
        self.0.get(candidate).map(Vec::as_slice)
    }

    pub fn candidates(&self) -> impl Iterator<Item = &Address> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, &Vec<Contribution>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<Address, Vec<Contribution>> {
        self.0
    }
}
