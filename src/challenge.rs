// Copyright 2020-2026 MathxH Chen.
//
// Code is licensed under MIT Apache Dual License

//! Challenge generation for the non-interactive proofs.
//!
//! Two strategies exist and they are not interchangeable:
//!
//! - `Legacy`: SHA-1 over the decimal commitments joined by `,`
//!   (`A1,B1,A2,B2,...`), no domain separation.
//! - `ContextBound`: SHA-256 over the same string followed by
//!   `|election_hash|question_index|answer_index|voter_alias`, so a proof
//!   cannot be moved to another election, question, answer or voter.
//!
//! Both are reduced modulo `q`.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::dleq::Commitment;
use crate::util::Util;

/// Which challenge function an election's proofs are built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProofScheme {
    #[serde(rename = "legacy")]
    Legacy,
    #[serde(rename = "2026/01")]
    ContextBound,
}

impl Default for ProofScheme {
    fn default() -> Self {
        ProofScheme::Legacy
    }
}

impl ProofScheme {
    /// Generator for a proof made at `context`. The legacy scheme ignores it.
    pub fn generator(&self, context: ProofContext) -> ChallengeGenerator {
        match self {
            ProofScheme::Legacy => ChallengeGenerator::Legacy,
            ProofScheme::ContextBound => ChallengeGenerator::ContextBound(context),
        }
    }
}

/// Where a proof lives. `answer_index` is `None` for the overall proof of a
/// question and `voter_alias` is `None` for trustee proofs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProofContext {
    pub election_hash: String,
    pub question_index: usize,
    pub answer_index: Option<usize>,
    pub voter_alias: Option<String>,
}

impl ProofContext {
    pub fn new(election_hash: &str, question_index: usize) -> Self {
        ProofContext {
            election_hash: election_hash.to_string(),
            question_index,
            answer_index: None,
            voter_alias: None,
        }
    }

    pub fn with_answer(mut self, answer_index: usize) -> Self {
        self.answer_index = Some(answer_index);
        self
    }

    pub fn with_voter(mut self, voter_alias: Option<&str>) -> Self {
        self.voter_alias = voter_alias.map(str::to_string);
        self
    }

    /// Free-text fields carry their byte length so that a `|` inside them
    /// cannot shift the field boundaries.
    fn suffix(&self) -> String {
        let answer = match self.answer_index {
            Some(index) => index.to_string(),
            None => "overall".to_string(),
        };
        let voter = match &self.voter_alias {
            Some(alias) => format!("{}:{}", alias.len(), alias),
            None => "-".to_string(),
        };
        format!(
            "|{}:{}|{}|{}|{}",
            self.election_hash.len(),
            self.election_hash,
            self.question_index,
            answer,
            voter
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeGenerator {
    Legacy,
    ContextBound(ProofContext),
}

impl ChallengeGenerator {
    /// Challenge over every commitment of a disjunctive proof.
    pub fn disjunctive(&self, commitments: &[Commitment], q: &BigUint) -> BigUint {
        let joined = commitments
            .iter()
            .flat_map(|c| vec![c.a.to_str_radix(10), c.b.to_str_radix(10)])
            .collect::<Vec<String>>()
            .join(",");
        self.hash(joined) % q
    }

    /// Fiat-Shamir challenge for a single `{A, B}` commitment.
    pub fn fiat_shamir(&self, commitment: &Commitment, q: &BigUint) -> BigUint {
        self.disjunctive(std::slice::from_ref(commitment), q)
    }

    /// Challenge for the single-element commitment of a Schnorr proof.
    pub fn dlog(&self, commitment: &BigUint, q: &BigUint) -> BigUint {
        self.hash(commitment.to_str_radix(10)) % q
    }

    fn hash(&self, mut input: String) -> BigUint {
        match self {
            ChallengeGenerator::Legacy => Util::sha1_int(input.as_bytes()),
            ChallengeGenerator::ContextBound(context) => {
                input.push_str(&context.suffix());
                Util::sha256_int(input.as_bytes())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big_q() -> BigUint {
        BigUint::from(1_u32) << 200
    }

    fn commitment(a: u32, b: u32) -> Commitment {
        Commitment {
            a: BigUint::from(a),
            b: BigUint::from(b),
        }
    }

    #[test]
    fn test_legacy_matches_sha1_of_decimal_string() {
        // no reduction when q exceeds the 160-bit digest
        let q = big_q();
        let expected =
            BigUint::parse_bytes(b"194685400614177221585233770227161348260529566374", 10).unwrap();
        assert_eq!(ChallengeGenerator::Legacy.fiat_shamir(&commitment(1, 2), &q), expected);
    }

    #[test]
    fn test_context_changes_challenge() {
        let q = big_q();
        let commitments = vec![commitment(3, 5), commitment(7, 11)];
        let e1 = ChallengeGenerator::ContextBound(ProofContext::new("E1", 0).with_answer(1));
        let e2 = ChallengeGenerator::ContextBound(ProofContext::new("E2", 0).with_answer(1));
        let overall = ChallengeGenerator::ContextBound(ProofContext::new("E1", 0));
        let voter = ChallengeGenerator::ContextBound(
            ProofContext::new("E1", 0).with_answer(1).with_voter(Some("V1")),
        );

        let c1 = e1.disjunctive(&commitments, &q);
        assert_eq!(c1, e1.disjunctive(&commitments, &q));
        assert!(c1 != e2.disjunctive(&commitments, &q));
        assert!(c1 != overall.disjunctive(&commitments, &q));
        assert!(c1 != voter.disjunctive(&commitments, &q));
        assert!(c1 != ChallengeGenerator::Legacy.disjunctive(&commitments, &q));
    }

    #[test]
    fn test_context_suffix_format() {
        let context = ProofContext::new("abc", 2).with_answer(0).with_voter(Some("v"));
        assert_eq!(context.suffix(), "|3:abc|2|0|1:v");
        assert_eq!(ProofContext::new("abc", 2).suffix(), "|3:abc|2|overall|-");
        let empty = ProofContext::new("abc", 2).with_voter(Some(""));
        assert_eq!(empty.suffix(), "|3:abc|2|overall|0:");
    }

    #[test]
    fn test_separator_in_fields_does_not_collide() {
        let q = big_q();
        let commitments = vec![commitment(3, 5)];
        let left = ProofContext::new("h|0", 1).with_answer(2).with_voter(Some("x"));
        let right = ProofContext::new("h", 0).with_answer(1).with_voter(Some("2|x"));
        assert!(left.suffix() != right.suffix());
        assert!(
            ChallengeGenerator::ContextBound(left).disjunctive(&commitments, &q)
                != ChallengeGenerator::ContextBound(right).disjunctive(&commitments, &q)
        );
    }

    #[test]
    fn test_scheme_selects_generator() {
        let context = ProofContext::new("abc", 0);
        assert_eq!(
            ProofScheme::Legacy.generator(context.clone()),
            ChallengeGenerator::Legacy
        );
        assert_eq!(
            ProofScheme::ContextBound.generator(context.clone()),
            ChallengeGenerator::ContextBound(context)
        );
        assert_eq!(serde_json::to_string(&ProofScheme::ContextBound).unwrap(), "\"2026/01\"");
    }

    #[test]
    fn test_challenge_reduced_mod_q() {
        let q = BigUint::from(11_u32);
        let c = ChallengeGenerator::Legacy.dlog(&BigUint::from(16_u32), &q);
        assert!(c < q);
    }
}
