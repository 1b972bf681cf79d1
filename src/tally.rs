// Copyright 2020-2026 MathxH Chen.
//
// Code is licensed under MIT Apache Dual License

//! Homomorphic tally: encrypted votes are multiplied into a
//! `[question][answer]` matrix of ciphertexts, trustees publish proven
//! decryption factors for every cell, and the counts are recovered from
//! `g^count` with a precomputed discrete-log table.

use std::collections::HashMap;

use log::{info, warn};
use num_bigint::BigUint;
use num_traits::identities::One;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ballot::{CastVote, Election, EncryptedVote};
use crate::challenge::{ChallengeGenerator, ProofContext};
use crate::dleq::ZKProof;
use crate::elgamal::{Ciphertext, PublicKey, SecretKey};
use crate::error::{Error, Result};
use crate::polynomial::lagrange_coefficient;
use crate::serialize::big_uint_matrix;
use crate::threshold::ThresholdScheme;

/// Sequential powers `base^0, base^1, ...` mapped back to their exponent.
#[derive(Debug, Clone)]
pub struct DLogTable {
    base: BigUint,
    modulus: BigUint,
    table: HashMap<BigUint, usize>,
    last_dlog_result: BigUint,
    counter: usize,
}

impl DLogTable {
    pub fn new(base: &BigUint, modulus: &BigUint) -> Self {
        let mut table = HashMap::new();
        table.insert(BigUint::one(), 0);
        DLogTable {
            base: base.clone(),
            modulus: modulus.clone(),
            table,
            last_dlog_result: BigUint::one(),
            counter: 0,
        }
    }

    pub fn increment(&mut self) {
        self.counter += 1;
        self.last_dlog_result = (&self.last_dlog_result * &self.base) % &self.modulus;
        self.table.insert(self.last_dlog_result.clone(), self.counter);
    }

    /// Extend the table up to and including `base^up_to`.
    pub fn precompute(&mut self, up_to: usize) {
        while self.counter < up_to {
            self.increment();
        }
    }

    pub fn lookup(&self, value: &BigUint) -> Option<usize> {
        self.table.get(value).copied()
    }
}

/// One trustee's contribution to decrypting a tally: a factor and a proof
/// for every cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrusteeDecryption {
    #[serde(with = "big_uint_matrix")]
    pub decryption_factors: Vec<Vec<BigUint>>,
    pub decryption_proofs: Vec<Vec<ZKProof>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub tally: Vec<Vec<Ciphertext>>,
    pub num_tallied: usize,
}

/// Generator for the decryption proof of one cell. Decryption proofs are
/// never bound to a voter.
fn decryption_challenge(
    election: &Election,
    question_index: usize,
    answer_index: usize,
) -> ChallengeGenerator {
    election.datatype.generator(
        ProofContext::new(&election.election_hash, question_index).with_answer(answer_index),
    )
}

impl Tally {
    /// Empty tally, every cell the identity ciphertext.
    pub fn new(election: &Election) -> Self {
        Tally {
            tally: election
                .questions
                .iter()
                .map(|question| vec![Ciphertext::identity(); question.answers.len()])
                .collect(),
            num_tallied: 0,
        }
    }

    fn check_shape(&self, vote: &EncryptedVote) -> Result<()> {
        if vote.answers.len() != self.tally.len() {
            return Err(Error::InvalidVote(format!(
                "{} answers for {} questions",
                vote.answers.len(),
                self.tally.len()
            )));
        }
        for (question_index, (answer, row)) in
            vote.answers.iter().zip(self.tally.iter()).enumerate()
        {
            if answer.choices.len() != row.len() {
                return Err(Error::InvalidVote(format!(
                    "question {} has {} choices, expected {}",
                    question_index,
                    answer.choices.len(),
                    row.len()
                )));
            }
        }
        Ok(())
    }

    fn combine(&self, other: &Tally, pk: &PublicKey) -> Tally {
        Tally {
            tally: self
                .tally
                .iter()
                .zip(other.tally.iter())
                .map(|(row, other_row)| {
                    row.iter()
                        .zip(other_row.iter())
                        .map(|(cell, other_cell)| cell.multiply(other_cell, pk))
                        .collect()
                })
                .collect(),
            num_tallied: self.num_tallied + other.num_tallied,
        }
    }

    fn from_vote(vote: &EncryptedVote) -> Tally {
        Tally {
            tally: vote.answers.iter().map(|answer| answer.choices.clone()).collect(),
            num_tallied: 1,
        }
    }

    /// Fold a vote into the tally. With `verify` the whole vote is checked
    /// first; a rejected vote leaves the tally untouched.
    pub fn add_vote(
        &mut self,
        election: &Election,
        vote: &EncryptedVote,
        voter_alias: Option<&str>,
        verify: bool,
    ) -> Result<()> {
        self.check_shape(vote)?;
        if verify {
            if let Err(e) = vote.check(election, voter_alias) {
                warn!("rejecting vote: {}", e);
                return Err(e);
            }
        }
        *self = self.combine(&Tally::from_vote(vote), &election.public_key);
        Ok(())
    }

    /// Verify a batch in parallel, then fold all of it or none of it.
    pub fn add_vote_batch(
        &mut self,
        election: &Election,
        votes: &[CastVote],
        verify: bool,
    ) -> Result<()> {
        votes
            .par_iter()
            .map(|cast| {
                self.check_shape(&cast.vote)?;
                if verify {
                    cast.vote.check(election, cast.voter_alias.as_deref())?;
                }
                Ok(())
            })
            .collect::<Result<Vec<()>>>()
            .map_err(|e| {
                warn!("rejecting batch of {} votes: {}", votes.len(), e);
                e
            })?;

        let pk = &election.public_key;
        let partial = votes
            .par_iter()
            .map(|cast| Tally::from_vote(&cast.vote))
            .reduce(|| Tally::new(election), |a, b| a.combine(&b, pk));
        *self = self.combine(&partial, pk);
        Ok(())
    }

    /// Add a partial tally of the same election, e.g. one computed by
    /// another worker.
    pub fn merge(&mut self, other: &Tally, election: &Election) -> Result<()> {
        let same_shape = self.tally.len() == other.tally.len()
            && self
                .tally
                .iter()
                .zip(other.tally.iter())
                .all(|(row, other_row)| row.len() == other_row.len());
        if !same_shape {
            return Err(Error::InvalidVote("partial tallies have different shapes".to_string()));
        }
        *self = self.combine(other, &election.public_key);
        Ok(())
    }

    /// `alpha^x` and its Chaum-Pedersen proof for every cell.
    pub fn decryption_factors_and_proofs(
        &self,
        election: &Election,
        sk: &SecretKey,
    ) -> TrusteeDecryption {
        let (decryption_factors, decryption_proofs) = self
            .tally
            .par_iter()
            .enumerate()
            .map(|(question_index, row)| {
                row.iter()
                    .enumerate()
                    .map(|(answer_index, cell)| {
                        let generator =
                            decryption_challenge(election, question_index, answer_index);
                        sk.decryption_factor_and_proof(cell, &generator)
                    })
                    .unzip::<_, _, Vec<BigUint>, Vec<ZKProof>>()
            })
            .collect::<Vec<(Vec<BigUint>, Vec<ZKProof>)>>()
            .into_iter()
            .unzip();

        TrusteeDecryption {
            decryption_factors,
            decryption_proofs,
        }
    }

    /// Check a trustee's submission against its public key. A single bad
    /// cell voids the whole submission.
    pub fn verify_decryption_proofs(
        &self,
        election: &Election,
        decryption: &TrusteeDecryption,
        pk: &PublicKey,
    ) -> Result<()> {
        if decryption.decryption_factors.len() != self.tally.len()
            || decryption.decryption_proofs.len() != self.tally.len()
        {
            return Err(Error::MalformedFactors(format!(
                "expected {} questions",
                self.tally.len()
            )));
        }
        for (question_index, row) in self.tally.iter().enumerate() {
            if decryption.decryption_factors[question_index].len() != row.len()
                || decryption.decryption_proofs[question_index].len() != row.len()
            {
                return Err(Error::MalformedFactors(format!(
                    "expected {} answers for question {}",
                    row.len(),
                    question_index
                )));
            }
        }

        let failed = self
            .tally
            .par_iter()
            .enumerate()
            .find_map_first(|(question_index, row)| {
                row.iter().enumerate().find_map(|(answer_index, cell)| {
                    let factor = &decryption.decryption_factors[question_index][answer_index];
                    let proof = &decryption.decryption_proofs[question_index][answer_index];
                    let generator =
                        decryption_challenge(election, question_index, answer_index);
                    if cell.verify_decryption_factor(factor, proof, pk, &generator) {
                        None
                    } else {
                        Some((question_index, answer_index))
                    }
                })
            });

        match failed {
            Some((question, answer)) => {
                warn!(
                    "decryption factor for question {}, answer {} does not verify",
                    question, answer
                );
                Err(Error::InvalidDecryptionProof { question, answer })
            }
            None => Ok(()),
        }
    }

    /// Recover `g^count` per cell from the combined factor returned by
    /// `combined_factor`, then look the count up.
    fn decrypt_cells<F>(&self, pk: &PublicKey, combined_factor: F) -> Result<Vec<Vec<usize>>>
    where
        F: Fn(usize, usize) -> Result<BigUint>,
    {
        let mut table = DLogTable::new(&pk.g, &pk.p);
        table.precompute(self.num_tallied);

        self.tally
            .iter()
            .enumerate()
            .map(|(question, row)| {
                row.iter()
                    .enumerate()
                    .map(|(answer, cell)| {
                        let factor = combined_factor(question, answer)?;
                        let raw_value =
                            cell.decrypt_with_factors(std::slice::from_ref(&factor), pk)?;
                        table.lookup(&raw_value).ok_or(Error::DiscreteLogNotFound {
                            question,
                            answer,
                            num_tallied: self.num_tallied,
                        })
                    })
                    .collect::<Result<Vec<usize>>>()
            })
            .collect()
    }

    /// Decrypt with the factors of every trustee, `factors[trustee][question][answer]`.
    /// The election key is the product of the trustee keys.
    pub fn decrypt_from_factors(
        &self,
        decryption_factors: &[Vec<Vec<BigUint>>],
        pk: &PublicKey,
    ) -> Result<Vec<Vec<usize>>> {
        let result = self.decrypt_cells(pk, |question, answer| {
            let multiply = |acc: BigUint, trustee: &Vec<Vec<BigUint>>| -> Result<BigUint> {
                let factor = trustee
                    .get(question)
                    .and_then(|row| row.get(answer))
                    .ok_or_else(|| {
                        Error::MalformedFactors(format!(
                            "missing factor for question {}, answer {}",
                            question, answer
                        ))
                    })?;
                Ok((acc * factor) % &pk.p)
            };
            decryption_factors.iter().try_fold(BigUint::one(), multiply)
        })?;
        info!(
            "decrypted tally of {} votes with factors of {} trustees",
            self.num_tallied,
            decryption_factors.len()
        );
        Ok(result)
    }

    /// Decrypt with the factors of at least `k` trustees of the (k, n)
    /// sharing `scheme`, each given with its trustee index. The factors are
    /// combined in the exponent with Lagrange coefficients at zero.
    pub fn decrypt_from_threshold_factors(
        &self,
        partial_decryptions: &[(BigUint, Vec<Vec<BigUint>>)],
        scheme: &ThresholdScheme,
        pk: &PublicKey,
    ) -> Result<Vec<Vec<usize>>> {
        if partial_decryptions.len() < scheme.k {
            return Err(Error::InvalidThreshold {
                k: scheme.k,
                n: partial_decryptions.len(),
            });
        }
        let indices: Vec<BigUint> = partial_decryptions
            .iter()
            .map(|(index, _)| index.clone())
            .collect();
        let coefficients = indices
            .iter()
            .map(|index| lagrange_coefficient(index, &indices, &pk.q))
            .collect::<Result<Vec<BigUint>>>()?;

        let result = self.decrypt_cells(pk, |question, answer| {
            partial_decryptions
                .iter()
                .zip(coefficients.iter())
                .try_fold(
                    BigUint::one(),
                    |acc, ((index, factors), coefficient)| -> Result<BigUint> {
                        let factor = factors
                            .get(question)
                            .and_then(|row| row.get(answer))
                            .ok_or_else(|| {
                                Error::MalformedFactors(format!(
                                    "trustee {} has no factor for question {}, answer {}",
                                    index, question, answer
                                ))
                            })?;
                        Ok((acc * factor.modpow(coefficient, &pk.p)) % &pk.p)
                    },
                )
        })?;
        info!(
            "decrypted tally of {} votes with factors of {} threshold trustees",
            self.num_tallied,
            partial_decryptions.len()
        );
        Ok(result)
    }

    /// Single-key election: decrypt and return the counts together with the
    /// proofs an auditor needs.
    pub fn decrypt_and_prove(
        &self,
        election: &Election,
        sk: &SecretKey,
    ) -> Result<(Vec<Vec<usize>>, TrusteeDecryption)> {
        let decryption = self.decryption_factors_and_proofs(election, sk);
        let counts = self.decrypt_from_factors(
            std::slice::from_ref(&decryption.decryption_factors),
            &sk.public_key,
        )?;
        Ok((counts, decryption))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ballot::Question;
    use crate::challenge::ProofScheme;
    use crate::elgamal::KeyPair;
    use crate::params::CryptoParams;

    fn medium() -> CryptoParams {
        CryptoParams::new(
            BigUint::parse_bytes(b"340282366920938463463374607431768223907", 10).unwrap(),
            BigUint::parse_bytes(b"170141183460469231731687303715884111953", 10).unwrap(),
            BigUint::from(4_u32),
        )
        .unwrap()
    }

    fn election(datatype: ProofScheme) -> (Election, KeyPair) {
        let keypair = medium().generate_keypair();
        let election = Election {
            uuid: "0c1d7e4a-5d5f-4e55-8f0b-2b8a2c6f9d10".to_string(),
            election_hash: "tally-tests".to_string(),
            public_key: keypair.pk.clone(),
            questions: vec![
                Question {
                    answers: vec!["x".to_string(), "y".to_string(), "z".to_string()],
                    min: 0,
                    max: Some(1),
                },
                Question {
                    answers: vec!["p".to_string(), "q".to_string()],
                    min: 0,
                    max: None,
                },
            ],
            datatype,
        };
        (election, keypair)
    }

    fn cast(election: &Election, selections: &[Vec<usize>], alias: &str) -> CastVote {
        let vote =
            EncryptedVote::from_election_and_answers(election, selections, Some(alias)).unwrap();
        CastVote::new(vote.without_audit_data(), Some(alias))
    }

    #[test]
    fn test_dlog_table() {
        let p = BigUint::from(23_u32);
        let mut table = DLogTable::new(&BigUint::from(4_u32), &p);
        assert_eq!(table.lookup(&BigUint::one()), Some(0));
        assert_eq!(table.lookup(&BigUint::from(4_u32)), None);
        table.precompute(3);
        assert_eq!(table.lookup(&BigUint::from(4_u32)), Some(1));
        assert_eq!(table.lookup(&BigUint::from(16_u32)), Some(2));
        assert_eq!(table.lookup(&BigUint::from(18_u32)), Some(3));
        table.precompute(2);
        assert_eq!(table.lookup(&BigUint::from(18_u32)), Some(3));
    }

    #[test]
    fn test_add_vote_and_decrypt() {
        let (election, keypair) = election(ProofScheme::ContextBound);
        let mut tally = Tally::new(&election);
        let votes = vec![
            cast(&election, &[vec![0], vec![0, 1]], "v1"),
            cast(&election, &[vec![2], vec![1]], "v2"),
            cast(&election, &[vec![0], vec![]], "v3"),
        ];
        for vote in &votes {
            tally
                .add_vote(&election, &vote.vote, vote.voter_alias.as_deref(), true)
                .unwrap();
        }
        assert_eq!(tally.num_tallied, 3);

        let (counts, decryption) = tally.decrypt_and_prove(&election, &keypair.sk).unwrap();
        assert_eq!(counts, vec![vec![2, 0, 1], vec![1, 2]]);
        assert!(tally.verify_decryption_proofs(&election, &decryption, &keypair.pk).is_ok());
    }

    #[test]
    fn test_rejected_vote_leaves_tally_untouched() {
        let (election, _) = election(ProofScheme::ContextBound);
        let mut tally = Tally::new(&election);
        let vote = cast(&election, &[vec![1], vec![0]], "v1");
        tally.add_vote(&election, &vote.vote, Some("v1"), true).unwrap();
        let before = tally.clone();

        // bound to another voter
        assert!(tally.add_vote(&election, &vote.vote, Some("v2"), true).is_err());
        let mut short = vote.vote.clone();
        short.answers[1].choices.pop();
        assert!(tally.add_vote(&election, &short, Some("v1"), false).is_err());
        assert_eq!(tally, before);
    }

    #[test]
    fn test_batch_matches_sequential() {
        let (election, keypair) = election(ProofScheme::Legacy);
        let votes: Vec<CastVote> = (0..6)
            .map(|i| cast(&election, &[vec![i % 3], vec![i % 2]], &format!("voter-{}", i)))
            .collect();

        let mut batched = Tally::new(&election);
        batched.add_vote_batch(&election, &votes, true).unwrap();

        let mut sequential = Tally::new(&election);
        for vote in &votes {
            sequential.add_vote(&election, &vote.vote, None, true).unwrap();
        }
        assert_eq!(batched, sequential);
        assert_eq!(
            batched.decrypt_and_prove(&election, &keypair.sk).unwrap().0,
            vec![vec![2, 2, 2], vec![3, 3]]
        );

        // one bad vote rejects the whole batch
        let mut bad = votes.clone();
        bad[4].vote.election_uuid = "another".to_string();
        let mut tally = Tally::new(&election);
        assert!(tally.add_vote_batch(&election, &bad, true).is_err());
        assert_eq!(tally, Tally::new(&election));
    }

    #[test]
    fn test_merge_partial_tallies() {
        let (election, keypair) = election(ProofScheme::Legacy);
        let mut left = Tally::new(&election);
        left.add_vote(&election, &cast(&election, &[vec![0], vec![]], "a").vote, None, true)
            .unwrap();
        let mut right = Tally::new(&election);
        right
            .add_vote(&election, &cast(&election, &[vec![1], vec![1]], "b").vote, None, true)
            .unwrap();

        left.merge(&right, &election).unwrap();
        assert_eq!(left.num_tallied, 2);
        assert_eq!(
            left.decrypt_and_prove(&election, &keypair.sk).unwrap().0,
            vec![vec![1, 1, 0], vec![0, 1]]
        );

        let mut other_shape = right.clone();
        other_shape.tally.pop();
        assert!(left.merge(&other_shape, &election).is_err());
    }

    #[test]
    fn test_tampered_decryption_factor_rejected() {
        let (election, keypair) = election(ProofScheme::ContextBound);
        let mut tally = Tally::new(&election);
        tally
            .add_vote(&election, &cast(&election, &[vec![2], vec![0]], "a").vote, Some("a"), true)
            .unwrap();
        let mut decryption = tally.decryption_factors_and_proofs(&election, &keypair.sk);
        let params = medium();
        decryption.decryption_factors[0][2] =
            (&decryption.decryption_factors[0][2] * &params.g) % &params.p;

        match tally.verify_decryption_proofs(&election, &decryption, &keypair.pk) {
            Err(Error::InvalidDecryptionProof { question, answer }) => {
                assert_eq!((question, answer), (0, 2))
            }
            other => panic!("unexpected {:?}", other),
        }

        decryption.decryption_proofs[1].pop();
        assert!(matches!(
            tally.verify_decryption_proofs(&election, &decryption, &keypair.pk),
            Err(Error::MalformedFactors(_))
        ));
    }

    #[test]
    fn test_missing_discrete_log() {
        let (election, keypair) = election(ProofScheme::Legacy);
        let mut tally = Tally::new(&election);
        tally
            .add_vote(&election, &cast(&election, &[vec![0], vec![0, 1]], "a").vote, None, true)
            .unwrap();
        // accounting drift: the table stops short of the real count
        tally.num_tallied = 0;
        assert!(matches!(
            tally.decrypt_and_prove(&election, &keypair.sk),
            Err(Error::DiscreteLogNotFound { .. })
        ));
    }
}
