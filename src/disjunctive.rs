// Copyright 2020-2026 MathxH Chen.
//
// Code is licensed under MIT Apache Dual License

//! "One of N plaintexts" proofs for a ciphertext.
//!
//! Each candidate plaintext gets a Chaum-Pedersen branch over the DH tuple
//! `(g, y, alpha, beta / m)`. Every branch except the real one is simulated
//! by picking its challenge and response first. The real challenge is what
//! is left of the disjunctive challenge once the simulated ones are
//! subtracted, so all challenges sum to the hash of all commitments.

use log::debug;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::challenge::ChallengeGenerator;
use crate::dleq::{Commitment, Prover, ZKProof};
use crate::elgamal::{Ciphertext, Plaintext, PublicKey};
use crate::error::{Error, Result};
use crate::util::Util;

/// One proof per candidate plaintext. Serializes as a bare list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZKDisjunctiveProof {
    pub proofs: Vec<ZKProof>,
}

impl Ciphertext {
    fn beta_over(&self, plaintext: &Plaintext, pk: &PublicKey) -> Option<BigUint> {
        Util::mod_inverse(&plaintext.m, &pk.p).map(|inverse| (&self.beta * inverse) % &pk.p)
    }

    /// A branch for a plaintext this ciphertext does not (necessarily)
    /// encrypt: challenge and response are sampled and the commitment is
    /// solved for, `A = g^t / alpha^c`, `B = y^t / (beta/m)^c`.
    pub fn simulate_encryption_proof(
        &self,
        plaintext: &Plaintext,
        challenge: Option<BigUint>,
        pk: &PublicKey,
    ) -> Result<ZKProof> {
        let challenge = challenge.unwrap_or_else(|| Util::random_below(&pk.q));
        let response = Util::random_below(&pk.q);

        let beta_over_plaintext = self.beta_over(plaintext, pk).ok_or(Error::NotInvertible)?;
        let alpha_c = Util::mod_inverse(&self.alpha.modpow(&challenge, &pk.p), &pk.p)
            .ok_or(Error::NotInvertible)?;
        let beta_c = Util::mod_inverse(&beta_over_plaintext.modpow(&challenge, &pk.p), &pk.p)
            .ok_or(Error::NotInvertible)?;

        let commitment = Commitment {
            a: (alpha_c * pk.g.modpow(&response, &pk.p)) % &pk.p,
            b: (beta_c * pk.y.modpow(&response, &pk.p)) % &pk.p,
        };

        Ok(ZKProof {
            commitment,
            challenge,
            response,
        })
    }

    /// Prove that this ciphertext, made with `randomness`, encrypts
    /// `plaintexts[real_index]` without revealing the index.
    ///
    /// Phase one simulates every other branch. Phase two commits for the
    /// real branch, derives the disjunctive challenge over all commitments
    /// and gives the real branch whatever challenge makes the sum match.
    pub fn generate_disjunctive_encryption_proof(
        &self,
        plaintexts: &[Plaintext],
        real_index: usize,
        randomness: &BigUint,
        pk: &PublicKey,
        challenge_generator: &ChallengeGenerator,
    ) -> Result<ZKDisjunctiveProof> {
        if real_index >= plaintexts.len() {
            return Err(Error::AnswerOutOfRange {
                index: real_index,
                answers: plaintexts.len(),
            });
        }

        // phase one
        let simulated = plaintexts
            .iter()
            .enumerate()
            .map(|(i, plaintext)| {
                if i == real_index {
                    Ok(None)
                } else {
                    self.simulate_encryption_proof(plaintext, None, pk).map(Some)
                }
            })
            .collect::<Result<Vec<Option<ZKProof>>>>()?;

        // phase two
        let w = Util::random_below(&pk.q);
        let real_commitment = Prover::commit(&pk.g, &pk.y, &w, &pk.p);
        let commitments: Vec<Commitment> = simulated
            .iter()
            .map(|proof| match proof {
                Some(proof) => proof.commitment.clone(),
                None => real_commitment.clone(),
            })
            .collect();
        let disjunctive_challenge = challenge_generator.disjunctive(&commitments, &pk.q);
        let real_challenge = simulated
            .iter()
            .flatten()
            .fold(disjunctive_challenge, |acc, proof| Util::mod_sub(&acc, &proof.challenge, &pk.q));
        let real_proof = ZKProof {
            commitment: real_commitment,
            response: Prover::response(&w, randomness, &real_challenge, &pk.q),
            challenge: real_challenge,
        };

        let mut real_proof = Some(real_proof);
        let proofs = simulated
            .into_iter()
            .filter_map(|proof| proof.or_else(|| real_proof.take()))
            .collect();

        Ok(ZKDisjunctiveProof { proofs })
    }

    /// Checks for the DDH tuple `g, y, alpha, beta/plaintext`
    /// (PoK of the randomness r).
    pub fn verify_encryption_proof(
        &self,
        plaintext: &Plaintext,
        proof: &ZKProof,
        pk: &PublicKey,
    ) -> bool {
        let beta_over_m = match self.beta_over(plaintext, pk) {
            Some(value) => value,
            None => return false,
        };
        proof.verify(&pk.g, &pk.y, &self.alpha, &beta_over_m, &pk.p, &pk.q, None)
    }

    /// Verify every branch, then that the challenges sum to the disjunctive
    /// challenge. Lengths must match; any failing branch rejects the proof.
    pub fn verify_disjunctive_encryption_proof(
        &self,
        plaintexts: &[Plaintext],
        proof: &ZKDisjunctiveProof,
        pk: &PublicKey,
        challenge_generator: &ChallengeGenerator,
    ) -> bool {
        if plaintexts.len() != proof.proofs.len() {
            debug!(
                "bad number of proofs (expected {}, found {})",
                plaintexts.len(),
                proof.proofs.len()
            );
            return false;
        }

        for (i, (plaintext, branch)) in plaintexts.iter().zip(proof.proofs.iter()).enumerate() {
            if !self.verify_encryption_proof(plaintext, branch, pk) {
                debug!("bad proof at branch {}", i);
                return false;
            }
        }

        let commitments: Vec<Commitment> =
            proof.proofs.iter().map(|p| p.commitment.clone()).collect();
        let challenge_sum = proof
            .proofs
            .iter()
            .fold(BigUint::from(0_u32), |acc, p| (acc + &p.challenge) % &pk.q);
        let expected = challenge_generator.disjunctive(&commitments, &pk.q);
        if expected != challenge_sum {
            debug!("disjunctive challenge does not match the sum of challenges");
            return false;
        }
        true
    }
}
