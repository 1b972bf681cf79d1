// Copyright 2020-2026 MathxH Chen.
//
// Code is licensed under MIT Apache Dual License

//! Schnorr proof of knowledge of an ElGamal secret key.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::challenge::ChallengeGenerator;
use crate::elgamal::{PublicKey, SecretKey};
use crate::serialize::big_uint;
use crate::util::Util;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DLogProof {
    #[serde(with = "big_uint")]
    pub challenge: BigUint,
    #[serde(with = "big_uint")]
    pub commitment: BigUint,
    #[serde(with = "big_uint")]
    pub response: BigUint,
}

impl SecretKey {
    /// Generate a PoK of the secret key.
    ///
    /// The prover picks w mod q and commits to `g^w mod p`; the challenge is
    /// derived from the commitment and the response is `w + x * c mod q`.
    pub fn prove_sk(&self, challenge_generator: &ChallengeGenerator) -> DLogProof {
        let pk = &self.public_key;
        let w = Util::random_below(&pk.q);
        let commitment = pk.g.modpow(&w, &pk.p);
        let challenge = challenge_generator.dlog(&commitment, &pk.q);
        let response = (w + &self.x * &challenge) % &pk.q;

        DLogProof {
            challenge,
            commitment,
            response,
        }
    }
}

impl PublicKey {
    /// Verify the proof of knowledge of the secret key:
    /// `g^response = commitment * y^challenge` and the challenge is the one
    /// derived from the commitment.
    pub fn verify_sk_proof(
        &self,
        dlog_proof: &DLogProof,
        challenge_generator: &ChallengeGenerator,
    ) -> bool {
        let left_side = self.g.modpow(&dlog_proof.response, &self.p);
        let right_side =
            (&dlog_proof.commitment * self.y.modpow(&dlog_proof.challenge, &self.p)) % &self.p;
        let expected_challenge = challenge_generator.dlog(&dlog_proof.commitment, &self.q);

        left_side == right_side && dlog_proof.challenge == expected_challenge
    }
}
