// Copyright 2020-2026 MathxH Chen.
//
// Code is licensed under MIT Apache Dual License

//! Chaum-Pedersen proof that `(g, h, G, H)` is a Diffie-Hellman tuple,
//! i.e. log_g(G) = log_h(H).
//!
//! # Chaum and Pedersen Scheme
//!
//! The prover knows x such that G = g^x and H = h^x:
//!
//! - The prover sends A = g^w and B = h^w, with w ∈ R Zq
//! - The challenge c is derived from the commitment {A, B}
//! - The prover responds with t = w + x*c (mod q)
//! - The verifier checks that g^t = A * G^c and h^t = B * H^c
//!
//! Used for decryption factors (`h = alpha`, `G = y`) and as the branches of
//! the disjunctive encryption proofs (`h = y`, `H = beta / m`).

use num_bigint::BigUint;
use num_traits::identities::One;
use serde::{Deserialize, Serialize};

use crate::challenge::ChallengeGenerator;
use crate::serialize::big_uint;
use crate::util::Util;

/// Internal prover structure for DLEQ proof generation
pub(crate) struct Prover {}

impl Prover {
    /// Send A = g^w, B = h^w
    pub(crate) fn commit(
        little_g: &BigUint,
        little_h: &BigUint,
        w: &BigUint,
        p: &BigUint,
    ) -> Commitment {
        Commitment {
            a: little_g.modpow(w, p),
            b: little_h.modpow(w, p),
        }
    }

    /// Compute response t = w + x*c (mod q)
    pub(crate) fn response(w: &BigUint, x: &BigUint, c: &BigUint, q: &BigUint) -> BigUint {
        (w + x * c) % q
    }
}

/// Internal verifier structure for DLEQ proof verification
struct Verifier {}

impl Verifier {
    /// base^t == commitment * target^c (mod p)
    fn check(
        base: &BigUint,
        target: &BigUint,
        commitment: &BigUint,
        challenge: &BigUint,
        response: &BigUint,
        p: &BigUint,
    ) -> bool {
        base.modpow(response, p) == (commitment * target.modpow(challenge, p)) % p
    }
}

/// Prover's first message `{A, B}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Commitment {
    #[serde(rename = "A", with = "big_uint")]
    pub a: BigUint,
    #[serde(rename = "B", with = "big_uint")]
    pub b: BigUint,
}

impl Commitment {
    /// Both halves lie in the order-q subgroup.
    pub fn in_subgroup(&self, p: &BigUint, q: &BigUint) -> bool {
        self.a < *p && self.b < *p && self.a.modpow(q, p).is_one() && self.b.modpow(q, p).is_one()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZKProof {
    pub commitment: Commitment,
    #[serde(with = "big_uint")]
    pub challenge: BigUint,
    #[serde(with = "big_uint")]
    pub response: BigUint,
}

impl ZKProof {
    /// Generate a DH tuple proof for the secret `x` with G = little_g^x and
    /// H = little_h^x.
    ///
    /// - Parameters:
    ///   - little_g: first base
    ///   - little_h: second base
    ///   - x: the shared exponent
    ///   - p, q: group modulus and order
    ///   - challenge_generator: almost always a Fiat-Shamir generator
    pub fn generate(
        little_g: &BigUint,
        little_h: &BigUint,
        x: &BigUint,
        p: &BigUint,
        q: &BigUint,
        challenge_generator: &ChallengeGenerator,
    ) -> ZKProof {
        let w = Util::random_below(q);
        let commitment = Prover::commit(little_g, little_h, &w, p);
        let challenge = challenge_generator.fiat_shamir(&commitment, q);
        let response = Prover::response(&w, x, &challenge, q);
        ZKProof {
            commitment,
            challenge,
            response,
        }
    }

    /// Verify a DH tuple proof. The challenge is only recomputed when a
    /// generator is supplied; disjunctive branches are checked without one.
    #[allow(clippy::too_many_arguments)]
    pub fn verify(
        &self,
        little_g: &BigUint,
        little_h: &BigUint,
        big_g: &BigUint,
        big_h: &BigUint,
        p: &BigUint,
        q: &BigUint,
        challenge_generator: Option<&ChallengeGenerator>,
    ) -> bool {
        if !self.commitment.in_subgroup(p, q) {
            return false;
        }

        // check that little_g^response = A * big_g^challenge
        let first_check = Verifier::check(
            little_g,
            big_g,
            &self.commitment.a,
            &self.challenge,
            &self.response,
            p,
        );

        // check that little_h^response = B * big_h^challenge
        let second_check = Verifier::check(
            little_h,
            big_h,
            &self.commitment.b,
            &self.challenge,
            &self.response,
            p,
        );

        let third_check = match challenge_generator {
            Some(generator) => self.challenge == generator.fiat_shamir(&self.commitment, q),
            None => true,
        };

        first_check && second_check && third_check
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::ProofContext;

    // 129-bit safe prime, q = (p - 1) / 2, g = 4
    fn group() -> (BigUint, BigUint, BigUint) {
        let p = BigUint::parse_bytes(b"340282366920938463463374607431768223907", 10).unwrap();
        let q = BigUint::parse_bytes(b"170141183460469231731687303715884111953", 10).unwrap();
        (p, q, BigUint::from(4_u32))
    }

    #[test]
    fn test_prover_commit() {
        let p = BigUint::from(23_u32);
        let commitment = Prover::commit(
            &BigUint::from(4_u32),
            &BigUint::from(9_u32),
            &BigUint::from(3_u32),
            &p,
        );
        // 4^3 = 64 = 18, 9^3 = 729 = 16 (mod 23)
        assert_eq!(commitment.a, BigUint::from(18_u32));
        assert_eq!(commitment.b, BigUint::from(16_u32));
    }

    #[test]
    fn test_prover_response() {
        let q = BigUint::from(11_u32);
        let t = Prover::response(
            &BigUint::from(5_u32),
            &BigUint::from(7_u32),
            &BigUint::from(3_u32),
            &q,
        );
        // 5 + 21 = 26 = 4 (mod 11)
        assert_eq!(t, BigUint::from(4_u32));
    }

    #[test]
    fn test_dleq_verify() {
        let (p, q, g) = group();
        let x = Util::random_below(&q);
        let h = g.modpow(&Util::random_below(&q), &p);
        let big_g = g.modpow(&x, &p);
        let big_h = h.modpow(&x, &p);

        let generator = ChallengeGenerator::Legacy;
        let proof = ZKProof::generate(&g, &h, &x, &p, &q, &generator);
        assert_eq!(proof.verify(&g, &h, &big_g, &big_h, &p, &q, Some(&generator)), true);
        assert_eq!(proof.verify(&g, &h, &big_g, &big_h, &p, &q, None), true);
    }

    #[test]
    fn test_dleq_rejects_wrong_exponent() {
        let (p, q, g) = group();
        let x = Util::random_below(&q);
        let h = g.modpow(&BigUint::from(12345_u32), &p);
        let big_g = g.modpow(&x, &p);
        // H built with x + 1
        let big_h = h.modpow(&(&x + BigUint::one()), &p);

        let generator = ChallengeGenerator::Legacy;
        let proof = ZKProof::generate(&g, &h, &x, &p, &q, &generator);
        assert_eq!(proof.verify(&g, &h, &big_g, &big_h, &p, &q, Some(&generator)), false);
    }

    #[test]
    fn test_dleq_rejects_other_context() {
        let (p, q, g) = group();
        let x = Util::random_below(&q);
        let h = g.modpow(&BigUint::from(777_u32), &p);
        let big_g = g.modpow(&x, &p);
        let big_h = h.modpow(&x, &p);

        let bound = ChallengeGenerator::ContextBound(ProofContext::new("E1", 0).with_answer(0));
        let other = ChallengeGenerator::ContextBound(ProofContext::new("E1", 0).with_answer(1));
        let proof = ZKProof::generate(&g, &h, &x, &p, &q, &bound);
        assert_eq!(proof.verify(&g, &h, &big_g, &big_h, &p, &q, Some(&bound)), true);
        assert_eq!(proof.verify(&g, &h, &big_g, &big_h, &p, &q, Some(&other)), false);
    }

    #[test]
    fn test_dleq_rejects_commitment_outside_subgroup() {
        let (p, q, g) = group();
        let x = Util::random_below(&q);
        let h = g.modpow(&BigUint::from(4242_u32), &p);
        let big_g = g.modpow(&x, &p);
        let big_h = h.modpow(&x, &p);

        let generator = ChallengeGenerator::Legacy;
        let mut proof = ZKProof::generate(&g, &h, &x, &p, &q, &generator);
        proof.commitment.a = &p - &proof.commitment.a;
        assert_eq!(proof.verify(&g, &h, &big_g, &big_h, &p, &q, Some(&generator)), false);

        // With an odd challenge the signs of -A and -G cancel, so both
        // equations hold and only the subgroup check rejects the proof.
        let w = Util::random_below(&q);
        let challenge = BigUint::from(3_u32);
        let honest = Prover::commit(&g, &h, &w, &p);
        let forged = ZKProof {
            commitment: Commitment {
                a: &p - &honest.a,
                b: &p - &honest.b,
            },
            response: Prover::response(&w, &x, &challenge, &q),
            challenge,
        };
        let neg_big_g = &p - &big_g;
        let neg_big_h = &p - &big_h;
        let c = &forged.challenge;
        let t = &forged.response;
        assert!(Verifier::check(&g, &neg_big_g, &forged.commitment.a, c, t, &p));
        assert!(Verifier::check(&h, &neg_big_h, &forged.commitment.b, c, t, &p));
        assert_eq!(forged.verify(&g, &h, &neg_big_g, &neg_big_h, &p, &q, None), false);
    }

    #[test]
    fn test_proof_json_field_names() {
        let proof = ZKProof {
            commitment: Commitment {
                a: BigUint::from(2_u32),
                b: BigUint::from(3_u32),
            },
            challenge: BigUint::from(5_u32),
            response: BigUint::from(7_u32),
        };
        let json = serde_json::to_value(&proof).unwrap();
        assert_eq!(json["commitment"]["A"], "2");
        assert_eq!(json["commitment"]["B"], "3");
        assert_eq!(json["challenge"], "5");
        assert_eq!(json["response"], "7");
        let back: ZKProof = serde_json::from_value(json).unwrap();
        assert_eq!(back, proof);
    }
}
