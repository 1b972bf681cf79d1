// Copyright 2020-2026 MathxH Chen.
//
// Code is licensed under MIT Apache Dual License

//! Multiplicative ElGamal over the order-q subgroup of Z*_p.
//!
//! A ciphertext of `m` under `y = g^x` is `(alpha, beta) = (g^r, m * y^r)`.
//! Ciphertexts multiply component-wise, so the product of two ciphertexts
//! decrypts to the product of their plaintexts.

use std::fmt;
use std::str::FromStr;

use log::debug;
use num_bigint::BigUint;
use num_traits::identities::{One, Zero};
use num_traits::Num;
use serde::{Deserialize, Serialize};

use crate::challenge::ChallengeGenerator;
use crate::dleq::ZKProof;
use crate::error::{Error, Result};
use crate::params::CryptoParams;
use crate::serialize::big_uint;
use crate::util::Util;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey {
    #[serde(with = "big_uint")]
    pub y: BigUint,
    #[serde(with = "big_uint")]
    pub p: BigUint,
    #[serde(with = "big_uint")]
    pub g: BigUint,
    #[serde(with = "big_uint")]
    pub q: BigUint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretKey {
    #[serde(with = "big_uint")]
    pub x: BigUint,
    pub public_key: PublicKey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub pk: PublicKey,
    pub sk: SecretKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Plaintext {
    #[serde(with = "big_uint")]
    pub m: BigUint,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ciphertext {
    #[serde(with = "big_uint")]
    pub alpha: BigUint,
    #[serde(with = "big_uint")]
    pub beta: BigUint,
}

impl KeyPair {
    /// Sample `x` in `[1, q)` and set `y = g^x mod p`.
    ///
    /// `x = 0` is skipped: it would publish `y = 1`, which
    /// [`PublicKey::validate`] rejects.
    pub fn generate(params: &CryptoParams) -> KeyPair {
        let x = Util::random_range(&BigUint::one(), &params.q);
        let sk = SecretKey::from_exponent(params, x);
        KeyPair {
            pk: sk.public_key.clone(),
            sk,
        }
    }
}

impl Plaintext {
    pub fn new(m: BigUint) -> Self {
        Plaintext { m }
    }
}

impl PublicKey {
    pub fn params(&self) -> CryptoParams {
        CryptoParams {
            p: self.p.clone(),
            q: self.q.clone(),
            g: self.g.clone(),
        }
    }

    /// Encrypt with caller-chosen randomness `r`.
    ///
    /// With `encode_message` the plaintext is first embedded into the
    /// order-q subgroup (see [`CryptoParams::encode`]); that step fails for
    /// `m >= q`.
    pub fn encrypt_with_r(
        &self,
        plaintext: &Plaintext,
        r: &BigUint,
        encode_message: bool,
    ) -> Result<Ciphertext> {
        let m = if encode_message {
            self.params().encode(&plaintext.m)?
        } else {
            plaintext.m.clone()
        };

        Ok(Ciphertext {
            alpha: self.g.modpow(r, &self.p),
            beta: (m * self.y.modpow(r, &self.p)) % &self.p,
        })
    }

    /// Encrypt a plaintext and return the randomness just generated and used.
    pub fn encrypt_return_r(&self, plaintext: &Plaintext) -> (Ciphertext, BigUint) {
        let r = Util::random_below(&self.q);
        let ciphertext = Ciphertext {
            alpha: self.g.modpow(&r, &self.p),
            beta: (&plaintext.m * self.y.modpow(&r, &self.p)) % &self.p,
        };
        (ciphertext, r)
    }

    /// Encrypt a plaintext, obscure the randomness.
    pub fn encrypt(&self, plaintext: &Plaintext) -> Ciphertext {
        self.encrypt_return_r(plaintext).0
    }

    /// Joint key of two trustees: `y1 * y2 mod p`.
    pub fn combine(&self, other: &PublicKey) -> Result<PublicKey> {
        if self.p != other.p || self.q != other.q || self.g != other.g {
            return Err(Error::IncompatibleKeys);
        }
        Ok(PublicKey {
            y: (&self.y * &other.y) % &self.p,
            p: self.p.clone(),
            g: self.g.clone(),
            q: self.q.clone(),
        })
    }

    /// Parameters are well formed and `y` is a non-trivial subgroup element.
    pub fn validate(&self) -> Result<()> {
        let params = self.params();
        params.validate()?;
        if self.y <= BigUint::one() || self.y >= &self.p - BigUint::one() {
            return Err(Error::InvalidParameters("y out of range".to_string()));
        }
        if !params.is_member(&self.y) {
            return Err(Error::NotInSubgroup);
        }
        Ok(())
    }
}

impl SecretKey {
    /// Secret key for a known exponent, e.g. a trustee's polynomial share.
    pub fn from_exponent(params: &CryptoParams, x: BigUint) -> SecretKey {
        let x = x % &params.q;
        let public_key = PublicKey {
            y: params.g.modpow(&x, &params.p),
            p: params.p.clone(),
            g: params.g.clone(),
            q: params.q.clone(),
        };
        SecretKey { x, public_key }
    }

    /// `alpha^x mod p`, not yet inverted so that it can be proven.
    pub fn decryption_factor(&self, ciphertext: &Ciphertext) -> BigUint {
        ciphertext.alpha.modpow(&self.x, &self.public_key.p)
    }

    /// Decryption factor with a Chaum-Pedersen proof that
    /// `(g, alpha, y, factor)` is a DH tuple.
    pub fn decryption_factor_and_proof(
        &self,
        ciphertext: &Ciphertext,
        challenge_generator: &ChallengeGenerator,
    ) -> (BigUint, ZKProof) {
        let pk = &self.public_key;
        let factor = self.decryption_factor(ciphertext);
        let proof = ZKProof::generate(
            &pk.g,
            &ciphertext.alpha,
            &self.x,
            &pk.p,
            &pk.q,
            challenge_generator,
        );
        (factor, proof)
    }

    /// Decrypt, optionally mapping the subgroup element back to the
    /// original message.
    pub fn decrypt(&self, ciphertext: &Ciphertext, decode_m: bool) -> Result<Plaintext> {
        let factor = self.decryption_factor(ciphertext);
        self.decrypt_with_factor(ciphertext, &factor, decode_m)
    }

    pub fn decrypt_with_factor(
        &self,
        ciphertext: &Ciphertext,
        dec_factor: &BigUint,
        decode_m: bool,
    ) -> Result<Plaintext> {
        let p = &self.public_key.p;
        let inverse = Util::mod_inverse(dec_factor, p).ok_or(Error::NotInvertible)?;
        let m = (inverse * &ciphertext.beta) % p;
        if decode_m {
            Ok(Plaintext::new(self.public_key.params().decode(&m)?))
        } else {
            Ok(Plaintext::new(m))
        }
    }

    /// Decrypt and prove it: returns the plaintext element `m` and a proof
    /// that `(g, alpha, y, beta / m)` is a DH tuple, i.e. that `m` was
    /// obtained with the secret behind `y`.
    pub fn prove_decryption(
        &self,
        ciphertext: &Ciphertext,
        challenge_generator: &ChallengeGenerator,
    ) -> Result<(BigUint, ZKProof)> {
        let pk = &self.public_key;
        let m = self.decrypt(ciphertext, false)?.m;
        let proof = ZKProof::generate(
            &pk.g,
            &ciphertext.alpha,
            &self.x,
            &pk.p,
            &pk.q,
            challenge_generator,
        );
        Ok((m, proof))
    }
}

impl Ciphertext {
    /// `(1, 1)`, the encryption of 1 with `r = 0` and the neutral element of
    /// homomorphic multiplication.
    pub fn identity() -> Self {
        Ciphertext {
            alpha: BigUint::one(),
            beta: BigUint::one(),
        }
    }

    /// Homomorphic multiplication of ciphertexts.
    pub fn multiply(&self, other: &Ciphertext, pk: &PublicKey) -> Ciphertext {
        Ciphertext {
            alpha: (&self.alpha * &other.alpha) % &pk.p,
            beta: (&self.beta * &other.beta) % &pk.p,
        }
    }

    /// Multiply in a fresh `(g^r, y^r)`; the plaintext is unchanged.
    pub fn reenc_with_r(&self, r: &BigUint, pk: &PublicKey) -> Ciphertext {
        Ciphertext {
            alpha: (&self.alpha * pk.g.modpow(r, &pk.p)) % &pk.p,
            beta: (&self.beta * pk.y.modpow(r, &pk.p)) % &pk.p,
        }
    }

    /// Reencryption with fresh randomness, which is returned.
    pub fn reenc_return_r(&self, pk: &PublicKey) -> (Ciphertext, BigUint) {
        let r = Util::random_below(&pk.q);
        (self.reenc_with_r(&r, pk), r)
    }

    pub fn reenc(&self, pk: &PublicKey) -> Ciphertext {
        self.reenc_return_r(pk).0
    }

    /// Both components are elements of the order-q subgroup.
    pub fn check_group_membership(&self, pk: &PublicKey) -> bool {
        let params = pk.params();
        params.is_member(&self.alpha) && params.is_member(&self.beta)
    }

    /// Divide out the decryption factors of every trustee:
    /// `beta * prod(factor)^-1 mod p`.
    pub fn decrypt_with_factors(
        &self,
        decryption_factors: &[BigUint],
        pk: &PublicKey,
    ) -> Result<BigUint> {
        let combined = decryption_factors
            .iter()
            .fold(BigUint::one(), |acc, factor| (acc * factor) % &pk.p);
        let inverse = Util::mod_inverse(&combined, &pk.p).ok_or(Error::NotInvertible)?;
        Ok((&self.beta * inverse) % &pk.p)
    }

    /// Check a decryption factor against the trustee's public key.
    pub fn verify_decryption_factor(
        &self,
        dec_factor: &BigUint,
        proof: &ZKProof,
        public_key: &PublicKey,
        challenge_generator: &ChallengeGenerator,
    ) -> bool {
        proof.verify(
            &public_key.g,
            &self.alpha,
            &public_key.y,
            dec_factor,
            &public_key.p,
            &public_key.q,
            Some(challenge_generator),
        )
    }

    /// Check a proof produced by [`SecretKey::prove_decryption`].
    pub fn verify_decryption_proof(
        &self,
        plaintext: &BigUint,
        proof: &ZKProof,
        public_key: &PublicKey,
        challenge_generator: &ChallengeGenerator,
    ) -> bool {
        let p = &public_key.p;
        let beta_over_m = match Util::mod_inverse(plaintext, p) {
            Some(inverse) => (&self.beta * inverse) % p,
            None => {
                debug!("decryption proof: plaintext is not invertible");
                return false;
            }
        };
        self.verify_decryption_factor(&beta_over_m, proof, public_key, challenge_generator)
    }
}

impl fmt::Display for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{},{}", self.alpha, self.beta)
    }
}

impl FromStr for Ciphertext {
    type Err = Error;

    /// expects `alpha,beta`
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split(',');
        let (alpha, beta) = match (parts.next(), parts.next(), parts.next()) {
            (Some(alpha), Some(beta), None) => (alpha.trim(), beta.trim()),
            _ => return Err(Error::InvalidVote(format!("malformed ciphertext {:?}", s))),
        };
        let parse = |value: &str| {
            BigUint::from_str_radix(value, 10)
                .map_err(|_| Error::InvalidVote(format!("malformed ciphertext {:?}", s)))
        };
        let ciphertext = Ciphertext {
            alpha: parse(alpha)?,
            beta: parse(beta)?,
        };
        if ciphertext.alpha.is_zero() || ciphertext.beta.is_zero() {
            return Err(Error::NotInSubgroup);
        }
        Ok(ciphertext)
    }
}
