// Copyright 2020-2026 MathxH Chen.
//
// Code is licensed under MIT Apache Dual License

//! ElGamal signatures, used by a dealer to bind the shares it hands out to
//! its identity key.
//!
//! `r = g^k mod p`, `s = (H(m) - x*r) * k^-1 mod (p-1)` with `k` coprime to
//! `p - 1`; verification checks `g^H(m) == y^r * r^s mod p`.

use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::identities::{One, Zero};
use serde::{Deserialize, Serialize};

use crate::elgamal::{PublicKey, SecretKey};
use crate::error::{Error, Result};
use crate::serialize::big_uint;
use crate::util::Util;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    #[serde(with = "big_uint")]
    pub r: BigUint,
    #[serde(with = "big_uint")]
    pub s: BigUint,
}

impl Signature {
    /// Sign `message` (hashed with SHA-256) with `secret_key`.
    pub fn generate(message: &[u8], secret_key: &SecretKey) -> Result<Signature> {
        let pk = &secret_key.public_key;
        let p_minus_1 = &pk.p - BigUint::one();
        if p_minus_1 <= BigUint::from(2_u32) {
            return Err(Error::InvalidParameters("p is too small to sign with".to_string()));
        }
        let hash = Util::sha256_int(message);
        let two = BigUint::from(2_u32);

        loop {
            let k = Util::random_range(&two, &p_minus_1);
            if !k.gcd(&p_minus_1).is_one() {
                continue;
            }
            let k_inv = Util::mod_inverse(&k, &p_minus_1).ok_or(Error::NotInvertible)?;
            let r = pk.g.modpow(&k, &pk.p);
            let xr = BigInt::from(&secret_key.x * &r);
            let difference = Util::reduce_signed(&(BigInt::from(hash.clone()) - xr), &p_minus_1);
            let s = (difference * k_inv) % &p_minus_1;
            if !s.is_zero() {
                return Ok(Signature { r, s });
            }
        }
    }

    pub fn verify(&self, message: &[u8], public_key: &PublicKey) -> bool {
        let p = &public_key.p;
        if self.r.is_zero() || &self.r >= p {
            return false;
        }
        if self.s >= p - BigUint::one() {
            return false;
        }
        let hash = Util::sha256_int(message);
        let expected = (public_key.y.modpow(&self.r, p) * self.r.modpow(&self.s, p)) % p;
        public_key.g.modpow(&hash, p) == expected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::CryptoParams;

    fn toy() -> CryptoParams {
        CryptoParams::new(
            BigUint::from(23_u32),
            BigUint::from(11_u32),
            BigUint::from(4_u32),
        )
        .unwrap()
    }

    fn medium() -> CryptoParams {
        CryptoParams::new(
            BigUint::parse_bytes(b"340282366920938463463374607431768223907", 10).unwrap(),
            BigUint::parse_bytes(b"170141183460469231731687303715884111953", 10).unwrap(),
            BigUint::from(4_u32),
        )
        .unwrap()
    }

    #[test]
    fn test_sign_and_verify() {
        let keypair = medium().generate_keypair();
        let signature = Signature::generate(b"share", &keypair.sk).unwrap();
        assert_eq!(signature.verify(b"share", &keypair.pk), true);
        assert_eq!(signature.verify(b"shard", &keypair.pk), false);
    }

    #[test]
    fn test_sign_toy_group() {
        let keypair = toy().generate_keypair();
        for _ in 0..20 {
            let signature = Signature::generate(b"toy", &keypair.sk).unwrap();
            assert!(signature.s < BigUint::from(22_u32));
            assert_eq!(signature.verify(b"toy", &keypair.pk), true);
        }
    }

    #[test]
    fn test_wrong_key_rejected() {
        let params = medium();
        let signer = params.generate_keypair();
        let other = params.generate_keypair();
        let signature = Signature::generate(b"share", &signer.sk).unwrap();
        assert_eq!(signature.verify(b"share", &other.pk), false);
    }

    #[test]
    fn test_out_of_range_components_rejected() {
        let keypair = medium().generate_keypair();
        let mut signature = Signature::generate(b"share", &keypair.sk).unwrap();
        signature.s = &keypair.pk.p - BigUint::one();
        assert_eq!(signature.verify(b"share", &keypair.pk), false);
        signature.r = keypair.pk.p.clone();
        assert_eq!(signature.verify(b"share", &keypair.pk), false);
    }
}
