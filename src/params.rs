// Copyright 2020-2026 MathxH Chen.
//
// Code is licensed under MIT Apache Dual License

//! Cryptosystem parameters `(p, q, g)`.
//!
//! `p` is a safe prime, `q = (p - 1) / 2` is the prime order of the subgroup
//! of quadratic residues and `g` generates that subgroup. Every other type in
//! the crate is built from an explicit `CryptoParams` value; nothing is kept in
//! process-wide state.

use num_bigint::BigUint;
use num_integer::Integer;
use num_primes::Generator;
use num_traits::identities::{One, Zero};
use serde::{Deserialize, Serialize};

use crate::elgamal::KeyPair;
use crate::error::{Error, Result};
use crate::serialize::big_uint;
use crate::util::Util;

/// 2048-bit MODP Group from RFC 3526 (Group ID 14)
///
/// The prime is: 2^2048 - 2^1984 - 1 + 2^64 * { [2^1918 pi] + 124476 }
const RFC3526_PRIME_HEX: &str = "\
    ffffffffffffffffc90fdaa22168c234c4c6628b80dc1cd129024e088a67cc74\
    020bbea63b139b22514a08798e3404ddef9519b3cd3a431b302b0a6df25f14374fe1\
    356d6d51c245e485b576625e7ec6f44c42e9a637ed6b0bff5cb6f406b7edee386bfb\
    5a899fa5ae9f24117c4b1fe649286651ece45b3dc2007cb8a163bf0598da48361c55d\
    39a69163fa8fd24cf5f83655d23dca3ad961c62f356208552bb9ed529077096966d67\
    0c354e4abc9804f1746c08ca18217c32905e462e36ce3be39e772c180e86039b2783a\
    2ec07a28fb5c55df06f4c52c9de2bcbf6955817183995497cea956ae515d2261898fa0\
    51015728e5a8aacaa68ffffffffffffffff";

/// Deployment floor for `|p|` in bits.
pub const MIN_P_BITS: usize = 2048;
/// Deployment floor for `|q|` in bits.
pub const MIN_Q_BITS: usize = 256;

/// Random witnesses per Miller-Rabin test, error below 4^-40.
const MILLER_RABIN_ROUNDS: usize = 40;

const SMALL_PRIMES: [u32; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CryptoParams {
    #[serde(with = "big_uint")]
    pub p: BigUint,
    #[serde(with = "big_uint")]
    pub q: BigUint,
    #[serde(with = "big_uint")]
    pub g: BigUint,
}

impl CryptoParams {
    /// Build parameters from explicit values, rejecting anything that is not
    /// a safe-prime group with `g` of order `q`.
    ///
    /// - Parameters:
    ///   - p: safe prime modulus
    ///   - q: `(p - 1) / 2`
    ///   - g: generator of the order-q subgroup
    ///
    /// ## Example
    ///
    /// ```rust
    /// use homomorphic_vote::CryptoParams;
    /// use num_bigint::BigUint;
    ///
    /// let params = CryptoParams::new(
    ///     BigUint::from(23_u32),
    ///     BigUint::from(11_u32),
    ///     BigUint::from(4_u32),
    /// ).unwrap();
    /// assert!(params.is_member(&BigUint::from(16_u32)));
    /// ```
    pub fn new(p: BigUint, q: BigUint, g: BigUint) -> Result<Self> {
        let params = CryptoParams { p, q, g };
        params.validate()?;
        Ok(params)
    }

    /// The 2048-bit MODP group 14 of RFC 3526 with `g = 2`.
    ///
    /// 2 is a quadratic residue because `p ≡ 7 (mod 8)`, so it generates the
    /// order-q subgroup.
    pub fn rfc3526() -> Self {
        let p = RFC3526_PRIME_HEX
            .chars()
            .filter_map(|c| c.to_digit(16))
            .fold(BigUint::zero(), |acc, digit| (acc << 4) + BigUint::from(digit));
        let q = (&p - BigUint::one()) >> 1;
        CryptoParams {
            p,
            q,
            g: BigUint::from(2_u32),
        }
    }

    /// Fresh safe prime of `bits` bits with `g = 4`, which is a square and
    /// therefore of order `q` for every safe prime above 5.
    pub fn generate(bits: usize) -> Self {
        let p: BigUint = Generator::safe_prime(bits);
        let q = (&p - BigUint::one()) >> 1;
        CryptoParams {
            p,
            q,
            g: BigUint::from(4_u32),
        }
    }

    /// Structural validation: primality of `p` and `q`, `q = (p-1)/2`,
    /// `1 < g < p-1` and `g^q = 1 mod p`.
    pub fn validate(&self) -> Result<()> {
        // p = 5 leaves the subgroup {1, 4} with no room for a second generator
        if self.p < BigUint::from(7_u32) {
            return Err(Error::InvalidParameters("p is too small".to_string()));
        }
        if !is_probable_prime(&self.p) {
            return Err(Error::InvalidParameters("p is not prime".to_string()));
        }
        if self.q != (&self.p - BigUint::one()) >> 1 {
            return Err(Error::InvalidParameters("q is not (p - 1) / 2".to_string()));
        }
        if !is_probable_prime(&self.q) {
            return Err(Error::InvalidParameters("q is not prime".to_string()));
        }
        if self.g <= BigUint::one() || self.g >= &self.p - BigUint::one() {
            return Err(Error::InvalidParameters("g out of range".to_string()));
        }
        if !self.g.modpow(&self.q, &self.p).is_one() {
            return Err(Error::InvalidParameters(
                "g does not generate the subgroup of order q".to_string(),
            ));
        }
        Ok(())
    }

    /// Enforce the production size floor on top of [`validate`](Self::validate).
    pub fn check_strength(&self) -> Result<()> {
        self.validate()?;
        if self.p.bits() < MIN_P_BITS {
            return Err(Error::InvalidParameters(format!(
                "p of insufficient length, should be {} bits or greater",
                MIN_P_BITS
            )));
        }
        if self.q.bits() < MIN_Q_BITS {
            return Err(Error::InvalidParameters(format!(
                "q of insufficient length, should be {} bits or greater",
                MIN_Q_BITS
            )));
        }
        Ok(())
    }

    /// Uniform exponent in `[0, q)`.
    pub fn random_exponent(&self) -> BigUint {
        Util::random_below(&self.q)
    }

    pub fn generate_keypair(&self) -> KeyPair {
        KeyPair::generate(self)
    }

    /// `0 < x < p` and `x^q = 1 mod p`.
    pub fn is_member(&self, x: &BigUint) -> bool {
        !x.is_zero() && x < &self.p && x.modpow(&self.q, &self.p).is_one()
    }

    /// Embed `m < q` into the order-q subgroup as `m + 1` or `-(m + 1) mod p`,
    /// whichever is a quadratic residue.
    pub fn encode(&self, m: &BigUint) -> Result<BigUint> {
        if m >= &self.q {
            return Err(Error::PlaintextOutOfRange);
        }
        let y = m + BigUint::one();
        if y.modpow(&self.q, &self.p).is_one() {
            Ok(y)
        } else {
            Ok(&self.p - y)
        }
    }

    /// Inverse of [`encode`](Self::encode).
    pub fn decode(&self, element: &BigUint) -> Result<BigUint> {
        if element.is_zero() || element >= &self.p {
            return Err(Error::NotInSubgroup);
        }
        // encoded values are m + 1 <= q, or p - (m + 1) >= q + 1
        let y = if element <= &self.q {
            element.clone()
        } else {
            &self.p - element
        };
        Ok(y - BigUint::one())
    }

    /// Hash `tag` and `p` into the order-q subgroup. Nobody knows the discrete
    /// log of the result with respect to `g`, which is what a second Pedersen
    /// base needs.
    pub fn derive_generator(&self, tag: &[u8]) -> BigUint {
        let mut counter: u32 = 0;
        loop {
            let mut data = tag.to_vec();
            data.extend_from_slice(self.p.to_str_radix(10).as_bytes());
            data.extend_from_slice(&counter.to_be_bytes());
            let h = Util::sha256_int(&data) % &self.p;
            let candidate = h.modpow(&BigUint::from(2_u32), &self.p);
            if candidate > BigUint::one() && candidate != self.g {
                return candidate;
            }
            counter += 1;
        }
    }
}

/// Trial division by the primes below 40, then Miller-Rabin with random
/// witnesses in `[2, n - 1)`.
fn is_probable_prime(n: &BigUint) -> bool {
    let two = BigUint::from(2_u32);
    if n < &two {
        return false;
    }
    for &small in SMALL_PRIMES.iter() {
        let small = BigUint::from(small);
        if n == &small {
            return true;
        }
        if (n % &small).is_zero() {
            return false;
        }
    }

    // n - 1 = d * 2^s with d odd
    let n_minus_one = n - BigUint::one();
    let mut d = n_minus_one.clone();
    let mut s = 0_usize;
    while d.is_even() {
        d = d >> 1;
        s += 1;
    }

    'witness: for _ in 0..MILLER_RABIN_ROUNDS {
        let a = Util::random_range(&two, &n_minus_one);
        let mut x = a.modpow(&d, n);
        if x.is_one() || x == n_minus_one {
            continue;
        }
        for _ in 1..s {
            x = x.modpow(&two, n);
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy() -> CryptoParams {
        CryptoParams::new(
            BigUint::from(23_u32),
            BigUint::from(11_u32),
            BigUint::from(4_u32),
        )
        .unwrap()
    }

    #[test]
    fn test_toy_params_validate() {
        let params = toy();
        assert_eq!(params.validate().is_ok(), true);
        assert_eq!(params.check_strength().is_err(), true);
    }

    #[test]
    fn test_rejects_bad_params() {
        // 21 is not prime
        assert!(CryptoParams::new(
            BigUint::from(21_u32),
            BigUint::from(10_u32),
            BigUint::from(4_u32)
        )
        .is_err());
        // q must be (p - 1) / 2
        assert!(CryptoParams::new(
            BigUint::from(23_u32),
            BigUint::from(7_u32),
            BigUint::from(4_u32)
        )
        .is_err());
        // 5 is a non-residue mod 23, so its order is 22
        assert!(CryptoParams::new(
            BigUint::from(23_u32),
            BigUint::from(11_u32),
            BigUint::from(5_u32)
        )
        .is_err());
    }

    #[test]
    fn test_rejects_degenerate_group() {
        // 5 = 2 * 2 + 1 is a safe prime but too small to hold a second base
        let result = CryptoParams::new(
            BigUint::from(5_u32),
            BigUint::from(2_u32),
            BigUint::from(4_u32),
        );
        assert!(matches!(result, Err(Error::InvalidParameters(_))));
        assert!(CryptoParams::new(
            BigUint::from(7_u32),
            BigUint::from(3_u32),
            BigUint::from(2_u32)
        )
        .is_ok());
    }

    #[test]
    fn test_primality_of_known_values() {
        for n in &[2_u32, 3, 37, 41, 1_000_003, 2_147_483_647] {
            assert!(is_probable_prime(&BigUint::from(*n)), "{} is prime", n);
        }
        // 561 and 41041 are Carmichael numbers, 3215031751 is a strong
        // pseudoprime to bases 2, 3, 5 and 7
        for n in &[0_u64, 1, 4, 561, 41_041, 1_000_001, 3_215_031_751] {
            assert!(!is_probable_prime(&BigUint::from(*n)), "{} is composite", n);
        }
        let p: BigUint = "340282366920938463463374607431768223907".parse().unwrap();
        let q: BigUint = "170141183460469231731687303715884111953".parse().unwrap();
        assert!(!is_probable_prime(&(&p * &q)));
    }

    #[test]
    fn test_safe_prime_groups_validate() {
        let safe_primes = [
            // 128 bits
            "170141183460469231731687303715884114527",
            // 129 bits
            "340282366920938463463374607431768223907",
            // 256 bits
            "57896044618658097711785492504343953926634992332820282019728792003956565016447",
        ];
        for p in safe_primes.iter() {
            let p: BigUint = p.parse().unwrap();
            let q = (&p - BigUint::one()) >> 1;
            let params = CryptoParams::new(p.clone(), q, BigUint::from(4_u32)).unwrap();
            assert_eq!(params.p, p);
        }
    }

    #[test]
    fn test_rfc3526_group() {
        let params = CryptoParams::rfc3526();
        assert_eq!(params.p.bits(), 2048);
        assert_eq!(params.q.bits(), 2047);
        assert_eq!(params.g.modpow(&params.q, &params.p), BigUint::one());
        assert_eq!(params.check_strength().is_ok(), true);
    }

    #[test]
    fn test_encode_decode_every_value() {
        let params = toy();
        for m in 0..11_u32 {
            let m = BigUint::from(m);
            let encoded = params.encode(&m).unwrap();
            assert!(params.is_member(&encoded));
            assert_eq!(params.decode(&encoded).unwrap(), m);
        }
        assert!(params.encode(&BigUint::from(11_u32)).is_err());
    }

    #[test]
    fn test_membership() {
        let params = toy();
        // squares mod 23
        for x in &[1_u32, 2, 3, 4, 6, 8, 9, 12, 13, 16, 18] {
            assert!(params.is_member(&BigUint::from(*x)));
        }
        assert!(!params.is_member(&BigUint::from(5_u32)));
        assert!(!params.is_member(&BigUint::zero()));
        assert!(!params.is_member(&BigUint::from(23_u32)));
    }

    #[test]
    fn test_derive_generator() {
        let params = toy();
        let h = params.derive_generator(b"ground_2");
        assert!(params.is_member(&h));
        assert!(h != BigUint::one());
        assert!(h != params.g);
        assert_eq!(h, params.derive_generator(b"ground_2"));
    }

    #[test]
    fn test_params_json() {
        let params = toy();
        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(json, r#"{"p":"23","q":"11","g":"4"}"#);
        let back: CryptoParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }

    #[test]
    #[ignore]
    fn test_generate_safe_prime_group() {
        let params = CryptoParams::generate(128);
        assert!(params.validate().is_ok());
    }
}
