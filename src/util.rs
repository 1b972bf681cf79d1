// Copyright 2020-2026 MathxH Chen.
//
// Code is licensed under MIT Apache Dual License

use num_bigint::{BigInt, BigUint, RandBigInt, ToBigInt, ToBigUint};
use num_integer::Integer;
use num_traits::identities::{One, Zero};
use sha1::Sha1;
use sha2::{Digest, Sha256};

pub struct Util {}

impl Util {
    /// Finds the greatest common denominator of two integers *a* and *b*, and two
    /// integers *x* and *y* such that *ax* + *by* is the greatest common
    /// denominator of *a* and *b* (Bézout coefficients).
    ///
    /// This function is an implementation of the [extended Euclidean
    /// algorithm](https://en.wikipedia.org/wiki/Extended_Euclidean_algorithm),
    /// unrolled into a loop so 2048-bit operands do not grow the stack.
    pub fn extend_gcd(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
        let (mut old_r, mut r) = (a.clone(), b.clone());
        let (mut old_x, mut x) = (BigInt::one(), BigInt::zero());
        let (mut old_y, mut y) = (BigInt::zero(), BigInt::one());

        while !r.is_zero() {
            let quotient = &old_r / &r;
            let next_r = &old_r - &quotient * &r;
            old_r = std::mem::replace(&mut r, next_r);
            let next_x = &old_x - &quotient * &x;
            old_x = std::mem::replace(&mut x, next_x);
            let next_y = &old_y - &quotient * &y;
            old_y = std::mem::replace(&mut y, next_y);
        }

        (old_r, old_x, old_y)
    }

    /// Calculates the [modular multiplicative
    /// inverse](https://en.wikipedia.org/wiki/Modular_multiplicative_inverse) *x*
    /// of an integer *a* such that *ax* ≡ 1 (mod *m*).
    ///
    /// Such an integer may not exist. If so, this function will return `None`.
    /// The modulus does not have to be prime, `p - 1` is a valid modulus.
    pub fn mod_inverse(a: &BigUint, modular: &BigUint) -> Option<BigUint> {
        if modular.is_zero() {
            return None;
        }
        let a = (a % modular).to_bigint()?;
        let m = modular.to_bigint()?;
        let (g, x, _) = Util::extend_gcd(&a, &m);
        if g != BigInt::one() {
            None
        } else {
            x.mod_floor(&m).to_biguint()
        }
    }

    /// (a - b) mod m without ever going negative.
    pub fn mod_sub(a: &BigUint, b: &BigUint, modular: &BigUint) -> BigUint {
        let a = a % modular;
        let b = b % modular;
        if a >= b {
            a - b
        } else {
            modular - b + a
        }
    }

    /// Uniform sample from [0, bound).
    ///
    /// `thread_rng` is a cryptographically secure generator reseeded from the
    /// operating system, which is what ciphertext secrecy and proof
    /// soundness rest on.
    pub fn random_below(bound: &BigUint) -> BigUint {
        let mut rng = rand::thread_rng();
        rng.gen_biguint_below(bound)
    }

    /// Uniform sample from [low, high).
    pub fn random_range(low: &BigUint, high: &BigUint) -> BigUint {
        let mut rng = rand::thread_rng();
        rng.gen_biguint_range(low, high)
    }

    /// SHA-1 digest read as a big-endian integer, i.e. `int(sha1(data).hexdigest(), 16)`.
    pub fn sha1_int(data: &[u8]) -> BigUint {
        let hash = Sha1::digest(data);
        BigUint::from_bytes_be(&hash[..])
    }

    /// SHA-256 digest read as a big-endian integer.
    pub fn sha256_int(data: &[u8]) -> BigUint {
        let hash = Sha256::digest(data);
        BigUint::from_bytes_be(&hash[..])
    }

    /// Signed helper used by Lagrange interpolation: maps a possibly negative
    /// integer into [0, m).
    pub fn reduce_signed(value: &BigInt, modular: &BigUint) -> BigUint {
        let m = BigInt::from(modular.clone());
        value
            .mod_floor(&m)
            .to_biguint()
            .unwrap_or_else(BigUint::zero)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_gcd() {
        let a = BigInt::from(26);
        let b = BigInt::from(3);
        let (g, x, y) = Util::extend_gcd(&a, &b);

        assert_eq!(g, BigInt::one());
        assert_eq!((a * x) + (b * y), g);
    }

    #[test]
    fn test_mod_inverse() {
        // 3*inverse = 1 mod 26
        let does_exist = Util::mod_inverse(&BigUint::from(3_u32), &BigUint::from(26_u32));
        // 4*inverse = 1 mod 32
        let does_not_exist = Util::mod_inverse(&BigUint::from(4_u32), &BigUint::from(32_u32));

        assert_eq!(does_exist, Some(BigUint::from(9_u32)));
        assert_eq!(does_not_exist, None);
    }

    #[test]
    fn test_mod_inverse_composite_modulus() {
        // p - 1 = 22 for the toy group, 7 * 19 = 133 = 6 * 22 + 1
        let inverse = Util::mod_inverse(&BigUint::from(7_u32), &BigUint::from(22_u32));
        assert_eq!(inverse, Some(BigUint::from(19_u32)));
    }

    #[test]
    fn test_mod_sub_wraps() {
        let m = BigUint::from(11_u32);
        assert_eq!(
            Util::mod_sub(&BigUint::from(3_u32), &BigUint::from(5_u32), &m),
            BigUint::from(9_u32)
        );
        assert_eq!(
            Util::mod_sub(&BigUint::from(5_u32), &BigUint::from(3_u32), &m),
            BigUint::from(2_u32)
        );
        assert_eq!(
            Util::mod_sub(&BigUint::from(30_u32), &BigUint::from(8_u32), &m),
            BigUint::zero()
        );
    }

    #[test]
    fn test_random_below_bound() {
        let bound = BigUint::from(11_u32);
        for _ in 0..100 {
            assert!(Util::random_below(&bound) < bound);
        }
    }

    #[test]
    fn test_sha1_int_matches_hexdigest() {
        // int(hashlib.sha1(b"1,2").hexdigest(), 16)
        let expected =
            BigUint::parse_bytes(b"194685400614177221585233770227161348260529566374", 10).unwrap();
        assert_eq!(Util::sha1_int(b"1,2"), expected);
    }

    #[test]
    fn test_reduce_signed() {
        let m = BigUint::from(11_u32);
        assert_eq!(Util::reduce_signed(&BigInt::from(-1), &m), BigUint::from(10_u32));
        assert_eq!(Util::reduce_signed(&BigInt::from(23), &m), BigUint::one());
    }
}
