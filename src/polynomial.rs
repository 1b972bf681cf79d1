// Copyright 2020-2026 MathxH Chen.
//
// Code is licensed under MIT Apache Dual License

use num_bigint::{BigInt, BigUint};
use num_traits::identities::{One, Zero};
use serde::{Deserialize, Serialize};
use std::vec::Vec;

use crate::elgamal::{Plaintext, PublicKey};
use crate::error::{Error, Result};
use crate::serialize::big_uint;
use crate::sharebox::EncryptedPoint;
use crate::threshold::Trustee;
use crate::util::Util;

/// Secret Shares on Polynomial, (k,n) threshhod secheme
/// P(x) = a_0*x^0 + a_1*x^1 + a_2*x^2 + ... + a_n*x^(k-1)
/// degree is k - 1
/// s = P(0) = a_0
/// s_i = P(i)
///
/// All arithmetic is modulo the subgroup order q.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polynomial {
    pub coefficients: Vec<BigUint>,
    q: BigUint,
}

impl Polynomial {
    /// Random polynomial of degree `k - 1` with free term `free_term mod q`.
    pub fn new(free_term: &BigUint, k: usize, q: &BigUint) -> Self {
        let mut coefficients = vec![free_term % q];
        // [1,k) not [1,k]
        for _ in 1..k {
            coefficients.push(Util::random_below(q));
        }
        Polynomial {
            coefficients,
            q: q.clone(),
        }
    }

    pub fn from_coefficients(coefficients: Vec<BigUint>, q: &BigUint) -> Self {
        Polynomial {
            coefficients: coefficients.into_iter().map(|c| c % q).collect(),
            q: q.clone(),
        }
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// Get P(x) mod q, Horner's rule.
    pub fn evaluate(&self, x: &BigUint) -> BigUint {
        let x = x % &self.q;
        self.coefficients
            .iter()
            .rev()
            .fold(BigUint::zero(), |acc, coefficient| (acc * &x + coefficient) % &self.q)
    }

    /// One point per trustee, evaluated at the trustee's public index.
    pub fn create_points(&self, trustees: &[Trustee]) -> Vec<Point> {
        trustees
            .iter()
            .map(|trustee| Point {
                x_value: trustee.trustee_index.clone(),
                y_value: self.evaluate(&trustee.trustee_index),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    #[serde(with = "big_uint")]
    pub x_value: BigUint,
    #[serde(with = "big_uint")]
    pub y_value: BigUint,
}

impl Point {
    pub fn new(x_value: BigUint, y_value: BigUint) -> Self {
        Point { x_value, y_value }
    }

    pub fn on_polynomial(&self, polynomial: &Polynomial) -> bool {
        polynomial.evaluate(&self.x_value) == self.y_value
    }

    /// Encrypt both coordinates, each embedded into the order-q subgroup.
    pub fn encrypt(&self, public_key: &PublicKey) -> Result<EncryptedPoint> {
        let encrypt = |value: &BigUint| {
            let r = Util::random_below(&public_key.q);
            public_key.encrypt_with_r(&Plaintext::new(value.clone()), &r, true)
        };
        Ok(EncryptedPoint {
            ciph_x: encrypt(&self.x_value)?,
            ciph_y: encrypt(&self.y_value)?,
        })
    }
}

/// Lagrange basis coefficient of `index` among `indices`, evaluated at zero:
/// `prod_{j != i} x_j / (x_j - x_i) mod q`.
pub fn lagrange_coefficient(index: &BigUint, indices: &[BigUint], q: &BigUint) -> Result<BigUint> {
    let x_i = BigInt::from(index.clone());
    let mut numerator = BigUint::one();
    let mut denominator = BigUint::one();
    let mut seen_self = false;
    for x_j in indices {
        if x_j == index {
            if seen_self {
                return Err(Error::DuplicateIndex(index.clone()));
            }
            seen_self = true;
            continue;
        }
        numerator = (numerator * x_j) % q;
        let difference = Util::reduce_signed(&(BigInt::from(x_j.clone()) - &x_i), q);
        denominator = (denominator * difference) % q;
    }
    let inverse = Util::mod_inverse(&denominator, q).ok_or(Error::NotInvertible)?;
    Ok((numerator * inverse) % q)
}

/// Recover P(0) from any `k` distinct points of a degree `k - 1` polynomial.
pub fn interpolate_at_zero(points: &[Point], q: &BigUint) -> Result<BigUint> {
    let indices: Vec<BigUint> = points.iter().map(|point| point.x_value.clone()).collect();
    for (i, x) in indices.iter().enumerate() {
        if indices[..i].contains(x) {
            return Err(Error::DuplicateIndex(x.clone()));
        }
    }
    points.iter().try_fold(BigUint::zero(), |acc, point| {
        let coefficient = lagrange_coefficient(&point.x_value, &indices, q)?;
        Ok((acc + coefficient * &point.y_value) % q)
    })
}
