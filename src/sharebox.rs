// Copyright 2020-2026 MathxH Chen.
//
// Code is licensed under MIT Apache Dual License

//! Shares handed out by a dealer, their Pedersen commitments and the
//! encrypted, signed envelopes they travel in.

use log::{debug, warn};
use num_bigint::BigUint;
use num_traits::identities::One;
use serde::{Deserialize, Serialize};

use crate::elgamal::{Ciphertext, PublicKey, SecretKey};
use crate::error::{Error, Result};
use crate::params::CryptoParams;
use crate::polynomial::Point;
use crate::serialize::{big_uint, indexed};
use crate::signature::Signature;
use crate::threshold::ThresholdScheme;

/// Pedersen commitment `ground_1^s * ground_2^t mod p`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitmentE {
    #[serde(with = "big_uint")]
    pub ground_1: BigUint,
    #[serde(with = "big_uint")]
    pub ground_2: BigUint,
    #[serde(with = "big_uint")]
    pub value: BigUint,
}

impl CommitmentE {
    /// `s` and `t` are reduced mod q first.
    pub fn generate(
        s: &BigUint,
        t: &BigUint,
        ground_1: &BigUint,
        ground_2: &BigUint,
        params: &CryptoParams,
    ) -> Self {
        let s = s % &params.q;
        let t = t % &params.q;
        let value = (ground_1.modpow(&s, &params.p) * ground_2.modpow(&t, &params.p)) % &params.p;
        CommitmentE {
            ground_1: ground_1.clone(),
            ground_2: ground_2.clone(),
            value,
        }
    }

    /// Commitment to `(s1 + s2, t1 + t2)`; only defined over the same bases.
    pub fn add(&self, other: &CommitmentE, params: &CryptoParams) -> Result<CommitmentE> {
        if self.ground_1 != other.ground_1 || self.ground_2 != other.ground_2 {
            return Err(Error::InvalidParameters(
                "commitments use different bases".to_string(),
            ));
        }
        Ok(CommitmentE {
            ground_1: self.ground_1.clone(),
            ground_2: self.ground_2.clone(),
            value: (&self.value * &other.value) % &params.p,
        })
    }
}

/// What trustee `i` receives: `(i, F(i))`, `(i, G(i))` and the dealer's
/// public commitments to every coefficient of `F` and `G`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub point_s: Point,
    pub point_t: Point,
    #[serde(rename = "Ei", with = "indexed")]
    pub ei: Vec<CommitmentE>,
}

impl Share {
    pub fn new(point_s: Point, point_t: Point, ei: Vec<CommitmentE>) -> Self {
        Share { point_s, point_t, ei }
    }

    pub fn index(&self) -> &BigUint {
        &self.point_s.x_value
    }

    /// Check the share against the published commitments:
    /// `E(F(i), G(i)) == prod_j Ei[j]^(i^j) mod p`.
    ///
    /// Exponents `i^j` are reduced mod q, the order of every commitment.
    pub fn check(&self, scheme: &ThresholdScheme, params: &CryptoParams) -> Result<()> {
        if self.ei.len() != scheme.k {
            return Err(Error::CommitmentCount {
                expected: scheme.k,
                found: self.ei.len(),
            });
        }
        if self.point_s.x_value != self.point_t.x_value {
            return Err(Error::MismatchedShareIndex);
        }

        let expected = CommitmentE::generate(
            &self.point_s.y_value,
            &self.point_t.y_value,
            &scheme.ground_1,
            &scheme.ground_2,
            params,
        );
        if expected.value >= &params.p - BigUint::one() {
            return Err(Error::CommitmentOutOfRange);
        }

        let i = &self.point_s.x_value;
        let mut result = BigUint::one();
        let mut exponent = BigUint::one();
        for commitment in &self.ei {
            result = (result * commitment.value.modpow(&exponent, &params.p)) % &params.p;
            exponent = (exponent * i) % &params.q;
        }

        if result != expected.value {
            return Err(Error::InvalidShare(i.clone()));
        }
        Ok(())
    }

    /// [`check`](Self::check) as a boolean.
    pub fn verify_share(&self, scheme: &ThresholdScheme, params: &CryptoParams) -> bool {
        match self.check(scheme, params) {
            Ok(()) => true,
            Err(e) => {
                debug!("share verification failed: {}", e);
                false
            }
        }
    }

    /// Sum of two shares held for the same index, e.g. contributions of two
    /// dealers. Points add mod q, commitments multiply.
    pub fn add(&self, other: &Share, params: &CryptoParams) -> Result<Share> {
        let x = &self.point_s.x_value;
        if x != &self.point_t.x_value
            || x != &other.point_s.x_value
            || x != &other.point_t.x_value
        {
            return Err(Error::MismatchedShareIndex);
        }
        if self.ei.len() != other.ei.len() {
            return Err(Error::CommitmentCount {
                expected: self.ei.len(),
                found: other.ei.len(),
            });
        }
        let ei = self
            .ei
            .iter()
            .zip(other.ei.iter())
            .map(|(a, b)| a.add(b, params))
            .collect::<Result<Vec<CommitmentE>>>()?;

        Ok(Share {
            point_s: Point::new(
                x.clone(),
                (&self.point_s.y_value + &other.point_s.y_value) % &params.q,
            ),
            point_t: Point::new(
                x.clone(),
                (&self.point_t.y_value + &other.point_t.y_value) % &params.q,
            ),
            ei,
        })
    }

    /// The trustee's key share: `x_i = F(i)` and `y_i = g^F(i)`.
    pub fn key_share(&self, params: &CryptoParams) -> SecretKey {
        SecretKey::from_exponent(params, self.point_s.y_value.clone())
    }

    pub fn encrypt(&self, public_key: &PublicKey) -> Result<EncryptedShare> {
        Ok(EncryptedShare {
            encry_point_s: self.point_s.encrypt(public_key)?,
            encry_point_t: self.point_t.encrypt(public_key)?,
            ei: self.ei.clone(),
        })
    }

    /// Canonical JSON (sorted keys) the signature is computed over.
    pub fn canonical_json(&self) -> Result<String> {
        let value = serde_json::to_value(self)?;
        Ok(serde_json::to_string(&value)?)
    }

    /// ElGamal signature of the dealer over this share.
    pub fn sign(&self, secret_key: &SecretKey) -> Result<Signature> {
        Signature::generate(self.canonical_json()?.as_bytes(), secret_key)
    }

    pub fn verify_signature(&self, signature: &Signature, public_key: &PublicKey) -> Result<bool> {
        Ok(signature.verify(self.canonical_json()?.as_bytes(), public_key))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPoint {
    pub ciph_x: Ciphertext,
    pub ciph_y: Ciphertext,
}

impl EncryptedPoint {
    pub fn decrypt(&self, secret_key: &SecretKey) -> Result<Point> {
        let x_value = secret_key.decrypt(&self.ciph_x, true)?.m;
        let y_value = secret_key.decrypt(&self.ciph_y, true)?.m;
        Ok(Point::new(x_value, y_value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedShare {
    pub encry_point_s: EncryptedPoint,
    pub encry_point_t: EncryptedPoint,
    #[serde(rename = "Ei", with = "indexed")]
    pub ei: Vec<CommitmentE>,
}

impl EncryptedShare {
    pub fn decrypt(&self, secret_key: &SecretKey) -> Result<Share> {
        Ok(Share {
            point_s: self.encry_point_s.decrypt(secret_key)?,
            point_t: self.encry_point_t.decrypt(secret_key)?,
            ei: self.ei.clone(),
        })
    }
}

/// A share encrypted for its recipient and signed by its dealer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedEncryptedShare {
    pub sig: Signature,
    pub encr_share: EncryptedShare,
}

impl SignedEncryptedShare {
    /// Sign `share` with the dealer's key and encrypt it for the recipient.
    pub fn seal(share: &Share, recipient: &PublicKey, dealer: &SecretKey) -> Result<Self> {
        Ok(SignedEncryptedShare {
            sig: share.sign(dealer)?,
            encr_share: share.encrypt(recipient)?,
        })
    }

    /// Decrypt, then accept the share only if the dealer's signature holds
    /// and it matches its commitments.
    pub fn open(
        &self,
        recipient: &SecretKey,
        dealer: &PublicKey,
        scheme: &ThresholdScheme,
        params: &CryptoParams,
    ) -> Result<Share> {
        let share = self.encr_share.decrypt(recipient)?;
        if !share.verify_signature(&self.sig, dealer)? {
            warn!("rejecting share for trustee {}: bad dealer signature", share.index());
            return Err(Error::InvalidSignature);
        }
        if let Err(e) = share.check(scheme, params) {
            warn!("rejecting share for trustee {}: {}", share.index(), e);
            return Err(e);
        }
        Ok(share)
    }
}
