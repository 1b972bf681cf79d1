// Copyright 2020-2026 MathxH Chen.
//
// Code is licensed under MIT Apache Dual License

//! (k, n) verifiable secret sharing of trustee secrets.
//!
//! The dealer picks two polynomials `F`, `G` of degree `k - 1` with free
//! terms `s`, `t`, hands trustee `i` the points `(i, F(i))`, `(i, G(i))` and
//! publishes `Ei[j] = ground_1^F_j * ground_2^G_j` for every coefficient.

use log::{info, warn};
use num_bigint::BigUint;
use num_traits::identities::{One, Zero};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::elgamal::PublicKey;
use crate::error::{Error, Result};
use crate::params::CryptoParams;
use crate::polynomial::Polynomial;
use crate::serialize::big_uint;
use crate::sharebox::{CommitmentE, Share};

/// Tag hashed into the group to derive the second Pedersen base.
const GROUND_2_TAG: &[u8] = b"homomorphic-vote/ground_2";

/// Roster entry: the public index at which the trustee's share is evaluated
/// and the key its share is encrypted to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trustee {
    #[serde(with = "big_uint")]
    pub trustee_index: BigUint,
    pub public_key: PublicKey,
}

impl Trustee {
    pub fn new(trustee_index: BigUint, public_key: PublicKey) -> Self {
        Trustee {
            trustee_index,
            public_key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdScheme {
    pub n: usize,
    pub k: usize,
    #[serde(with = "big_uint")]
    pub ground_1: BigUint,
    #[serde(with = "big_uint")]
    pub ground_2: BigUint,
}

impl ThresholdScheme {
    /// `ground_1 = g`; `ground_2` is hashed into the group so that nobody
    /// knows its discrete log to the base `g`.
    pub fn new(n: usize, k: usize, params: &CryptoParams) -> Result<Self> {
        let ground_2 = params.derive_generator(GROUND_2_TAG);
        ThresholdScheme::with_grounds(n, k, params.g.clone(), ground_2, params)
    }

    pub fn with_grounds(
        n: usize,
        k: usize,
        ground_1: BigUint,
        ground_2: BigUint,
        params: &CryptoParams,
    ) -> Result<Self> {
        if k == 0 || k > n {
            return Err(Error::InvalidThreshold { k, n });
        }
        if !params.is_member(&ground_1) || !params.is_member(&ground_2) || ground_1 == ground_2 {
            return Err(Error::InvalidParameters(
                "commitment bases must be distinct subgroup elements".to_string(),
            ));
        }
        Ok(ThresholdScheme {
            n,
            k,
            ground_1,
            ground_2,
        })
    }

    /// Deal `s` (with blinding `t`) to `trustees`.
    ///
    /// Every returned share has been checked against the commitments; a
    /// dealer never emits a share that does not verify.
    pub fn share_verifiably(
        &self,
        s: &BigUint,
        t: &BigUint,
        params: &CryptoParams,
        trustees: &[Trustee],
    ) -> Result<Vec<Share>> {
        if trustees.len() != self.n {
            return Err(Error::InvalidThreshold {
                k: self.k,
                n: trustees.len(),
            });
        }
        let mut seen = BTreeSet::new();
        for trustee in trustees {
            let index = &trustee.trustee_index % &params.q;
            if index.is_zero() {
                // F(0) is the secret
                return Err(Error::InvalidParameters(
                    "trustee index must be non-zero mod q".to_string(),
                ));
            }
            if !seen.insert(index) {
                return Err(Error::DuplicateIndex(trustee.trustee_index.clone()));
            }
        }

        let f = Polynomial::new(s, self.k, &params.q);
        let g = Polynomial::new(t, self.k, &params.q);

        // Create points on polynomials from trustee x values.
        let points_f = f.create_points(trustees);
        let points_g = g.create_points(trustees);

        let p_minus_1 = &params.p - BigUint::one();
        let mut ei = Vec::with_capacity(self.k);
        for (f_j, g_j) in f.coefficients.iter().zip(g.coefficients.iter()) {
            let commitment =
                CommitmentE::generate(f_j, g_j, &self.ground_1, &self.ground_2, params);
            if commitment.value >= p_minus_1 {
                return Err(Error::CommitmentOutOfRange);
            }
            ei.push(commitment);
        }

        let shares = points_f
            .into_iter()
            .zip(points_g.into_iter())
            .map(|(point_s, point_t)| {
                let share = Share::new(point_s, point_t, ei.clone());
                share.check(self, params)?;
                Ok(share)
            })
            .collect::<Result<Vec<Share>>>()?;

        info!("dealt {} verifiable shares with threshold {}", shares.len(), self.k);
        Ok(shares)
    }
}

/// Lifecycle of one dealer's sharing round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SharingState {
    Uninitialized,
    Shared,
    Verified,
    Combined,
    Rejected,
}

/// `Uninitialized -> Shared -> Verified -> (Combined | Rejected)`.
///
/// Verification is all-or-nothing: a single bad share rejects the round and
/// the dealer has to deal again.
#[derive(Debug, Clone)]
pub struct SharingRound {
    pub scheme: ThresholdScheme,
    state: SharingState,
    shares: Vec<Share>,
    rejected: Vec<BigUint>,
}

impl SharingRound {
    pub fn new(scheme: ThresholdScheme) -> Self {
        SharingRound {
            scheme,
            state: SharingState::Uninitialized,
            shares: Vec::new(),
            rejected: Vec::new(),
        }
    }

    pub fn state(&self) -> SharingState {
        self.state
    }

    pub fn shares(&self) -> &[Share] {
        &self.shares
    }

    /// Indices of the trustees whose shares failed verification.
    pub fn rejected(&self) -> &[BigUint] {
        &self.rejected
    }

    fn transition(&mut self, to: SharingState) -> Result<()> {
        use SharingState::*;
        let allowed = matches!(
            (self.state, to),
            (Uninitialized, Shared)
                | (Shared, Verified)
                | (Shared, Rejected)
                | (Verified, Combined)
                | (Verified, Rejected)
        );
        if !allowed {
            return Err(Error::InvalidTransition { from: self.state, to });
        }
        self.state = to;
        Ok(())
    }

    /// Deal the secrets as the dealer.
    pub fn deal(
        &mut self,
        s: &BigUint,
        t: &BigUint,
        params: &CryptoParams,
        trustees: &[Trustee],
    ) -> Result<&[Share]> {
        if self.state != SharingState::Uninitialized {
            return Err(Error::InvalidTransition {
                from: self.state,
                to: SharingState::Shared,
            });
        }
        let shares = self.scheme.share_verifiably(s, t, params, trustees)?;
        self.receive(shares)?;
        Ok(&self.shares)
    }

    /// Record shares published by an external dealer.
    pub fn receive(&mut self, shares: Vec<Share>) -> Result<()> {
        self.transition(SharingState::Shared)?;
        self.shares = shares;
        Ok(())
    }

    /// Check every share against the commitments. On failure the round is
    /// rejected and the offending trustee indices are kept.
    pub fn verify(&mut self, params: &CryptoParams) -> Result<()> {
        if self.state != SharingState::Shared {
            return Err(Error::InvalidTransition {
                from: self.state,
                to: SharingState::Verified,
            });
        }
        let mut first_error = None;
        if self.shares.len() != self.scheme.n {
            first_error = Some(Error::InvalidThreshold {
                k: self.scheme.k,
                n: self.shares.len(),
            });
        }
        for share in &self.shares {
            if let Err(e) = share.check(&self.scheme, params) {
                warn!("share for trustee {} rejected: {}", share.index(), e);
                self.rejected.push(share.index().clone());
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => {
                self.transition(SharingState::Rejected)?;
                Err(e)
            }
            None => self.transition(SharingState::Verified),
        }
    }

    /// Fold another verified round into this one, index by index.
    pub fn combine(&mut self, other: &SharingRound, params: &CryptoParams) -> Result<()> {
        if other.state != SharingState::Verified && other.state != SharingState::Combined {
            return Err(Error::InvalidTransition {
                from: other.state,
                to: SharingState::Combined,
            });
        }
        if self.state != SharingState::Verified {
            return Err(Error::InvalidTransition {
                from: self.state,
                to: SharingState::Combined,
            });
        }
        let mut combined = Vec::with_capacity(self.shares.len());
        for share in &self.shares {
            let matching = other
                .shares
                .iter()
                .find(|o| o.index() == share.index())
                .ok_or(Error::MismatchedShareIndex)?;
            combined.push(share.add(matching, params)?);
        }
        self.transition(SharingState::Combined)?;
        self.shares = combined;
        Ok(())
    }

    /// Give up on this round, e.g. after a trustee complaint.
    pub fn reject(&mut self) -> Result<()> {
        self.transition(SharingState::Rejected)
    }
}
