// Copyright 2025 Fondazione LINKS

// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at

//     http://www.apache.org/licenses/LICENSE-2.0

// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use core::fmt;

use bls12_381_plus::{G2Affine, G2Projective, Scalar};
use ff::Field;
use group::Curve;
use rand::{CryptoRng, RngCore};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::ciphersuites::BbsCiphersuite;
use crate::{
    errors::Error,
    keys::{
        pair::KeyPair,
        traits::{PrivateKey, PublicKey},
    },
    schemes::algorithms::BBSplus,
    utils::util::bbsplus_utils::{expand_message, hash_to_scalar, i2osp, ScalarExt, POINT_G2_LEN, SCALAR_LEN},
};

/// `W = SK * P2`. Values of this type are never the identity: every
/// constructor goes through [`BBSplusPublicKey::from_bytes`] or derives the
/// point from a non-zero secret key.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BBSplusPublicKey(pub(crate) G2Projective);

impl BBSplusPublicKey {
    pub const BYTES: usize = POINT_G2_LEN;

    pub fn to_bytes(&self) -> [u8; Self::BYTES] {
        self.0.to_affine().to_compressed()
    }

    pub fn encode(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Parses a compressed G2 point. The length is checked before the point is
    /// decoded, the input is never truncated nor padded.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let bytes: [u8; Self::BYTES] = bytes.try_into().map_err(|_| Error::InvalidKeyLength {
            expected: Self::BYTES,
            actual: bytes.len(),
        })?;

        let point: Option<G2Affine> = G2Affine::from_compressed(&bytes).into();
        let point = point.ok_or(Error::PointNotOnCurve)?;

        if bool::from(point.is_identity()) {
            return Err(Error::PointAtInfinity);
        }

        Ok(Self(G2Projective::from(point)))
    }

    /// Rejects the point at infinity, for which any `(A, e, s)` verifies.
    pub(crate) fn validate(&self) -> Result<(), Error> {
        if bool::from(self.0.is_identity()) {
            return Err(Error::PointAtInfinity);
        }
        Ok(())
    }
}

impl Serialize for BBSplusPublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for BBSplusPublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        let bytes = hex::decode(encoded).map_err(de::Error::custom)?;
        Self::from_bytes(&bytes).map_err(de::Error::custom)
    }
}

/// The signer secret, a non-zero scalar. Overwritten with zero when dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct BBSplusSecretKey(pub(crate) Scalar);

impl BBSplusSecretKey {
    pub const BYTES: usize = SCALAR_LEN;

    //in BE order
    pub fn to_bytes(&self) -> [u8; Self::BYTES] {
        self.0.to_bytes_be()
    }

    pub fn encode(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let bytes: [u8; Self::BYTES] = bytes.try_into().map_err(|_| Error::InvalidKeyLength {
            expected: Self::BYTES,
            actual: bytes.len(),
        })?;

        let s = Scalar::from_bytes_be(&bytes).ok_or(Error::KeyDeserializationError)?;
        if bool::from(s.is_zero()) {
            return Err(Error::KeyDeserializationError);
        }

        Ok(Self(s))
    }

    pub fn public_key(&self) -> BBSplusPublicKey {
        BBSplusPublicKey(sk_to_pk(self.0))
    }
}

impl Serialize for BBSplusSecretKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&Zeroizing::new(self.encode()))
    }
}

impl<'de> Deserialize<'de> for BBSplusSecretKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = Zeroizing::new(String::deserialize(deserializer)?);
        let bytes = Zeroizing::new(hex::decode(encoded.as_str()).map_err(de::Error::custom)?);
        Self::from_bytes(&bytes).map_err(de::Error::custom)
    }
}

impl fmt::Debug for BBSplusSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BBSplusSecretKey(..)")
    }
}

impl Zeroize for BBSplusSecretKey {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl Drop for BBSplusSecretKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl ZeroizeOnDrop for BBSplusSecretKey {}

impl PublicKey for BBSplusPublicKey {
    type Output = [u8; POINT_G2_LEN];

    fn to_bytes(&self) -> Self::Output {
        BBSplusPublicKey::to_bytes(self)
    }

    fn encode(&self) -> String {
        BBSplusPublicKey::encode(self)
    }
}

impl PrivateKey for BBSplusSecretKey {
    type Output = [u8; SCALAR_LEN];

    fn to_bytes(&self) -> Self::Output {
        BBSplusSecretKey::to_bytes(self)
    }

    fn encode(&self) -> String {
        BBSplusSecretKey::encode(self)
    }
}

impl<CS: BbsCiphersuite> KeyPair<BBSplus<CS>> {
    /// Deterministically derives a key pair from `key_material`.
    ///
    /// # Inputs:
    /// * `key_material` (REQUIRED), a secret octet string of at least `CS::IKM_LEN` bytes.
    /// * `key_info` (OPTIONAL), an octet string. Defaults to an empty string if
    /// not supplied.
    /// * `key_dst` (OPTIONAL), an octet string representing the domain separation
    /// tag. Defaults to `API_ID || "KEYGEN_DST_"` if not supplied.
    pub fn generate(key_material: &[u8], key_info: Option<&[u8]>, key_dst: Option<&[u8]>) -> Result<Self, Error> {
        let sk = key_gen::<CS>(key_material, key_info, key_dst)?;
        let pk = sk_to_pk(sk);

        Ok(Self {
            public: BBSplusPublicKey(pk),
            private: BBSplusSecretKey(sk),
        })
    }

    /// Draws fresh key material from `rng` and derives a key pair from it.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self, Error> {
        let mut key_material = vec![0u8; CS::IKM_LEN];
        rng.fill_bytes(&mut key_material);
        let keypair = Self::generate(&key_material, None, None);
        key_material.zeroize();
        keypair
    }

    /// Derives a key pair from a seed of any length, empty included.
    ///
    /// Seeds of at least `CS::IKM_LEN` bytes are used as key material directly,
    /// shorter ones are first expanded to `CS::IKM_LEN` bytes under the
    /// `API_ID || "KEYGEN_SEED_"` tag.
    pub fn from_seed(seed: &[u8], key_info: Option<&[u8]>) -> Result<Self, Error> {
        if seed.len() >= CS::IKM_LEN {
            return Self::generate(seed, key_info, None);
        }

        let mut key_material = Zeroizing::new(vec![0u8; CS::IKM_LEN]);
        expand_message::<CS>(seed, &CS::keygen_seed_dst(), &mut key_material)
            .map_err(|e| Error::KeyGenError(e.to_string()))?;
        Self::generate(&key_material, key_info, None)
    }

    /// Rebuilds a key pair from an encoded secret key.
    pub fn from_secret_key_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let private = BBSplusSecretKey::from_bytes(bytes)?;
        let public = private.public_key();
        Ok(Self { public, private })
    }
}

/// SK = hash_to_scalar(key_material || I2OSP(length(key_info), 2) || key_info, key_dst)
pub(crate) fn key_gen<CS: BbsCiphersuite>(
    key_material: &[u8],
    key_info: Option<&[u8]>,
    key_dst: Option<&[u8]>,
) -> Result<Scalar, Error> {
    if key_material.len() < CS::IKM_LEN {
        return Err(Error::KeyGenError(format!(
            "length(key_material) < {}",
            CS::IKM_LEN
        )));
    }

    let key_info = key_info.unwrap_or(&[]);
    if key_info.len() > 65535 {
        return Err(Error::KeyGenError("length(key_info) > 65535".to_owned()));
    }

    let key_dst_default = CS::keygen_dst();
    let key_dst = key_dst.unwrap_or(&key_dst_default);

    let mut derive_input = [key_material, &i2osp(key_info.len(), 2)[..], key_info].concat();
    let sk = hash_to_scalar::<CS>(&derive_input, key_dst);
    derive_input.zeroize();

    sk.map_err(|e| Error::KeyGenError(e.to_string()))
}

/// W = SK * BP2
pub(crate) fn sk_to_pk(sk: Scalar) -> G2Projective {
    G2Projective::GENERATOR * sk
}
