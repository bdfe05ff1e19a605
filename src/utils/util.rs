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

/// Indexes in `0..length` that are not in `indexes`, in ascending order.
pub fn get_remaining_indexes(length: usize, indexes: &[usize]) -> Vec<usize> {
    (0..length).filter(|i| !indexes.contains(i)).collect()
}

/// Sorts and deduplicates a list of message indexes.
pub fn normalize_indexes(indexes: &[usize]) -> Vec<usize> {
    let mut indexes = indexes.to_vec();
    indexes.sort_unstable();
    indexes.dedup();
    indexes
}

/// Picks the messages at the given indexes. Out of range indexes are skipped.
pub fn get_messages_vec(messages: &[Vec<u8>], indexes: &[usize]) -> Vec<Vec<u8>> {
    indexes
        .iter()
        .filter_map(|&i| messages.get(i).cloned())
        .collect()
}

#[cfg(feature = "bbsplus")]
pub mod bbsplus_utils {
    use bls12_381_plus::{G1Affine, G1Projective, Scalar};
    use elliptic_curve::hash2curve::{ExpandMsg, Expander};
    use ff::Field;
    use group::{Curve, Group};
    use rand::{CryptoRng, RngCore};

    use crate::{
        bbsplus::{ciphersuites::BbsCiphersuite, generators::Generators, keys::BBSplusPublicKey},
        errors::Error,
        utils::message::BBSplusMessage,
    };

    pub const SCALAR_LEN: usize = 32;
    pub const POINT_G1_LEN: usize = 48;
    pub const POINT_G2_LEN: usize = 96;
    const OKM_LEN: usize = 48;

    /// I2OSP(value, len): big-endian encoding of `value` on exactly `len` bytes.
    pub fn i2osp(value: usize, len: usize) -> Vec<u8> {
        let bytes = (value as u64).to_be_bytes();
        if len >= bytes.len() {
            let mut out = vec![0u8; len - bytes.len()];
            out.extend_from_slice(&bytes);
            out
        } else {
            bytes[bytes.len() - len..].to_vec()
        }
    }

    pub(crate) fn expand_message<CS: BbsCiphersuite>(
        msg: &[u8],
        dst: &[u8],
        out: &mut [u8],
    ) -> Result<(), Error> {
        let dsts = [dst];
        CS::Expander::expand_message(&[msg], &dsts, out.len())
            .map_err(|_| Error::HashToScalarError)?
            .fill_bytes(out);
        Ok(())
    }

    /// Hashes an arbitrary octet string to a non-zero scalar.
    ///
    /// A counter octet is appended to the input and incremented until the
    /// output is not zero.
    pub fn hash_to_scalar<CS: BbsCiphersuite>(msg_octets: &[u8], dst: &[u8]) -> Result<Scalar, Error> {
        if dst.len() > 255 {
            return Err(Error::HashToScalarError);
        }

        let mut uniform_bytes = [0u8; OKM_LEN];
        for counter in 0..=u8::MAX {
            let msg_prime = [msg_octets, &[counter][..]].concat();
            expand_message::<CS>(&msg_prime, dst, &mut uniform_bytes)?;
            let scalar = Scalar::from_okm(&uniform_bytes);
            if !bool::from(scalar.is_zero()) {
                return Ok(scalar);
            }
        }

        Err(Error::HashToScalarError)
    }

    /// Draws `count` uniformly random scalars from the caller's generator.
    pub fn calculate_random_scalars<R>(rng: &mut R, count: usize) -> Vec<Scalar>
    where
        R: RngCore + CryptoRng,
    {
        let mut buf = [0u8; OKM_LEN];
        (0..count)
            .map(|_| {
                rng.fill_bytes(&mut buf);
                Scalar::from_okm(&buf)
            })
            .collect()
    }

    /// Same as [`calculate_random_scalars`] for a single scalar that must not be zero.
    pub fn random_nonzero_scalar<R>(rng: &mut R) -> Scalar
    where
        R: RngCore + CryptoRng,
    {
        loop {
            let s = Scalar::random(&mut *rng);
            if !bool::from(s.is_zero()) {
                return s;
            }
        }
    }

    /// Computes `sum(points[i] * scalars[i])`.
    pub fn multi_scalar_mul(points: &[G1Projective], scalars: &[Scalar]) -> G1Projective {
        points
            .iter()
            .zip(scalars.iter())
            .fold(G1Projective::IDENTITY, |acc, (p, s)| acc + p * s)
    }

    /// B = P1 + h0 * s + h_1 * msg_1 + ... + h_L * msg_L
    pub(crate) fn compute_b(generators: &Generators, s: Scalar, messages: &[BBSplusMessage]) -> Result<G1Projective, Error> {
        if generators.message_generators.len() != messages.len() {
            return Err(Error::NotEnoughGenerators);
        }
        let scalars: Vec<Scalar> = messages.iter().map(|m| m.value).collect();
        Ok(generators.g1_base_point
            + generators.h0 * s
            + multi_scalar_mul(&generators.message_generators, &scalars))
    }

    /// Binds the public key, the generators and the number of signed messages
    /// into a single scalar.
    pub(crate) fn calculate_domain<CS: BbsCiphersuite>(
        pk: &BBSplusPublicKey,
        generators: &Generators,
    ) -> Result<Scalar, Error> {
        let L = generators.message_generators.len();

        let mut dom_input: Vec<u8> = Vec::new();
        dom_input.extend_from_slice(&pk.to_bytes());
        dom_input.extend_from_slice(&i2osp(L, 8));
        dom_input.extend_from_slice(&generators.h0.to_affine().to_compressed());
        generators
            .message_generators
            .iter()
            .for_each(|p| dom_input.extend_from_slice(&p.to_affine().to_compressed()));
        dom_input.extend_from_slice(CS::API_ID);

        hash_to_scalar::<CS>(&dom_input, &CS::h2s_dst())
    }

    pub fn is_identity(p: &G1Projective) -> bool {
        bool::from(p.is_identity())
    }

    /// Decodes a compressed G1 point, with the subgroup check.
    pub(crate) fn parse_g1_projective(bytes: &[u8]) -> Result<G1Projective, Error> {
        let bytes: [u8; POINT_G1_LEN] = bytes
            .try_into()
            .map_err(|_| Error::DeserializationError("G1 point must be 48 bytes".to_owned()))?;
        let point: Option<G1Affine> = G1Affine::from_compressed(&bytes).into();
        point.map(G1Projective::from).ok_or(Error::PointNotOnCurve)
    }

    /// Decodes a big-endian scalar, rejecting values `>= r`.
    pub(crate) fn parse_scalar(bytes: &[u8]) -> Result<Scalar, Error> {
        let bytes: [u8; SCALAR_LEN] = bytes
            .try_into()
            .map_err(|_| Error::DeserializationError("scalar must be 32 bytes".to_owned()))?;
        Scalar::from_bytes_be(&bytes)
            .ok_or_else(|| Error::DeserializationError("non canonical scalar".to_owned()))
    }

    pub trait ScalarExt {
        fn to_bytes_be(&self) -> [u8; SCALAR_LEN];
        fn from_bytes_be(bytes: &[u8; SCALAR_LEN]) -> Option<Self>
        where
            Self: Sized;
    }

    impl ScalarExt for Scalar {
        fn to_bytes_be(&self) -> [u8; SCALAR_LEN] {
            self.to_be_bytes()
        }

        /// Rejects non canonical encodings (values `>= r`).
        fn from_bytes_be(bytes: &[u8; SCALAR_LEN]) -> Option<Self> {
            Option::from(Scalar::from_be_bytes(bytes))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::bbsplus::ciphersuites::{Bls12381Sha256, Bls12381Shake256};
        use rand::{rngs::StdRng, SeedableRng};

        #[test]
        fn i2osp_pads_and_truncates() {
            assert_eq!(i2osp(1, 2), vec![0u8, 1]);
            assert_eq!(i2osp(258, 4), vec![0u8, 0, 1, 2]);
            assert_eq!(i2osp(3, 8), vec![0u8, 0, 0, 0, 0, 0, 0, 3]);
            assert_eq!(i2osp(0x0102, 1), vec![0x02u8]);
        }

        #[test]
        fn hash_to_scalar_is_deterministic_and_domain_separated() {
            let dst = Bls12381Sha256::h2s_dst();
            let a = hash_to_scalar::<Bls12381Sha256>(b"message", &dst).unwrap();
            let b = hash_to_scalar::<Bls12381Sha256>(b"message", &dst).unwrap();
            assert_eq!(a, b);

            let other_dst = Bls12381Sha256::map_msg_dst();
            let c = hash_to_scalar::<Bls12381Sha256>(b"message", &other_dst).unwrap();
            assert_ne!(a, c);

            let d = hash_to_scalar::<Bls12381Shake256>(b"message", &Bls12381Shake256::h2s_dst()).unwrap();
            assert_ne!(a, d);
        }

        #[test]
        fn hash_to_scalar_rejects_long_dst() {
            let dst = vec![0u8; 256];
            assert_eq!(
                hash_to_scalar::<Bls12381Sha256>(b"message", &dst),
                Err(Error::HashToScalarError)
            );
        }

        #[test]
        fn random_scalars_depend_on_the_rng() {
            let mut rng = StdRng::seed_from_u64(7);
            let first = calculate_random_scalars(&mut rng, 3);
            assert_eq!(first.len(), 3);
            assert_ne!(first[0], first[1]);

            let mut rng = StdRng::seed_from_u64(7);
            assert_eq!(first, calculate_random_scalars(&mut rng, 3));
        }

        #[test]
        fn multi_scalar_mul_matches_naive_sum() {
            let mut rng = StdRng::seed_from_u64(11);
            let points = [G1Projective::GENERATOR, G1Projective::GENERATOR.double()];
            let scalars = calculate_random_scalars(&mut rng, 2);
            let expected = points[0] * scalars[0] + points[1] * scalars[1];
            assert_eq!(multi_scalar_mul(&points, &scalars), expected);
            assert!(is_identity(&multi_scalar_mul(&[], &[])));
        }

        #[test]
        fn scalar_be_encoding_rejects_non_canonical() {
            let one = Scalar::ONE;
            assert_eq!(Scalar::from_bytes_be(&one.to_bytes_be()), Some(one));
            assert_eq!(Scalar::from_bytes_be(&[0xffu8; SCALAR_LEN]), None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_indexes() {
        assert_eq!(get_remaining_indexes(5, &[0, 3]), vec![1, 2, 4]);
        assert_eq!(get_remaining_indexes(2, &[]), vec![0, 1]);
        assert!(get_remaining_indexes(0, &[]).is_empty());
    }

    #[test]
    fn normalize_sorts_and_dedups() {
        assert_eq!(normalize_indexes(&[3, 1, 3, 0]), vec![0, 1, 3]);
    }

    #[test]
    fn picks_messages_by_index() {
        let messages = vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()];
        assert_eq!(get_messages_vec(&messages, &[0, 2, 9]), vec![b"a".to_vec(), b"c".to_vec()]);
    }
}
