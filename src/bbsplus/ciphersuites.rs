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

use core::fmt::Debug;

use digest::HashMarker;
use elliptic_curve::hash2curve::{ExpandMsg, ExpandMsgXmd, ExpandMsgXof};
use sha2::Sha256;
use sha3::Shake256;

/// Hash function, expander and domain separation tags used by every BBS+ algorithm.
///
/// Every tag is prefixed by either [`BbsCiphersuite::ID`] or [`BbsCiphersuite::API_ID`],
/// so values produced under one ciphersuite can never be confused with values
/// produced under another.
pub trait BbsCiphersuite: Clone + Copy + Eq + Debug + Default + Send + Sync + 'static {
    const ID: &'static [u8];
    const API_ID: &'static [u8];
    const GENERATOR_SEED_BP: &'static [u8];
    const GENERATOR_SEED_DST: &'static [u8];
    const GENERATOR_DST: &'static [u8];
    const H2S: &'static [u8] = b"H2S_";
    const MAP_MSG_SUFFIX: &'static [u8] = b"MAP_MSG_TO_SCALAR_AS_HASH_";
    const KEYGEN_SUFFIX: &'static [u8] = b"KEYGEN_DST_";
    const KEYGEN_SEED_SUFFIX: &'static [u8] = b"KEYGEN_SEED_";
    /// Minimum length of the key material accepted by the key generation.
    const IKM_LEN: usize = 32;
    const EXPAND_LEN: usize = 48;

    type HashAlg: HashMarker;
    type Expander: for<'a> ExpandMsg<'a>;

    fn keygen_dst() -> Vec<u8> {
        [Self::API_ID, Self::KEYGEN_SUFFIX].concat()
    }

    /// Tag used to stretch seeds shorter than [`BbsCiphersuite::IKM_LEN`].
    fn keygen_seed_dst() -> Vec<u8> {
        [Self::API_ID, Self::KEYGEN_SEED_SUFFIX].concat()
    }

    fn h2s_dst() -> Vec<u8> {
        [Self::API_ID, Self::H2S].concat()
    }

    fn map_msg_dst() -> Vec<u8> {
        [Self::API_ID, Self::MAP_MSG_SUFFIX].concat()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Bls12381Shake256;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Bls12381Sha256;

impl BbsCiphersuite for Bls12381Shake256 {
    const ID: &'static [u8] = b"BBS_BLS12381G1_XOF:SHAKE-256_SSWU_RO_";
    const API_ID: &'static [u8] = b"BBS_BLS12381G1_XOF:SHAKE-256_SSWU_RO_H2G_HM2S_";
    const GENERATOR_SEED_BP: &'static [u8] =
        b"BBS_BLS12381G1_XOF:SHAKE-256_SSWU_RO_H2G_HM2S_BP_MESSAGE_GENERATOR_SEED";
    const GENERATOR_SEED_DST: &'static [u8] =
        b"BBS_BLS12381G1_XOF:SHAKE-256_SSWU_RO_H2G_HM2S_SIG_GENERATOR_SEED_";
    const GENERATOR_DST: &'static [u8] =
        b"BBS_BLS12381G1_XOF:SHAKE-256_SSWU_RO_H2G_HM2S_SIG_GENERATOR_DST_";
    type HashAlg = Shake256;
    type Expander = ExpandMsgXof<Self::HashAlg>;
}

impl BbsCiphersuite for Bls12381Sha256 {
    const ID: &'static [u8] = b"BBS_BLS12381G1_XMD:SHA-256_SSWU_RO_";
    const API_ID: &'static [u8] = b"BBS_BLS12381G1_XMD:SHA-256_SSWU_RO_H2G_HM2S_";
    const GENERATOR_SEED_BP: &'static [u8] =
        b"BBS_BLS12381G1_XMD:SHA-256_SSWU_RO_H2G_HM2S_BP_MESSAGE_GENERATOR_SEED";
    const GENERATOR_SEED_DST: &'static [u8] =
        b"BBS_BLS12381G1_XMD:SHA-256_SSWU_RO_H2G_HM2S_SIG_GENERATOR_SEED_";
    const GENERATOR_DST: &'static [u8] =
        b"BBS_BLS12381G1_XMD:SHA-256_SSWU_RO_H2G_HM2S_SIG_GENERATOR_DST_";
    type HashAlg = Sha256;
    type Expander = ExpandMsgXmd<Self::HashAlg>;
}
