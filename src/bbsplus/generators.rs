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

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use bls12_381_plus::G1Projective;
use group::Curve;
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use super::ciphersuites::BbsCiphersuite;
use crate::{
    bbsplus::keys::BBSplusPublicKey,
    errors::Error,
    utils::util::bbsplus_utils::{expand_message, i2osp},
};

/// Public generators shared by signer, holder and verifier.
///
/// `h0` blinds the signature, `message_generators[i]` encodes the i-th message.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Generators {
    pub g1_base_point: G1Projective,
    pub h0: G1Projective,
    pub message_generators: Vec<G1Projective>,
}

impl Serialize for Generators {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let result: Vec<String> = self
            .message_generators
            .iter()
            .map(|item| hex::encode(item.to_affine().to_compressed()))
            .collect();

        let mut state = serializer.serialize_struct("Generators", 3)?;
        state.serialize_field("BP", &hex::encode(self.g1_base_point.to_affine().to_compressed()))?;
        state.serialize_field("H0", &hex::encode(self.h0.to_affine().to_compressed()))?;
        state.serialize_field("MsgGenerators", &result)?;
        state.end()
    }
}

impl Generators {
    /// Derives the blinding generator and `message_count` message generators
    /// from the compressed public key.
    pub fn create<CS: BbsCiphersuite>(pk: &BBSplusPublicKey, message_count: usize) -> Result<Generators, Error> {
        let seed = pk.to_bytes();
        let mut points = Self::create_generators::<CS>(&seed, message_count + 1)?;
        let message_generators = points.split_off(1);

        Ok(Generators {
            g1_base_point: Self::create_g1_base_point::<CS>()?,
            h0: points[0],
            message_generators,
        })
    }

    pub fn message_count(&self) -> usize {
        self.message_generators.len()
    }

    fn create_generators<CS: BbsCiphersuite>(seed: &[u8], count: usize) -> Result<Vec<G1Projective>, Error> {
        let mut generators: Vec<G1Projective> = Vec::with_capacity(count);

        let mut v = vec![0u8; CS::EXPAND_LEN];
        expand_message::<CS>(seed, CS::GENERATOR_SEED_DST, &mut v)?;

        let mut n = 1usize;
        while generators.len() < count {
            let input = [v.as_slice(), &i2osp(n, 8)].concat();
            expand_message::<CS>(&input, CS::GENERATOR_SEED_DST, &mut v)?;
            n += 1;

            let candidate = G1Projective::hash::<CS::Expander>(&v, CS::GENERATOR_DST);
            if !generators.contains(&candidate) {
                generators.push(candidate);
            }
        }

        Ok(generators)
    }

    fn create_g1_base_point<CS: BbsCiphersuite>() -> Result<G1Projective, Error> {
        let mut v = vec![0u8; CS::EXPAND_LEN];
        expand_message::<CS>(CS::GENERATOR_SEED_BP, CS::GENERATOR_SEED_DST, &mut v)?;

        let input = [v.as_slice(), &i2osp(1, 8)].concat();
        expand_message::<CS>(&input, CS::GENERATOR_SEED_DST, &mut v)?;

        Ok(G1Projective::hash::<CS::Expander>(&v, CS::GENERATOR_DST))
    }
}

type CacheKey = (&'static [u8], [u8; BBSplusPublicKey::BYTES], usize);

/// Which entry [`GeneratorCache`] drops when it is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    /// Least recently used.
    #[default]
    Lru,
    /// First in, first out.
    Fifo,
}

/// Limits of a [`GeneratorCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorCacheConfig {
    /// Maximum number of (ciphersuite, public key, message count) entries.
    pub max_entries: usize,
    /// Maximum number of message generators held across all entries.
    pub max_generators: usize,
    pub eviction_policy: EvictionPolicy,
}

impl Default for GeneratorCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 256,
            max_generators: 64 * 1024,
            eviction_policy: EvictionPolicy::default(),
        }
    }
}

impl GeneratorCacheConfig {
    #[must_use]
    pub fn new(max_entries: usize, max_generators: usize) -> Self {
        Self {
            max_entries,
            max_generators,
            eviction_policy: EvictionPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = policy;
        self
    }
}

#[derive(Debug)]
struct CacheEntry {
    generators: Arc<Generators>,
    inserted_at: u64,
    last_access: AtomicU64,
}

/// Memoizes [`Generators::create`] per (ciphersuite, public key, message count).
///
/// The cache is owned by its caller and can be shared between threads. It
/// never holds more than `max_entries` entries nor more than `max_generators`
/// message generators; a single set larger than `max_generators` is returned
/// without being stored.
#[derive(Debug, Default)]
pub struct GeneratorCache {
    config: GeneratorCacheConfig,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    clock: AtomicU64,
}

impl GeneratorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: GeneratorCacheConfig) -> Self {
        Self {
            config,
            entries: RwLock::default(),
            clock: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &GeneratorCacheConfig {
        &self.config
    }

    pub fn get<CS: BbsCiphersuite>(&self, pk: &BBSplusPublicKey, message_count: usize) -> Result<Arc<Generators>, Error> {
        let key: CacheKey = (CS::ID, pk.to_bytes(), message_count);

        if let Some(entry) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            entry.last_access.store(self.tick(), Ordering::Relaxed);
            return Ok(Arc::clone(&entry.generators));
        }

        let generators = Arc::new(Generators::create::<CS>(pk, message_count)?);
        log::debug!("derived {} message generators", message_count);

        if self.config.max_entries == 0 || message_count > self.config.max_generators {
            return Ok(generators);
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = entries.get(&key) {
            return Ok(Arc::clone(&entry.generators));
        }

        self.evict(&mut entries, message_count);

        let now = self.tick();
        entries.insert(
            key,
            CacheEntry {
                generators: Arc::clone(&generators),
                inserted_at: now,
                last_access: AtomicU64::new(now),
            },
        );
        Ok(generators)
    }

    /// Drops entries until one more set of `incoming` generators fits.
    fn evict(&self, entries: &mut HashMap<CacheKey, CacheEntry>, incoming: usize) {
        let mut held: usize = entries.values().map(|e| e.generators.message_count()).sum();

        while !entries.is_empty()
            && (entries.len() >= self.config.max_entries || held + incoming > self.config.max_generators)
        {
            let victim = entries
                .iter()
                .min_by_key(|(_, e)| match self.config.eviction_policy {
                    EvictionPolicy::Lru => e.last_access.load(Ordering::Relaxed),
                    EvictionPolicy::Fifo => e.inserted_at,
                })
                .map(|(k, _)| *k);

            let Some(victim) = victim else { break };
            if let Some(entry) = entries.remove(&victim) {
                held -= entry.generators.message_count();
                log::debug!("evicted {} cached message generators", entry.generators.message_count());
            }
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bbsplus::ciphersuites::{Bls12381Sha256, Bls12381Shake256},
        keys::pair::KeyPair,
        schemes::algorithms::BBSplus,
    };
    use rand::{rngs::StdRng, SeedableRng};

    const IKM: &[u8] = b"this-IS-just-an-Test-IKM-to-generate-$e(r@#-key";

    fn public_key(ikm: &[u8]) -> BBSplusPublicKey {
        *KeyPair::<BBSplus<Bls12381Sha256>>::generate(ikm, None, None)
            .unwrap()
            .public_key()
    }

    #[test]
    fn generators_are_reproducible() {
        let pk = public_key(IKM);
        let a = Generators::create::<Bls12381Sha256>(&pk, 5).unwrap();
        let b = Generators::create::<Bls12381Sha256>(&pk, 5).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.message_count(), 5);
    }

    #[test]
    fn generators_are_prefix_stable() {
        let pk = public_key(IKM);
        let short = Generators::create::<Bls12381Sha256>(&pk, 2).unwrap();
        let long = Generators::create::<Bls12381Sha256>(&pk, 6).unwrap();
        assert_eq!(short.h0, long.h0);
        assert_eq!(short.message_generators[..], long.message_generators[..2]);
        assert_eq!(short.g1_base_point, long.g1_base_point);
    }

    #[test]
    fn generators_are_distinct() {
        let pk = public_key(IKM);
        let g = Generators::create::<Bls12381Sha256>(&pk, 4).unwrap();
        let mut all = vec![g.g1_base_point, g.h0];
        all.extend_from_slice(&g.message_generators);
        for i in 0..all.len() {
            for j in (i + 1)..all.len() {
                assert_ne!(all[i], all[j]);
            }
        }
    }

    #[test]
    fn generators_depend_on_key_and_ciphersuite() {
        let pk = public_key(IKM);
        let other = public_key(b"another-IKM-long-enough-for-the-key-generation!");
        let a = Generators::create::<Bls12381Sha256>(&pk, 1).unwrap();
        let b = Generators::create::<Bls12381Sha256>(&other, 1).unwrap();
        let c = Generators::create::<Bls12381Shake256>(&pk, 1).unwrap();
        assert_ne!(a.h0, b.h0);
        assert_ne!(a.h0, c.h0);
        assert_ne!(a.g1_base_point, c.g1_base_point);
        assert_eq!(a.g1_base_point, b.g1_base_point);
    }

    #[test]
    fn zero_messages_still_yield_a_blinding_generator() {
        let pk = public_key(IKM);
        let g = Generators::create::<Bls12381Sha256>(&pk, 0).unwrap();
        assert!(g.message_generators.is_empty());
        assert_eq!(g.h0, Generators::create::<Bls12381Sha256>(&pk, 3).unwrap().h0);
    }

    #[test]
    fn cache_returns_shared_generators() {
        let pk = public_key(IKM);
        let cache = GeneratorCache::new();
        assert!(cache.is_empty());

        let a = cache.get::<Bls12381Sha256>(&pk, 3).unwrap();
        let b = cache.get::<Bls12381Sha256>(&pk, 3).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(*a, Generators::create::<Bls12381Sha256>(&pk, 3).unwrap());

        let _ = cache.get::<Bls12381Shake256>(&pk, 3).unwrap();
        let _ = cache.get::<Bls12381Sha256>(&pk, 4).unwrap();
        assert_eq!(cache.len(), 3);

        cache.clear();
        assert!(cache.is_empty());
    }

    fn random_public_keys(count: usize) -> Vec<BBSplusPublicKey> {
        let mut rng = StdRng::seed_from_u64(30);
        (0..count)
            .map(|_| *KeyPair::<BBSplus<Bls12381Sha256>>::random(&mut rng).unwrap().public_key())
            .collect()
    }

    #[test]
    fn cache_stays_within_its_capacity() {
        let cache = GeneratorCache::with_config(GeneratorCacheConfig::new(8, 1024));
        for pk in random_public_keys(40) {
            cache.get::<Bls12381Sha256>(&pk, 1).unwrap();
            assert!(cache.len() <= 8);
        }
        assert_eq!(cache.len(), 8);
    }

    #[test]
    fn cache_bounds_the_number_of_generators() {
        let pk = public_key(IKM);
        let cache = GeneratorCache::with_config(GeneratorCacheConfig::new(100, 10));

        cache.get::<Bls12381Sha256>(&pk, 4).unwrap();
        cache.get::<Bls12381Sha256>(&pk, 5).unwrap();
        assert_eq!(cache.len(), 2);

        // 4 + 5 + 3 > 10, the oldest set goes
        cache.get::<Bls12381Sha256>(&pk, 3).unwrap();
        assert_eq!(cache.len(), 2);

        // larger than the whole budget, returned but never stored
        let big = cache.get::<Bls12381Sha256>(&pk, 11).unwrap();
        assert_eq!(big.message_count(), 11);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn lru_keeps_recently_used_entries() {
        let keys = random_public_keys(3);
        let cache = GeneratorCache::with_config(GeneratorCacheConfig::new(2, 1024));

        let first = cache.get::<Bls12381Sha256>(&keys[0], 1).unwrap();
        cache.get::<Bls12381Sha256>(&keys[1], 1).unwrap();
        cache.get::<Bls12381Sha256>(&keys[0], 1).unwrap();
        cache.get::<Bls12381Sha256>(&keys[2], 1).unwrap();

        assert_eq!(cache.len(), 2);
        assert!(Arc::ptr_eq(&first, &cache.get::<Bls12381Sha256>(&keys[0], 1).unwrap()));
    }

    #[test]
    fn fifo_drops_the_oldest_entry() {
        let keys = random_public_keys(3);
        let cache = GeneratorCache::with_config(
            GeneratorCacheConfig::new(2, 1024).with_eviction_policy(EvictionPolicy::Fifo),
        );

        let first = cache.get::<Bls12381Sha256>(&keys[0], 1).unwrap();
        let second = cache.get::<Bls12381Sha256>(&keys[1], 1).unwrap();
        cache.get::<Bls12381Sha256>(&keys[0], 1).unwrap();
        cache.get::<Bls12381Sha256>(&keys[2], 1).unwrap();

        assert_eq!(cache.len(), 2);
        assert!(Arc::ptr_eq(&second, &cache.get::<Bls12381Sha256>(&keys[1], 1).unwrap()));
        assert!(!Arc::ptr_eq(&first, &cache.get::<Bls12381Sha256>(&keys[0], 1).unwrap()));
    }

    #[test]
    fn zero_capacity_disables_caching() {
        let pk = public_key(IKM);
        let cache = GeneratorCache::with_config(GeneratorCacheConfig::new(0, 1024));
        let a = cache.get::<Bls12381Sha256>(&pk, 2).unwrap();
        let b = cache.get::<Bls12381Sha256>(&pk, 2).unwrap();
        assert_eq!(a, b);
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(cache.is_empty());
    }

    #[test]
    fn serializes_as_hex() {
        let pk = public_key(IKM);
        let g = Generators::create::<Bls12381Sha256>(&pk, 2).unwrap();
        let json = serde_json::to_value(&g).unwrap();
        assert_eq!(json["MsgGenerators"].as_array().unwrap().len(), 2);
        assert_eq!(json["H0"].as_str().unwrap().len(), 96);
    }
}
