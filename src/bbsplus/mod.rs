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

//! BBS+ multi-message signatures, with signature = `(A, e, s)` over BLS12-381.
//!
//! - **Signature Compactness**: a single 112 bytes signature covers an ordered list of messages.
//! - **Selective Disclosure**: the holder proves possession of a signature while revealing
//!   only some of the signed messages.
//! - **Unlinkable Proofs**: every proof is re-randomized with fresh scalars, so two proofs
//!   derived from the same signature cannot be correlated.
//!
//! Every randomized operation takes the random number generator as an explicit argument.
//! The algorithms are generic over a [`ciphersuites::BbsCiphersuite`].
//!
//! # Usage
//! The module is enabled by the default `bbsplus` feature
//! ```toml
//! bbs-core = { version = "0.1", features = ["bbsplus"] }
//! ```

/// Byte oriented request/response operations
pub mod api;
/// Module for ciphersuites
pub mod ciphersuites;
/// Module for generators
pub mod generators;
/// Module for keys
pub mod keys;
/// Module for proofs
pub mod proof;
/// Module for signatures
pub mod signature;
