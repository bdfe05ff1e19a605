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

//! BBS+ multi-message signatures over BLS12-381 with zero-knowledge
//! selective-disclosure proofs.
//!
//! ```no_run
//! use bbs_core::bbsplus::api::{BbsApi, BbsSignRequest, BbsVerifyRequest};
//! use bbs_core::bbsplus::ciphersuites::Bls12381Sha256;
//!
//! let api = BbsApi::<Bls12381Sha256>::new();
//! let mut rng = rand::thread_rng();
//! let key_pair = api.generate_key_pair(&mut rng, None, None).unwrap();
//!
//! let messages = vec![b"first_name".to_vec(), b"surname".to_vec()];
//! let signature = api
//!     .sign(&mut rng, &BbsSignRequest {
//!         secret_key: key_pair.secret_key.clone().unwrap(),
//!         messages: messages.clone(),
//!     })
//!     .unwrap();
//!
//! let response = api.verify(&BbsVerifyRequest {
//!     public_key: key_pair.public_key,
//!     messages,
//!     signature,
//! });
//! assert!(response.verified);
//! ```

#![allow(non_snake_case)]

pub mod errors;
pub mod keys;
pub mod schemes;
pub mod utils;

#[cfg(feature = "bbsplus")]
pub mod bbsplus;
