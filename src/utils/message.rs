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

use bls12_381_plus::Scalar;
use serde::{Deserialize, Serialize};

use crate::{
    bbsplus::ciphersuites::BbsCiphersuite,
    errors::Error,
    utils::util::bbsplus_utils::{hash_to_scalar, ScalarExt, SCALAR_LEN},
};

/// A signed message, already mapped into the scalar field.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct BBSplusMessage {
    pub value: Scalar,
}

impl BBSplusMessage {
    pub fn new(msg: Scalar) -> Self {
        Self { value: msg }
    }

    /// Maps an octet string to a scalar. When `dst` is not given the
    /// ciphersuite default `API_ID || "MAP_MSG_TO_SCALAR_AS_HASH_"` is used.
    pub fn map_message_to_scalar_as_hash<CS: BbsCiphersuite>(
        data: &[u8],
        dst: Option<&[u8]>,
    ) -> Result<Self, Error> {
        let default_dst = CS::map_msg_dst();
        let dst = dst.unwrap_or(&default_dst);

        if dst.len() > 255 {
            return Err(Error::MapMessageToScalarError);
        }

        let scalar = hash_to_scalar::<CS>(data, dst).map_err(|_| Error::MapMessageToScalarError)?;
        Ok(Self { value: scalar })
    }

    /// Maps every message, preserving their order.
    pub fn messages_to_scalar<CS, T>(messages: &[T]) -> Result<Vec<Self>, Error>
    where
        CS: BbsCiphersuite,
        T: AsRef<[u8]>,
    {
        let dst = CS::map_msg_dst();
        messages
            .iter()
            .map(|m| Self::map_message_to_scalar_as_hash::<CS>(m.as_ref(), Some(dst.as_slice())))
            .collect()
    }

    pub fn to_bytes_be(&self) -> [u8; SCALAR_LEN] {
        self.value.to_bytes_be()
    }
}
