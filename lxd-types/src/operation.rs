// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Background operations, as printed by `lxc query --wait`.

use serde::{Deserialize, Serialize};

/// The parts of a finished operation needed to judge its outcome.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct OperationResponse {
    pub status: String,
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub err: String,
}

impl OperationResponse {
    pub const SUCCESS: &'static str = "Success";
    pub const SUCCESS_CODE: u16 = 200;

    /// `status` must read "Success"; `status_code`, when reported, must be 200.
    pub fn is_success(&self) -> bool {
        self.status == Self::SUCCESS
            && self.status_code.map_or(true, |code| code == Self::SUCCESS_CODE)
    }
}
