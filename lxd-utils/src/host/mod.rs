// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Running commands on the host, or pretending to under test.

pub mod error;
pub mod executor;
pub mod input;
pub mod output;

pub use executor::{
    BoxedExecutor, Executor, FakeExecutor, HostExecutor, StaticHandler,
};
pub use input::Input;
pub use output::{Output, OutputExt};
