// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

mod error;
mod store;

pub use error::ProgressError;
pub use store::ProgressStore;
