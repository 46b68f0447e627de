// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! branchwise library
//!
//! Command-line configuration, the persisted settings file and the resolve
//! command, exported for the binary and its integration tests.

pub mod config;
pub mod resolve;
pub mod settings;
