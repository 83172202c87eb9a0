// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain layer: pure types and logic for memory, patterns, scoring and
//! extraction. Nothing here performs I/O.

pub mod extraction;
pub mod memory;
pub mod pattern;
pub mod scoring;

pub use extraction::*;
pub use memory::*;
pub use pattern::*;
pub use scoring::*;
