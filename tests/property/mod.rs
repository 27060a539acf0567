// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! Registry selection invariants under random operation sequences, and
//! determinism of the config generator.

mod generator_determinism;
mod registry_invariants;
