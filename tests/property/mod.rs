// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module

mod interface_bindings;
mod placement;
mod subnets;
