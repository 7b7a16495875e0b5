// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Web form for uploading files into Unity Catalog volumes.

pub mod config;
pub mod web;

pub use config::{AppConfig, load_app_config, validate_app_config};
