// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer — wires configuration, the profile view, the exporter, and
// the desktop host together for the CLI.

pub mod app_services;
pub mod data_dir;
