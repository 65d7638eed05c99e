// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Connection setup.
//!
//! The only raw SQL of the crate (PRAGMAs) lives here; `queries/` and
//! `mutations/` use the Diesel DSL.

pub mod sqlite;
