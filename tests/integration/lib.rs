//! Test-only crate. The actual tests live in `tests/`.
