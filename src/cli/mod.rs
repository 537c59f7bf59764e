//! Command-line front end for `mxi`.

pub mod commands;
