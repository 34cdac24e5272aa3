//! A delta debugging library: minimizing a failure-inducing input down to a
//! locally minimal configuration that an oracle still classifies as FAIL.
//!
//! Four reducers are provided: [`reducers::ddmin`], the classical recursive
//! bisection algorithm; [`reducers::tictocmin`], a bidirectional
//! prefix/suffix sweep; [`reducers::hdd`], hierarchical delta debugging over
//! a tree; and [`reducers::probdd`], a probabilistic reducer that maintains a
//! belief distribution over which atoms are required.

#![deny(missing_docs)]
#![deny(missing_debug_implementations)]

extern crate blake2;
extern crate clap;
extern crate ctrlc;
extern crate generic_array;
extern crate lru_cache;
extern crate regex;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate serde_json;
extern crate tempdir;
extern crate typenum;

pub mod benchmark;
pub mod cache;
pub mod cancel;
pub mod config;
pub mod counters;
pub mod error;
pub mod fingerprint;
pub mod logger;
pub mod model;
pub mod oracle;
pub mod reducers;
