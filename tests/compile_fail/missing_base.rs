//! Test missing base class error.

#![allow(dead_code)]

use gdbridge::prelude::*;

#[derive(ExtensionClass)]
struct Widget {
    speed: f64,
}

fn main() {}
