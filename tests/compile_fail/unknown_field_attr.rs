//! Test unknown field attribute error.

#![allow(dead_code)]

use gdbridge::prelude::*;

#[derive(ExtensionClass)]
#[bridge(base = Node)]
struct Widget {
    #[bridge(exported)]
    speed: f64,
}

fn main() {}
