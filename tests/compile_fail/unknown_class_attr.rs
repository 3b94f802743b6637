//! Test unknown class attribute error.

#![allow(dead_code)]

use gdbridge::prelude::*;

#[derive(ExtensionClass)]
#[bridge(base = Node, frobnicate)]
struct Widget {
    #[bridge(base)]
    base: Base<Node>,
}

fn main() {}
