#![allow(dead_code)]

#[cfg(loom)]
pub use loom::{sync, thread};
#[cfg(not(loom))]
pub use std::{sync, thread};

pub const SOLVED_1: &str = "012345";
pub const SOLVED_2: &str = "000011112222333344445555";
pub const SOLVED_3: &str = "000000000111111111222222222333333333444444444555555555";

pub fn maybe_loom_model<F>(test: F)
where
    F: Fn() + Send + Sync + 'static,
{
    #[cfg(loom)]
    loom::model(test);
    #[cfg(not(loom))]
    test();
}

/// Every color appears exactly `size * size` times in a valid serialization.
pub fn assert_balanced(state: &str, size: usize) {
    assert_eq!(state.len(), 6 * size * size);
    for color in b'0'..=b'5' {
        let count = state.bytes().filter(|b| *b == color).count();
        assert_eq!(
            count,
            size * size,
            "color {} unbalanced in {state}",
            color as char
        );
    }
}
