#![forbid(unsafe_code)]

//! Explicitly passed random source.
//!
//! There is no process-wide generator here. Every component that needs
//! randomness takes a `&mut RandomSource`, so shuffles and random picks are
//! reproducible in tests by seeding.
//!
//! ```
//! use chime_random::RandomSource;
//!
//! let mut a = RandomSource::from_seed(7);
//! let mut b = RandomSource::from_seed(7);
//! let mut deck_a: Vec<u8> = (0..10).collect();
//! let mut deck_b = deck_a.clone();
//! a.shuffle(&mut deck_a);
//! b.shuffle(&mut deck_b);
//! assert_eq!(deck_a, deck_b);
//! ```

pub mod source;

pub use source::RandomSource;
