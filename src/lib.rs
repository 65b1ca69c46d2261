#![doc = include_str!("../README.md")]

mod differ;
mod error;
mod int_codec;
mod patcher;
mod stream;
mod suffix_array;

pub use differ::{
    diff, diff_stream, diff_stream_with_options, diff_with_options, DifferOptions,
    DEFAULT_DISMATCH_THRESHOLD, DEFAULT_SCRATCH_CHUNK_SIZE,
};
pub use error::{BsdiffError, Result};
pub use patcher::{patch, patch_stream};
pub use stream::{read_header, write_header, MAGIC};
