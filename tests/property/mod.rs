//! Property test modules

mod uniqueness;
