//! Page output.
//!
//! [`pages`] turns a [`crate::controller::LoadReport`] and a
//! [`crate::navigation::Route`] into a complete HTML document and writes it
//! to a file or stdout.

pub mod pages;
