//! Recognizer front end for the waveprint engine
//!
//! Decodes audio containers, registers library recordings and exposes the
//! pieces the `waveprint-recognizer` binary wires together.

pub mod config;
pub mod decode;
pub mod error;
pub mod library;

pub use config::Config;
pub use error::{RecognizerError, RecognizerResult};
