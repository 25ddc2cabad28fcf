//! Audio handling for timbre.
//!
//! Decodes uploaded and downloaded audio, re-encodes clips the player
//! cannot stream directly, and turns audio into embedding vectors through
//! an [`EmbeddingModel`].

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod inference;
pub mod model;
pub mod origin;
pub mod playback;
pub mod tags;

pub use decoder::{decode_bytes, DecodedAudio};
pub use error::{AudioError, AudioResult};
pub use inference::InferenceClient;
pub use model::{EmbeddingModel, FeatureExtractor, GenreScore};
pub use origin::{AudioOrigin, Inspection};
pub use playback::{NativeFormats, PlaybackResolver, PlaybackSource, Player};
