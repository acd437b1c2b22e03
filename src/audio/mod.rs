//! Audio analysis: live beat intensity and the offline song signature.

/// Beat grid pulses and the live bass-band estimator.
pub mod beat;
/// Decoding audio files to mono PCM.
pub mod decode;
/// Offline RMS / zero-crossing / spectral descriptors and the signature worker.
pub mod signature;
