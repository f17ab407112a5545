//! Backend selection
//!
//! The classifier serves on CPU via the ndarray backend. Training wraps the
//! same backend in `Autodiff`.

use burn::backend::ndarray::NdArrayDevice;
use burn::backend::{Autodiff, NdArray};

/// The default backend for inference
pub type DefaultBackend = NdArray<f32>;

/// The autodiff backend for training
pub type TrainingBackend = Autodiff<DefaultBackend>;

/// Get the default device
pub fn default_device() -> NdArrayDevice {
    NdArrayDevice::default()
}

/// Human-readable name for the current backend
pub fn backend_name() -> &'static str {
    "ndarray (CPU)"
}
