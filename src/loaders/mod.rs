pub mod gltf;

pub use self::gltf::{load_model, load_model_from_slice, LoadError, ModelAsset};
