mod gltf;

pub use self::gltf::GltfLoader;
