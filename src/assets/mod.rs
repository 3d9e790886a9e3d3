pub(crate) mod decode;
pub(crate) mod magenta;
pub(crate) mod psd;
pub(crate) mod thumb;
