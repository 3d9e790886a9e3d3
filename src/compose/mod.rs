pub(crate) mod compositor;
pub(crate) mod layer;
pub(crate) mod renderer;
pub(crate) mod session;
