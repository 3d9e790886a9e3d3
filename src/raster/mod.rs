pub(crate) mod blend;
pub(crate) mod blur;
pub(crate) mod canvas;
pub(crate) mod clip;
pub(crate) mod crop;
pub(crate) mod glow;
