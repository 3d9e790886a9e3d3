pub(crate) mod cancel;
pub(crate) mod scan;
