pub(crate) mod ease;
pub(crate) mod keyframer;
pub(crate) mod stagger;
pub(crate) mod stepping;
