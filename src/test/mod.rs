
pub(crate) use brute_force::*;
