use std::fmt::Debug;

use num_traits::Float;

/// A trait for types that can be used for indexed coordinates.
///
/// This trait is sealed and cannot be implemented for external types. The search relies on IEEE
/// float semantics: NaN coordinates must fail every ordered comparison so that points and regions
/// carrying them drop out of the results, and `+∞` is used as the "nothing found yet" threshold.
pub trait IndexableNum: private::Sealed + Float + Default + Debug + Send + Sync + 'static {
    /// Half of the value, used to place split planes.
    #[inline]
    fn half(self) -> Self {
        self / (Self::one() + Self::one())
    }
}

impl IndexableNum for f32 {}

impl IndexableNum for f64 {}

// https://rust-lang.github.io/api-guidelines/future-proofing.html#sealed-traits-protect-against-downstream-implementations-c-sealed
mod private {
    pub trait Sealed {}

    impl Sealed for f32 {}
    impl Sealed for f64 {}
}
