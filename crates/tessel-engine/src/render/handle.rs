//! Opaque resource handles handed out by a [`GpuBackend`](super::GpuBackend).
//!
//! Handles compare by identity only. The engine never inspects the number;
//! it only checks two handles for equality (slot dedup, atlas switches).

use std::fmt;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident, $tag:literal) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($tag, "#{}"), self.0)
            }
        }
    };
}

handle!(
    /// A sampled 2D texture.
    TextureId,
    "tex"
);
handle!(
    /// A compiled and linked shader program.
    ShaderId,
    "shader"
);
handle!(
    /// An off-screen color target.
    RenderTargetId,
    "target"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_is_compact() {
        assert_eq!(format!("{:?}", TextureId(3)), "tex#3");
        assert_eq!(format!("{:?}", RenderTargetId(0)), "target#0");
    }
}
