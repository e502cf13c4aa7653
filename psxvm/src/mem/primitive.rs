/// Trait for memory primitives.
///
/// A primitive is either a byte, half-word or word.
/// That is, [`u8`], [`i8`], [`u16`], [`i16`], [`u32`] or [`i32`].
pub trait Primitive: Copy + std::fmt::Debug + std::fmt::UpperHex + Send + Sync + 'static {
    /// The alignment of this primitive.
    const ALIGNMENT: u32;

    /// Reads a little endian value of this primitive from a buffer of exactly its size.
    fn read_from(buf: &[u8]) -> Self;

    /// Writes this primitive as little endian to a buffer of exactly its size.
    fn write_to(self, buf: &mut [u8]);
}

macro_rules! impl_primitive {
    ($($type:ty),*) => {
        $(
            impl Primitive for $type {
                const ALIGNMENT: u32 = align_of::<Self>() as u32;

                #[inline(always)]
                fn read_from(buf: &[u8]) -> Self {
                    let mut bytes = [0u8; size_of::<$type>()];
                    bytes.copy_from_slice(buf);
                    <$type>::from_le_bytes(bytes)
                }

                #[inline(always)]
                fn write_to(self, buf: &mut [u8]) {
                    buf.copy_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_primitive! {
    u8,
    u16,
    u32,
    i8,
    i16,
    i32
}
