//! Declarative-macro codec standing in for the reflective SCF encoder: field
//! layout is fixed at compile time by the macro expansion, not walked at
//! runtime over a struct's reflected fields.

use crate::error::{Error, Result};

/// Scalar integer kinds the codec understands. Mirrors the reflective
/// codec's width table (1/2/4/8 bytes, signed or unsigned).
pub trait ScfScalar: Sized + Copy {
    const WIDTH: usize;
    fn write_le(self, buf: &mut Vec<u8>);
    fn read_le(buf: &[u8]) -> Result<Self>;
}

macro_rules! impl_scf_scalar {
    ($ty:ty) => {
        impl ScfScalar for $ty {
            const WIDTH: usize = std::mem::size_of::<$ty>();

            fn write_le(self, buf: &mut Vec<u8>) {
                buf.extend_from_slice(&self.to_le_bytes());
            }

            fn read_le(buf: &[u8]) -> Result<Self> {
                let bytes: [u8; std::mem::size_of::<$ty>()] =
                    buf.try_into().map_err(|_| Error::InvalidData)?;
                Ok(<$ty>::from_le_bytes(bytes))
            }
        }
    };
}

impl_scf_scalar!(u8);
impl_scf_scalar!(u16);
impl_scf_scalar!(u32);
impl_scf_scalar!(u64);
impl_scf_scalar!(i8);
impl_scf_scalar!(i16);
impl_scf_scalar!(i32);
impl_scf_scalar!(i64);

/// Write a scalar field.
pub fn write_scalar<T: ScfScalar>(buf: &mut Vec<u8>, value: T) {
    value.write_le(buf);
}

/// Read a scalar field, advancing `offset` by its width.
pub fn read_scalar<T: ScfScalar>(buf: &[u8], offset: &mut usize) -> Result<T> {
    let end = *offset + T::WIDTH;
    if end > buf.len() {
        return Err(Error::InvalidData);
    }
    let value = T::read_le(&buf[*offset..end])?;
    *offset = end;
    Ok(value)
}

/// Write a length-prefixed sequence field: one count byte (clamped to 255)
/// followed by each element's little-endian bytes.
pub fn write_sequence<T: ScfScalar>(buf: &mut Vec<u8>, items: &[T]) {
    let count = items.len().min(255) as u8;
    buf.push(count);
    for &item in items.iter().take(count as usize) {
        item.write_le(buf);
    }
}

/// Read a length-prefixed sequence field, advancing `offset`.
pub fn read_sequence<T: ScfScalar>(buf: &[u8], offset: &mut usize) -> Result<Vec<T>> {
    if *offset >= buf.len() {
        return Err(Error::InvalidData);
    }
    let count = buf[*offset] as usize;
    *offset += 1;
    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
        items.push(read_scalar::<T>(buf, offset)?);
    }
    Ok(items)
}

/// Declares a command payload struct together with `encode`/`decode`
/// methods generated from the field list, instead of walking a reflected
/// field list at runtime. Scalar fields list their integer type directly;
/// sequence fields are written `seq field_name: ElemType`.
#[macro_export]
macro_rules! znp_command {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $( $(#[$fmeta:meta])* pub $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Default)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field : $ty ),*
        }

        impl $name {
            pub fn encode(&self) -> Vec<u8> {
                let mut buf = Vec::new();
                $( $crate::codec::write_scalar(&mut buf, self.$field); )*
                buf
            }

            pub fn decode(buf: &[u8]) -> $crate::error::Result<Self> {
                #[allow(unused_mut, unused_variables)]
                let mut offset = 0usize;
                $( let $field: $ty = $crate::codec::read_scalar(buf, &mut offset)?; )*
                Ok(Self { $( $field ),* })
            }
        }
    };

    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $( $(#[$fmeta:meta])* pub $field:ident : $ty:ty ),* $(,)?
            ; seq $( $(#[$smeta:meta])* pub $sfield:ident : Vec<$sty:ty> ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Default)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field : $ty, )*
            $( $(#[$smeta])* pub $sfield : Vec<$sty> ),+
        }

        impl $name {
            pub fn encode(&self) -> Vec<u8> {
                let mut buf = Vec::new();
                $( $crate::codec::write_scalar(&mut buf, self.$field); )*
                $( $crate::codec::write_sequence(&mut buf, &self.$sfield); )+
                buf
            }

            pub fn decode(buf: &[u8]) -> $crate::error::Result<Self> {
                #[allow(unused_mut, unused_variables)]
                let mut offset = 0usize;
                $( let $field: $ty = $crate::codec::read_scalar(buf, &mut offset)?; )*
                $( let $sfield: Vec<$sty> = $crate::codec::read_sequence(buf, &mut offset)?; )+
                Ok(Self { $( $field, )* $( $sfield ),+ })
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    znp_command! {
        pub struct Scalars {
            pub a: u8,
            pub b: u16,
            pub c: i32,
        }
    }

    znp_command! {
        pub struct WithSequence {
            pub status: u8;
            seq pub clusters: Vec<u16>,
        }
    }

    #[test]
    fn scalar_fields_round_trip() {
        let value = Scalars {
            a: 0x12,
            b: 0x3456,
            c: -7,
        };
        let bytes = value.encode();
        assert_eq!(Scalars::decode(&bytes).unwrap(), value);
    }

    #[test]
    fn sequence_field_round_trips() {
        let value = WithSequence {
            status: 0,
            clusters: vec![0x0006, 0x0008, 0x0300],
        };
        let bytes = value.encode();
        assert_eq!(bytes[0], 0); // status
        assert_eq!(bytes[1], 3); // count
        assert_eq!(WithSequence::decode(&bytes).unwrap(), value);
    }

    #[test]
    fn truncates_oversized_sequence_count_on_encode() {
        let value = WithSequence {
            status: 0,
            clusters: vec![0u16; 300],
        };
        let bytes = value.encode();
        assert_eq!(bytes[1], 255);
    }

    #[test]
    fn short_buffer_is_invalid_data() {
        let err = Scalars::decode(&[0x01]).unwrap_err();
        assert!(matches!(err, Error::InvalidData));
    }
}
