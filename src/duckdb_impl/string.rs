use std::borrow::Cow;

use libduckdb_sys::duckdb_string_t;

/// Longest string DuckDB stores inline in `duckdb_string_t`.
const INLINE_CAPACITY: u32 = 12;

/// View a DuckDB string value as UTF-8, replacing invalid sequences.
///
/// # Safety
///
/// `s` must be a non-NULL row of a `VARCHAR` vector owned by the active DuckDB callback, and
/// the returned value must not outlive that vector.
pub unsafe fn decode_duckdb_string(s: &duckdb_string_t) -> Cow<'_, str> {
    // SAFETY: both union variants start with the length field.
    let len = unsafe { s.value.inlined.length };
    if len == 0 {
        return Cow::Borrowed("");
    }

    let bytes: &[u8] = if len <= INLINE_CAPACITY {
        // SAFETY: short strings keep `len` initialized bytes in the inline buffer.
        unsafe {
            std::slice::from_raw_parts(s.value.inlined.inlined.as_ptr() as *const u8, len as usize)
        }
    } else {
        // SAFETY: long strings point at `len` bytes kept alive by the owning vector.
        unsafe { std::slice::from_raw_parts(s.value.pointer.ptr as *const u8, len as usize) }
    };

    String::from_utf8_lossy(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use libduckdb_sys::{
        duckdb_string_t__bindgen_ty_1, duckdb_string_t__bindgen_ty_1__bindgen_ty_1,
        duckdb_string_t__bindgen_ty_1__bindgen_ty_2,
    };
    use std::os::raw::c_char;

    fn inline_string(bytes: &[u8]) -> duckdb_string_t {
        let mut inlined = [0 as c_char; 12];
        for (dst, src) in inlined.iter_mut().zip(bytes) {
            *dst = *src as c_char;
        }
        duckdb_string_t {
            value: duckdb_string_t__bindgen_ty_1 {
                inlined: duckdb_string_t__bindgen_ty_1__bindgen_ty_2 {
                    length: bytes.len() as u32,
                    inlined,
                },
            },
        }
    }

    fn pointer_string(bytes: &mut [u8]) -> duckdb_string_t {
        let mut prefix = [0 as c_char; 4];
        for (dst, src) in prefix.iter_mut().zip(bytes.iter()) {
            *dst = *src as c_char;
        }
        duckdb_string_t {
            value: duckdb_string_t__bindgen_ty_1 {
                pointer: duckdb_string_t__bindgen_ty_1__bindgen_ty_1 {
                    length: bytes.len() as u32,
                    prefix,
                    ptr: bytes.as_mut_ptr() as *mut c_char,
                },
            },
        }
    }

    #[test]
    fn test_decode_inline_play_text() {
        let input = inline_string(b"S8/L.2-H");
        // SAFETY: fixture is a valid inline string.
        assert_eq!(unsafe { decode_duckdb_string(&input) }, "S8/L.2-H");
    }

    #[test]
    fn test_decode_empty_string() {
        let input = inline_string(b"");
        // SAFETY: fixture is a valid inline string.
        assert_eq!(unsafe { decode_duckdb_string(&input) }, "");
    }

    #[test]
    fn test_decode_pointer_play_text() {
        let mut backing = b"D7.B-H;2-H(UR);3XH".to_vec();
        let input = pointer_string(&mut backing);
        // SAFETY: backing storage outlives the decode.
        assert_eq!(
            unsafe { decode_duckdb_string(&input) },
            "D7.B-H;2-H(UR);3XH"
        );
    }

    #[test]
    fn test_decode_invalid_utf8_is_lossy() {
        let mut backing = b"E6.3-H(UR);2-H".to_vec();
        backing[0] = 0xff;
        let expected = String::from_utf8_lossy(&backing).into_owned();
        let input = pointer_string(&mut backing);
        // SAFETY: backing storage outlives the decode.
        assert_eq!(unsafe { decode_duckdb_string(&input) }, expected);
    }
}
