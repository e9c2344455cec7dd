//! Purpose: C ABI bridge for bindings (libadder).
//! Exports: `adder_add_json`, `adder_sum_json`, and buffer/error free functions.
//! Role: Stable ABI surface for non-Rust callers of the combinator.
//! Invariants: JSON bytes in/out; explicit free functions; return 0 on success, -1 on error.
//! Invariants: Error kinds map 1:1 with `to_exit_code`.
//! Invariants: Operand bytes must be JSON; a non-JSON operand is a `Usage` error.

use crate::core::combine;
use crate::core::error::{Error, ErrorKind, to_exit_code};
use serde_json::Value;
use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

#[repr(C)]
pub struct adder_buf {
    data: *mut u8,
    len: usize,
}

#[repr(C)]
pub struct adder_error {
    kind: i32,
    message: *mut c_char,
    hint: *mut c_char,
    index: u64,
    has_index: u8,
}

/// Adds two JSON operands and writes the JSON sum into `out_sum`.
#[unsafe(no_mangle)]
pub extern "C" fn adder_add_json(
    a_json: *const u8,
    a_len: usize,
    b_json: *const u8,
    b_len: usize,
    out_sum: *mut adder_buf,
    out_err: *mut *mut adder_error,
) -> i32 {
    let result = parse_json_bytes(a_json, a_len, "a_json")
        .and_then(|a| Ok((a, parse_json_bytes(b_json, b_len, "b_json")?)))
        .and_then(|(a, b)| combine::add(&a, &b))
        .and_then(|sum| write_json_buf(out_sum, &sum));
    match result {
        Ok(()) => 0,
        Err(err) => fail(out_err, err),
    }
}

/// Sums a JSON array of operands and writes the JSON sum into `out_sum`.
#[unsafe(no_mangle)]
pub extern "C" fn adder_sum_json(
    values_json: *const u8,
    len: usize,
    out_sum: *mut adder_buf,
    out_err: *mut *mut adder_error,
) -> i32 {
    let result = parse_json_bytes(values_json, len, "values_json")
        .and_then(|values| match values {
            Value::Array(items) => combine::sum(&items),
            _ => Err(Error::new(ErrorKind::Usage).with_message("values_json must be a JSON array")),
        })
        .and_then(|sum| write_json_buf(out_sum, &sum));
    match result {
        Ok(()) => 0,
        Err(err) => fail(out_err, err),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn adder_buf_free(buf: *mut adder_buf) {
    if buf.is_null() {
        return;
    }
    unsafe {
        let buf = &mut *buf;
        if !buf.data.is_null() {
            drop(Box::from_raw(ptr::slice_from_raw_parts_mut(buf.data, buf.len)));
        }
        buf.data = ptr::null_mut();
        buf.len = 0;
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn adder_error_free(err: *mut adder_error) {
    if err.is_null() {
        return;
    }
    unsafe {
        let err = Box::from_raw(err);
        if !err.message.is_null() {
            drop(CString::from_raw(err.message));
        }
        if !err.hint.is_null() {
            drop(CString::from_raw(err.hint));
        }
    }
}

fn parse_json_bytes(bytes: *const u8, len: usize, name: &str) -> Result<Value, Error> {
    if bytes.is_null() {
        return Err(Error::new(ErrorKind::Usage).with_message(format!("{name} is null")));
    }
    let slice = unsafe { std::slice::from_raw_parts(bytes, len) };
    let text = std::str::from_utf8(slice).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("{name} is not valid UTF-8"))
            .with_source(err)
    })?;
    crate::json::parse::from_str(text).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("{name} is not valid JSON"))
            .with_source(err)
    })
}

fn write_json_buf(out: *mut adder_buf, value: &Value) -> Result<(), Error> {
    if out.is_null() {
        return Err(Error::new(ErrorKind::Usage).with_message("out_sum is null"));
    }
    let bytes = serde_json::to_vec(value).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to serialize sum")
            .with_source(err)
    })?;
    let boxed = bytes.into_boxed_slice();
    let len = boxed.len();
    let data = Box::into_raw(boxed);
    unsafe {
        let buf = &mut *out;
        buf.len = len;
        buf.data = data.cast::<u8>();
    }
    Ok(())
}

fn fail(out_err: *mut *mut adder_error, err: Error) -> i32 {
    if out_err.is_null() {
        return -1;
    }
    let error = Box::new(adder_error {
        kind: to_exit_code(err.kind()),
        message: to_c_string(err.message().unwrap_or("")),
        hint: err.hint().map(to_c_string).unwrap_or(ptr::null_mut()),
        index: err.index().unwrap_or(0) as u64,
        has_index: u8::from(err.index().is_some()),
    });
    unsafe {
        *out_err = Box::into_raw(error);
    }
    -1
}

fn to_c_string(input: &str) -> *mut c_char {
    CString::new(input)
        .map(|s| s.into_raw())
        .unwrap_or(ptr::null_mut())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    fn empty_buf() -> adder_buf {
        adder_buf {
            data: ptr::null_mut(),
            len: 0,
        }
    }

    fn buf_text(buf: &adder_buf) -> String {
        let bytes = unsafe { std::slice::from_raw_parts(buf.data, buf.len) };
        String::from_utf8(bytes.to_vec()).expect("utf8")
    }

    #[test]
    fn add_json_writes_sum() {
        let mut out = empty_buf();
        let mut err: *mut adder_error = ptr::null_mut();
        let code = adder_add_json(b"1".as_ptr(), 1, b"2".as_ptr(), 1, &mut out, &mut err);
        assert_eq!(code, 0);
        assert!(err.is_null());
        assert_eq!(buf_text(&out), "3");
        adder_buf_free(&mut out);
        assert!(out.data.is_null());
    }

    #[test]
    fn add_json_rejects_string_operand() {
        let mut out = empty_buf();
        let mut err: *mut adder_error = ptr::null_mut();
        let a = br#""x""#;
        let code = adder_add_json(a.as_ptr(), a.len(), b"2".as_ptr(), 1, &mut out, &mut err);
        assert_eq!(code, -1);
        assert!(out.data.is_null());
        assert!(!err.is_null());
        unsafe {
            assert_eq!((*err).kind, to_exit_code(ErrorKind::InvalidArgument));
            assert_eq!((*err).has_index, 1);
            assert_eq!((*err).index, 0);
            let message = CStr::from_ptr((*err).message).to_str().unwrap();
            assert!(message.contains("string"));
        }
        adder_error_free(err);
    }

    #[test]
    fn add_json_rejects_non_json_bytes() {
        let mut out = empty_buf();
        let mut err: *mut adder_error = ptr::null_mut();
        let code = adder_add_json(b"x".as_ptr(), 1, b"2".as_ptr(), 1, &mut out, &mut err);
        assert_eq!(code, -1);
        unsafe {
            assert_eq!((*err).kind, to_exit_code(ErrorKind::Usage));
        }
        adder_error_free(err);
    }

    #[test]
    fn sum_json_requires_array() {
        let mut out = empty_buf();
        let mut err: *mut adder_error = ptr::null_mut();
        let values = b"[1, 2.5, 3]";
        assert_eq!(
            adder_sum_json(values.as_ptr(), values.len(), &mut out, &mut err),
            0
        );
        assert_eq!(buf_text(&out), "6.5");
        adder_buf_free(&mut out);

        let values = b"{\"a\":1}";
        assert_eq!(
            adder_sum_json(values.as_ptr(), values.len(), &mut out, &mut err),
            -1
        );
        adder_error_free(err);
    }

    #[test]
    fn sum_buffer_length_matches_encoded_bytes() {
        let mut out = empty_buf();
        let mut err: *mut adder_error = ptr::null_mut();
        let values = b"[9223372036854775807, 9223372036854775807]";
        let code = adder_sum_json(values.as_ptr(), values.len(), &mut out, &mut err);
        assert_eq!(code, 0);
        assert!(err.is_null());
        let expected = "18446744073709551614";
        assert_eq!(out.len, expected.len());
        assert_eq!(buf_text(&out), expected);
        adder_buf_free(&mut out);
    }

    #[test]
    fn null_error_slot_still_reports_failure() {
        let mut out = empty_buf();
        let code = adder_add_json(ptr::null(), 0, b"2".as_ptr(), 1, &mut out, ptr::null_mut());
        assert_eq!(code, -1);
    }
}
