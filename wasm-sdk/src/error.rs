//! Error conversion utilities for WASM.

use lnswap_core::Error;
use wasm_bindgen::prelude::*;

/// Name of the JS error raised for `err`, so callers can tell bad input from a failed swap.
pub fn error_name(err: &Error) -> &'static str {
    match err {
        Error::InputValidation(_) => "InputValidationError",
        Error::Service(_) => "ServiceError",
        Error::Transport(_) => "TransportError",
        Error::CryptoValidation(_) => "CryptoValidationError",
        Error::Protocol(_) => "ProtocolError",
        Error::Parse(_) | Error::Serde(_) => "ParseError",
        Error::Other(_) => "Error",
    }
}

/// Convert an SDK error to a JavaScript `Error`.
pub fn to_js_error(err: Error) -> JsValue {
    let js_error = js_sys::Error::new(&format!("{:#}", err));
    js_error.set_name(error_name(&err));
    js_error.into()
}

/// Macro to convert SDK errors to JavaScript values.
#[macro_export]
macro_rules! map_err_to_js {
    ($expr:expr) => {
        $expr.map_err($crate::to_js_error)
    };
}
