//! Transport headers shared by the form-side signer and the relay.

pub const HEADER_FORM_ID: &str = "x-hookhub-google-form-id";
pub const HEADER_FORM_TITLE: &str = "x-hookhub-google-form-title";
pub const HEADER_FORM_TS: &str = "x-hookhub-google-form-ts";
pub const HEADER_FORM_HASH: &str = "x-hookhub-google-form-hash";
