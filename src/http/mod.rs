//! HTTP protocol layer module
//!
//! Response builders and form decoding, decoupled from the transcode logic.

pub mod form;
pub mod response;

// Re-export commonly used types
pub use response::{
    build_400_response, build_404_response, build_405_response, build_413_response,
    build_health_response, build_json_error, build_json_response, build_options_response,
    build_text_response, with_exit_code, with_server_name, TRANSCODE_ALLOW,
};
