use sm_core::SkinMenuError;
use std::fmt::Display;

fn map_error(code: &'static str, error: impl Display) -> SkinMenuError {
    SkinMenuError::new(code, error.to_string())
}

pub(crate) fn emit_error(error: SkinMenuError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!(
        "ERROR_MSG_JSON:{}",
        serde_json::to_string(&error.message).expect("string json")
    );
    1
}

pub(crate) fn map_cli_source_path(error: std::io::Error) -> SkinMenuError {
    map_error("CLI_SOURCE_PATH", error)
}

pub(crate) fn map_cli_source_scan(error: std::path::StripPrefixError) -> SkinMenuError {
    map_error("CLI_SOURCE_SCAN", error)
}

pub(crate) fn map_cli_source_read(error: std::io::Error) -> SkinMenuError {
    map_error("CLI_SOURCE_READ", error)
}

pub(crate) fn map_cli_output_write(error: std::io::Error) -> SkinMenuError {
    map_error("CLI_OUTPUT_WRITE", error)
}

pub(crate) fn map_cli_report_write(error: std::io::Error) -> SkinMenuError {
    map_error("CLI_REPORT_WRITE", error)
}

pub(crate) fn map_cli_report_encode(error: serde_json::Error) -> SkinMenuError {
    map_error("CLI_REPORT_ENCODE", error)
}

#[cfg(test)]
mod error_map_tests {
    use super::*;

    #[test]
    fn emit_error_returns_non_zero_exit_code() {
        let code = emit_error(SkinMenuError::new("ERR", "failed"));
        assert_eq!(code, 1);
    }

    #[test]
    fn mapping_helpers_keep_error_codes() {
        assert_eq!(
            map_cli_source_path(std::io::Error::other("path")).code,
            "CLI_SOURCE_PATH"
        );

        let strip_error = std::path::Path::new("/a")
            .strip_prefix("/b")
            .expect_err("strip prefix");
        assert_eq!(map_cli_source_scan(strip_error).code, "CLI_SOURCE_SCAN");

        assert_eq!(
            map_cli_source_read(std::io::Error::other("read")).code,
            "CLI_SOURCE_READ"
        );
        assert_eq!(
            map_cli_output_write(std::io::Error::other("write")).code,
            "CLI_OUTPUT_WRITE"
        );
        assert_eq!(
            map_cli_report_write(std::io::Error::other("write")).code,
            "CLI_REPORT_WRITE"
        );

        let invalid = serde_json::from_str::<serde_json::Value>("{").expect_err("invalid json");
        assert_eq!(map_cli_report_encode(invalid).code, "CLI_REPORT_ENCODE");
    }
}
