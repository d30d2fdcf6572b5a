use sb_core::BuildError;
use std::fmt::Display;

fn map_error(code: &'static str, error: impl Display) -> BuildError {
    BuildError::new(code, error.to_string())
}

pub(crate) fn message_json(message: &str) -> String {
    serde_json::to_string(message).unwrap_or_else(|_| "\"Unknown error\"".to_string())
}

pub(crate) fn emit_error(error: BuildError) -> i32 {
    println!("RESULT:ERROR");
    print_error_lines(&error);
    1
}

pub(crate) fn print_error_lines(error: &BuildError) {
    println!("ERROR_CODE:{}", error.code);
    println!("ERROR_MSG_JSON:{}", message_json(&error.message));
    if let Some(passage) = &error.passage {
        println!("ERROR_PASSAGE_JSON:{}", message_json(passage));
    }
}

pub(crate) fn map_cli_log_file(error: std::io::Error) -> BuildError {
    map_error("CLI_LOG_FILE", error)
}

#[cfg(test)]
mod error_map_tests {
    use super::*;

    #[test]
    fn emit_error_returns_non_zero_exit_code() {
        let code = emit_error(BuildError::new("ERR", "failed"));
        assert_eq!(code, 1);
    }

    #[test]
    fn messages_are_emitted_as_json_strings() {
        assert_eq!(message_json("say \"hi\""), r#""say \"hi\"""#);
        assert_eq!(
            map_cli_log_file(std::io::Error::other("denied")).code,
            "CLI_LOG_FILE"
        );
    }
}
