//! Bundle resolution: concatenated spec files, stdin, or a bundler command.

use crate::error::{CliError, CliResult};
use crate::spec::Spec;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

/// Produce the script to run for `spec`.
///
/// Stdin is read as-is. Without a `command` the spec files are concatenated;
/// with one, the files are appended to its arguments and its stdout is the
/// bundle.
pub async fn resolve_bundle(command: Option<&str>, spec: &Spec) -> CliResult<String> {
    match (spec, command) {
        (Spec::Stdin, _) => {
            let mut bundle = String::new();
            tokio::io::stdin().read_to_string(&mut bundle).await?;
            Ok(bundle)
        }
        (Spec::Files(files), None) => concat_files(files).await,
        (Spec::Files(files), Some(command)) => run_command(command, files).await,
    }
}

async fn concat_files(files: &[PathBuf]) -> CliResult<String> {
    let mut bundle = String::new();
    for file in files {
        let source = tokio::fs::read_to_string(file)
            .await
            .map_err(|e| CliError::bundle(format!("{}: {e}", file.display())))?;
        bundle.push_str(&source);
    }
    Ok(bundle)
}

async fn run_command(command: &str, files: &[PathBuf]) -> CliResult<String> {
    let argv = split_args(command)?;
    let Some((program, args)) = argv.split_first() else {
        return Err(CliError::bundle("empty bundle command"));
    };
    tracing::info!(command = %command, files = files.len(), "running bundle command");

    let output = Command::new(program)
        .args(args)
        .args(files)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .output()
        .await
        .map_err(|e| CliError::bundle(format!("Command failed: {command}: {e}")))?;

    if !output.status.success() {
        return Err(CliError::bundle(match output.status.code() {
            Some(code) => format!("Command failed with exit code {code}: {command}"),
            None => format!("Command was killed: {command}"),
        }));
    }
    String::from_utf8(output.stdout)
        .map_err(|e| CliError::bundle(format!("bundle is not UTF-8: {e}")))
}

/// Split a command line into arguments with POSIX shell quoting rules
pub fn split_args(command: &str) -> CliResult<Vec<String>> {
    shlex::split(command).ok_or_else(|| unterminated(command))
}

fn unterminated(command: &str) -> CliError {
    CliError::invalid_argument(format!("unterminated quote or escape in bundle command {command:?}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod split_args_tests {
        use super::*;

        #[test]
        fn test_plain_words() {
            assert_eq!(
                split_args("browserify -d  --standalone x").unwrap(),
                vec!["browserify", "-d", "--standalone", "x"]
            );
        }

        #[test]
        fn test_single_quotes_are_literal() {
            assert_eq!(
                split_args(r#"echo 'it("works", function(){});'"#).unwrap(),
                vec!["echo", r#"it("works", function(){});"#]
            );
        }

        #[test]
        fn test_double_quotes_with_escapes() {
            assert_eq!(
                split_args(r#"node -e "console.log(\"a b\")""#).unwrap(),
                vec!["node", "-e", r#"console.log("a b")"#]
            );
        }

        #[test]
        fn test_adjacent_quotes_join() {
            assert_eq!(split_args(r#"a'b c'"d""#).unwrap(), vec!["ab cd"]);
        }

        #[test]
        fn test_empty_quotes_are_an_argument() {
            assert_eq!(split_args("cmd ''").unwrap(), vec!["cmd", ""]);
        }

        #[test]
        fn test_backslash_escapes_space() {
            assert_eq!(split_args(r"cat my\ file.js").unwrap(), vec!["cat", "my file.js"]);
        }

        #[test]
        fn test_unterminated_quote() {
            assert!(split_args("echo 'oops").is_err());
            assert!(split_args("echo \"oops").is_err());
            assert!(split_args("echo oops\\").is_err());
        }

        #[test]
        fn test_blank_command() {
            assert!(split_args("   ").unwrap().is_empty());
        }
    }

    mod resolve_tests {
        use super::*;
        use std::fs;

        #[tokio::test]
        async fn test_concatenates_files_in_order() {
            let dir = tempfile::tempdir().unwrap();
            let a = dir.path().join("a.js");
            let b = dir.path().join("b.js");
            fs::write(&a, "it('a');\n").unwrap();
            fs::write(&b, "it('b');\n").unwrap();
            let bundle = resolve_bundle(None, &Spec::Files(vec![a, b])).await.unwrap();
            assert_eq!(bundle, "it('a');\nit('b');\n");
        }

        #[tokio::test]
        async fn test_missing_file_is_a_bundle_error() {
            let dir = tempfile::tempdir().unwrap();
            let missing = dir.path().join("missing.js");
            let err = resolve_bundle(None, &Spec::Files(vec![missing]))
                .await
                .unwrap_err();
            assert!(matches!(err, CliError::Bundle { .. }));
            assert!(err.to_string().contains("missing.js"));
        }

        #[cfg(unix)]
        #[tokio::test]
        async fn test_command_stdout_is_the_bundle() {
            let bundle = resolve_bundle(
                Some(r#"echo 'it("works", function(){});'"#),
                &Spec::Files(Vec::new()),
            )
            .await
            .unwrap();
            assert_eq!(bundle, "it(\"works\", function(){});\n");
        }

        #[cfg(unix)]
        #[tokio::test]
        async fn test_command_receives_spec_files() {
            let dir = tempfile::tempdir().unwrap();
            let file = dir.path().join("spec.js");
            fs::write(&file, "it('from file');").unwrap();
            let bundle = resolve_bundle(Some("cat"), &Spec::Files(vec![file]))
                .await
                .unwrap();
            assert_eq!(bundle, "it('from file');");
        }

        #[cfg(unix)]
        #[tokio::test]
        async fn test_failing_command() {
            let err = resolve_bundle(Some("false"), &Spec::Files(Vec::new()))
                .await
                .unwrap_err();
            assert_eq!(
                err.to_string(),
                "Bundle failed: Command failed with exit code 1: false"
            );
        }

        #[tokio::test]
        async fn test_unknown_program() {
            let err = resolve_bundle(
                Some("mochify-no-such-bundler --flag"),
                &Spec::Files(Vec::new()),
            )
            .await
            .unwrap_err();
            assert!(err.to_string().contains("mochify-no-such-bundler"));
        }
    }
}
