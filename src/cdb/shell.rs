//! Shell-word splitting and joining for the `command` form of an entry.

use shlex::QuoteError;

/// Split a command string into tokens.
///
/// Commands without any quote character are split on whitespace, which keeps
/// Windows paths (`C:\src\a.c`) intact. Anything quoted goes through POSIX
/// shell-word rules. Returns `None` on unbalanced quotes.
pub fn split(command: &str) -> Option<Vec<String>> {
    if command.contains(['\'', '"']) {
        shlex::split(command)
    } else {
        Some(command.split_whitespace().map(str::to_string).collect())
    }
}

/// Join tokens into a single command string that [`split`] turns back into
/// the same tokens.
///
/// When no token needs the shell-word path of [`split`] (no whitespace, no
/// quotes), tokens are joined verbatim so backslash paths come back unchanged.
pub fn join<S: AsRef<str>>(tokens: &[S]) -> Result<String, QuoteError> {
    if tokens.iter().all(|t| is_bare(t.as_ref())) {
        let words: Vec<&str> = tokens.iter().map(|t| t.as_ref()).collect();
        return Ok(words.join(" "));
    }

    let mut words = Vec::with_capacity(tokens.len());
    for token in tokens {
        let token = token.as_ref();
        if needs_quoting(token) {
            words.push(shlex::try_quote(token)?.into_owned());
        } else {
            words.push(token.to_string());
        }
    }
    Ok(words.join(" "))
}

// Survives a plain whitespace split untouched.
fn is_bare(token: &str) -> bool {
    !token.is_empty()
        && !token
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '\'' | '"' | '\0'))
}

fn needs_quoting(token: &str) -> bool {
    token.is_empty()
        || token.chars().any(|c| {
            c.is_whitespace()
                || matches!(
                    c,
                    '\'' | '"'
                        | '\0'
                        | '\\'
                        | '$'
                        | '`'
                        | '!'
                        | '*'
                        | '?'
                        | ';'
                        | '&'
                        | '|'
                        | '<'
                        | '>'
                        | '('
                        | ')'
                        | '{'
                        | '}'
                        | '['
                        | ']'
                        | '#'
                        | '~'
                )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_plain_command() {
        let tokens = split("gcc somefile -Iinclude -o someoutput").unwrap();
        assert_eq!(tokens, ["gcc", "somefile", "-Iinclude", "-o", "someoutput"]);
    }

    #[test]
    fn test_split_respects_quotes() {
        let tokens = split(r#"command 'with spaces!' "-DNAME=\"v\"""#).unwrap();
        assert_eq!(tokens, ["command", "with spaces!", r#"-DNAME="v""#]);
    }

    #[test]
    fn test_split_keeps_backslashes_when_unquoted() {
        let tokens = split(r"cl.exe /c C:\src\main.c").unwrap();
        assert_eq!(tokens, ["cl.exe", "/c", r"C:\src\main.c"]);
    }

    #[test]
    fn test_split_unbalanced_quote() {
        assert!(split("gcc 'unterminated -c a.c").is_none());
    }

    #[test]
    fn test_join_leaves_plain_tokens_alone() {
        let joined = join(&["clang", "-I/proj/inc", "-std=c++17", "-c", "a.c"]).unwrap();
        assert_eq!(joined, "clang -I/proj/inc -std=c++17 -c a.c");
    }

    #[test]
    fn test_join_keeps_backslash_paths_verbatim() {
        let command = r"cl.exe /c C:\src\main.c /FoC:\out\ /DNAME=$x";
        let tokens = split(command).unwrap();
        assert_eq!(join(&tokens).unwrap(), command);
    }

    #[test]
    fn test_join_quotes_when_needed() {
        let joined = join(&["command", "with spaces!"]).unwrap();
        assert_eq!(joined, "command 'with spaces!'");
        assert_eq!(split(&joined).unwrap(), ["command", "with spaces!"]);
    }

    #[test]
    fn test_join_split_preserves_awkward_tokens() {
        let tokens = vec![
            "gcc".to_string(),
            r#"-DMSG="hello world""#.to_string(),
            r"C:\path\x.c".to_string(),
            String::new(),
            "it's".to_string(),
        ];
        let joined = join(&tokens).unwrap();
        assert_eq!(split(&joined).unwrap(), tokens);
    }

    #[test]
    fn test_join_rejects_nul() {
        assert!(join(&["gcc", "a\0b"]).is_err());
    }
}
