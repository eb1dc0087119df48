//! Command template parser
//!
//! Splits an action's command string into an argument vector using POSIX
//! word rules, then substitutes `$NAME` placeholders inside each word.
//! Operators such as `&&`, `|`, `;` and `>` get no special meaning: they stay
//! literal text in whatever word they appear in, and no shell is ever run.

use crate::engine::params::ResolvedEnvironment;

/// Errors specific to template parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Shell word parsing failed: {0}")]
    ShellWordsParse(String),

    #[error("Command template is empty")]
    EmptyCommand,
}

/// Parses command templates against one invocation's resolved parameters
pub struct TemplateParser<'a> {
    /// Placeholder names with their values, longest name first
    placeholders: Vec<(&'a str, &'a str)>,
}

impl<'a> TemplateParser<'a> {
    pub fn new(resolved: &'a ResolvedEnvironment) -> Self {
        let mut placeholders: Vec<(&str, &str)> =
            resolved.iter().filter(|(name, _)| !name.is_empty()).collect();
        // Longer names win so $PREFIX_SUFFIX is not eaten by $PREFIX
        placeholders.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));
        Self { placeholders }
    }

    /// Tokenize and substitute, producing the final argv
    pub fn parse(&self, command: &str) -> Result<Vec<String>, ParseError> {
        let words = tokenize(command)?;
        Ok(words.iter().map(|word| self.substitute(word)).collect())
    }

    /// Replace `$NAME` placeholders in a single word
    ///
    /// Scans left to right once. Substituted text is never rescanned, so a
    /// value containing `$OTHER` stays literal.
    pub fn substitute(&self, word: &str) -> String {
        let mut out = String::with_capacity(word.len());
        let mut rest = word;

        while let Some(idx) = rest.find('$') {
            out.push_str(&rest[..idx]);
            let after = &rest[idx + 1..];
            match self
                .placeholders
                .iter()
                .find(|(name, _)| after.starts_with(name))
            {
                Some((name, value)) => {
                    out.push_str(value);
                    rest = &after[name.len()..];
                }
                None => {
                    out.push('$');
                    rest = after;
                }
            }
        }

        out.push_str(rest);
        out
    }
}

/// POSIX word splitting via shell-words
pub fn tokenize(command: &str) -> Result<Vec<String>, ParseError> {
    let words =
        shell_words::split(command).map_err(|e| ParseError::ShellWordsParse(e.to_string()))?;
    if words.is_empty() {
        return Err(ParseError::EmptyCommand);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn resolved(pairs: &[(&str, &str)]) -> ResolvedEnvironment {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_simple_command_parsing() {
        let env = resolved(&[]);
        let argv = TemplateParser::new(&env).parse("echo hello world").unwrap();
        assert_eq!(argv, vec!["echo", "hello", "world"]);
    }

    #[test]
    fn test_quoted_arguments() {
        let env = resolved(&[]);
        let argv = TemplateParser::new(&env)
            .parse(r#"grep "Hello World" 'file name.txt'"#)
            .unwrap();
        assert_eq!(argv, vec!["grep", "Hello World", "file name.txt"]);
    }

    #[test]
    fn test_operators_stay_literal() {
        let env = resolved(&[]);
        let argv = TemplateParser::new(&env)
            .parse("echo a && echo b | wc > out; `date` $(whoami)")
            .unwrap();
        assert_eq!(
            argv,
            vec!["echo", "a", "&&", "echo", "b", "|", "wc", ">", "out;", "`date`", "$(whoami)"]
        );
    }

    #[test]
    fn test_unbalanced_quotes_error() {
        let env = resolved(&[]);
        let err = TemplateParser::new(&env).parse("echo 'oops").unwrap_err();
        assert!(matches!(err, ParseError::ShellWordsParse(_)));
    }

    #[test]
    fn test_empty_command_error() {
        assert_eq!(tokenize("   ").unwrap_err(), ParseError::EmptyCommand);
    }

    #[test]
    fn test_injection_value_stays_in_one_word() {
        let env = resolved(&[("ARG", "123 && echo 456")]);
        let argv = TemplateParser::new(&env).parse("echo $ARG").unwrap();
        assert_eq!(argv, vec!["echo", "123 && echo 456"]);
    }

    #[test]
    fn test_longest_name_wins() {
        let env = resolved(&[("A", "x"), ("AB", "y")]);
        let parser = TemplateParser::new(&env);
        assert_eq!(parser.substitute("$AB"), "y");
        assert_eq!(parser.substitute("$A"), "x");
        assert_eq!(parser.substitute("$A-$AB"), "x-y");
        assert_eq!(parser.substitute("--flag=$ABC"), "--flag=yC");
    }

    #[test]
    fn test_unknown_placeholders_untouched() {
        let env = resolved(&[("FILE", "a.py")]);
        let parser = TemplateParser::new(&env);
        assert_eq!(parser.substitute("$UNKNOWN/$FILE"), "$UNKNOWN/a.py");
        assert_eq!(parser.substitute("cost: $"), "cost: $");
        assert_eq!(parser.substitute("$$FILE"), "$a.py");
    }

    #[test]
    fn test_substituted_values_not_rescanned() {
        let env = resolved(&[("A", "$B"), ("B", "secret")]);
        let parser = TemplateParser::new(&env);
        assert_eq!(parser.substitute("$A"), "$B");
    }

    #[test]
    fn test_quoted_placeholder_is_single_word() {
        let env = resolved(&[("MSG", "hello world")]);
        let argv = TemplateParser::new(&env)
            .parse(r#"git commit -m "$MSG now""#)
            .unwrap();
        assert_eq!(argv, vec!["git", "commit", "-m", "hello world now"]);
    }
}
