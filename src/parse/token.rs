use logos::Logos;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Default, Error)]
pub enum LexerError {
    #[default]
    #[error("unknown token")]
    UnknownToken,
}

/// Words inside a single pipeline stage. Only the space character separates
/// words, so tabs, quotes, `<`, `>` and even `|` are ordinary word characters.
#[derive(Debug, PartialEq, Logos)]
#[logos(skip r" +", error = LexerError)]
pub enum Token {
    #[regex(r"[^ ]+")]
    Word,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spaces_are_skipped() {
        let tokens = Token::lexer("  ls   -l ").collect::<Vec<_>>();
        assert_eq!(tokens, vec![Ok(Token::Word), Ok(Token::Word)]);
    }

    #[test]
    fn tabs_belong_to_words() {
        let mut lexer = Token::lexer("a\tb c");
        assert_eq!(lexer.next(), Some(Ok(Token::Word)));
        assert_eq!(lexer.slice(), "a\tb");
        assert_eq!(lexer.next(), Some(Ok(Token::Word)));
        assert_eq!(lexer.slice(), "c");
        assert_eq!(lexer.next(), None);
    }
}
