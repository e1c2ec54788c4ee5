use itertools::Itertools;
use logos::Logos;

use crate::cmd::execution_plan::{ArgumentList, ExecutionPlan};

use self::token::Token;

pub mod token;

/// Separates pipeline stages on a command line.
pub const PIPE: char = '|';

/// Splits a line into pipeline stages.
///
/// Adjacent separators do not produce empty stages, and neither do leading or
/// trailing ones. A stage made only of spaces is kept; [`split_arguments`]
/// turns it into nothing.
pub fn split_stages(line: &str) -> Vec<&str> {
    line.split(PIPE).filter(|stage| !stage.is_empty()).collect_vec()
}

/// Splits one stage into its space separated words.
pub fn split_arguments(stage: &str) -> Vec<&str> {
    // every run of non-space characters is a word, so the spans cover
    // exactly the text between separators
    Token::lexer(stage)
        .spanned()
        .map(|(_, span)| &stage[span])
        .collect_vec()
}

/// Turns a raw line into an execution plan, dropping stages with no words.
pub fn parse_line(line: &str) -> ExecutionPlan {
    split_stages(line)
        .into_iter()
        .filter_map(|stage| ArgumentList::new(split_arguments(stage)))
        .collect()
}
