use std::{convert::Infallible, ops::Deref, str::FromStr};

/// One program invocation: the program name followed by its arguments.
///
/// Never empty; stages with no words are dropped while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentList(Vec<String>);

impl ArgumentList {
    pub fn new<I, S>(tokens: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens = tokens.into_iter().map(Into::into).collect::<Vec<_>>();
        (!tokens.is_empty()).then_some(Self(tokens))
    }

    pub fn program(&self) -> &str {
        &self.0[0]
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn args(&self) -> &[String] {
        &self.0[1..]
    }
}

impl Deref for ArgumentList {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// A pipeline: stage `i` writes into stage `i + 1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionPlan {
    stages: Vec<ArgumentList>,
}

impl ExecutionPlan {
    pub fn stages(&self) -> &[ArgumentList] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Whether any word of any stage is exactly `keyword`.
    pub fn mentions(&self, keyword: &str) -> bool {
        self.stages
            .iter()
            .flat_map(|stage| stage.iter())
            .any(|token| token == keyword)
    }
}

impl FromIterator<ArgumentList> for ExecutionPlan {
    fn from_iter<T: IntoIterator<Item = ArgumentList>>(iter: T) -> Self {
        Self {
            stages: iter.into_iter().collect(),
        }
    }
}

impl FromStr for ExecutionPlan {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(crate::parse::parse_line(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_list_rejects_empty() {
        assert_eq!(ArgumentList::new(Vec::<String>::new()), None);

        let list = ArgumentList::new(["head", "-n", "2"]).unwrap();
        assert_eq!(list.program(), "head");
        assert_eq!(list.args(), ["-n", "2"]);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn mentions_matches_whole_words_in_any_stage() {
        let plan: ExecutionPlan = "ls | grep exit".parse().unwrap();
        assert!(plan.mentions("exit"));
        assert!(!plan.mentions("gre"));

        let plan: ExecutionPlan = "echo exited".parse().unwrap();
        assert!(!plan.mentions("exit"));
    }

    #[test]
    fn from_str_keeps_stage_order() {
        let plan: ExecutionPlan = "seq 10 | head -n 3 | tail -n 1".parse().unwrap();
        let programs = plan
            .stages()
            .iter()
            .map(ArgumentList::program)
            .collect::<Vec<_>>();
        assert_eq!(programs, ["seq", "head", "tail"]);
    }
}
