//! External command descriptions shared by the lister, monitor and lock cascade.

use serde::Deserialize;
use std::fmt;

/// A program plus its fixed arguments.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommandSpec {
    #[serde(alias = "name")]
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<P, I, A>(program: P, args: I) -> Self
    where
        P: Into<String>,
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns a copy with every `{key}` placeholder in the arguments replaced.
    pub fn substitute(&self, replacements: &[(&str, &str)]) -> Self {
        let args = self
            .args
            .iter()
            .map(|arg| {
                replacements
                    .iter()
                    .fold(arg.clone(), |acc, (key, value)| {
                        acc.replace(&format!("{{{}}}", key), value)
                    })
            })
            .collect();
        Self {
            program: self.program.clone(),
            args,
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}
