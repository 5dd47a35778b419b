//! Configuration-time error taxonomy.
//!
//! Only construction and registration can fail hard. Runtime misses are not
//! errors: an EC string no pattern matches is an expected, frequent outcome
//! (`parse` returns `None`), an inconsistent match is discarded, and an
//! unusable range bound simply contributes nothing to an expansion. Callers
//! tally misses; the engine never retries.

use thiserror::Error;

/// Fatal problems detected while building rule sets or the registry.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A pattern template referenced a token the TokenSet does not define.
    #[error("unknown token `%{{{name}}}` in pattern `{template}`")]
    UnknownToken { name: String, template: String },

    /// Token references nest deeper than the expansion limit (almost always a
    /// reference cycle).
    #[error("token expansion exceeded depth {limit} in pattern `{template}`")]
    TokenRecursion { limit: usize, template: String },

    /// An expanded pattern failed to compile.
    #[error("invalid pattern `{template}`: {source}")]
    InvalidPattern {
        template: String,
        #[source]
        source: Box<regex::Error>,
    },

    /// A rule set was declared without a title.
    #[error("rule set definition is missing a title")]
    MissingTitle,

    /// Two rule sets claimed the same title.
    #[error("duplicate rule set title `{0}`")]
    DuplicateTitle(String),

    /// A second identifier-less rule set was registered; exactly one
    /// DefaultRuleSet may exist.
    #[error("multiple default rule sets: `{first}` and `{second}`")]
    MultipleDefaults { first: String, second: String },

    /// The registry was built without any identifier-less rule set.
    #[error("no default rule set registered")]
    MissingDefault,

    /// A declarative definition record failed to deserialize.
    #[error("malformed rule set definition: {0}")]
    MalformedDefinition(#[from] serde_json::Error),
}
