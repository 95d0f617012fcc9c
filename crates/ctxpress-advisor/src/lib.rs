//! Token-budget aware code selection for completion prompts
//!
//! Given source text and a structural outline of a class, pick the largest
//! rendition that stays under a token budget: the whole file, a single
//! declaration, the methods that use a dependency, or only the lines that
//! touch it.

mod advisor;
mod error;
mod model;
mod tokenizer;

pub use advisor::{strip_imports, FinalPrompt, PromptStrategyAdvisor, DEFAULT_TOKEN_BUDGET};
pub use error::{AdvisorError, AdvisorResult};
pub use model::{ClassSummary, Declaration, FieldInfo, MethodInfo, ParameterInfo};
pub use tokenizer::{
    tokenizer_for, ApproxTokenizer, TiktokenTokenizer, Tokenizer, WhitespaceTokenizer,
};
