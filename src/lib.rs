/*!

Lossless text compression via arithmetic coding driven by a predictive LLM's
next-token distribution: the better the model predicts the text, the fewer
bits the arithmetic coder needs to spend on each token.

The public surface is [`predictive::compress`]/[`predictive::decompress`],
generic over the [`backend::LlmBackend`] trait so the coder core and the
inference engine vary independently.

*/

pub mod backend;
pub mod cancel;
pub mod cdf;
pub mod cli;
pub mod coder;
pub mod config;
pub mod error;
pub mod overlap;
pub mod pack;
pub mod predictive;

pub use cancel::CancellationToken;
pub use error::LlmZipError;
