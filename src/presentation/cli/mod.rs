mod render;
mod repl;

pub use render::{render_analysis, render_answer};
pub use repl::{PROMPT, run_repl};
