use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::application::services::AnswerService;
use crate::infrastructure::observability::sanitize_prompt;

use super::render_answer;

pub const PROMPT: &str = "User: ";

/// Line-oriented question loop. Stops on EOF or `exit`/`quit`; a failed
/// question is reported and the loop carries on. Returns the number of
/// questions answered.
pub async fn run_repl<R, W>(
    answer_service: &AnswerService,
    input: R,
    output: &mut W,
) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut answered = 0;

    loop {
        output.write_all(PROMPT.as_bytes()).await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            output.write_all(b"\n").await?;
            break;
        };

        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            break;
        }

        tracing::debug!(question = %sanitize_prompt(question), "Interactive question");

        let reply = match answer_service.ask(question).await {
            Ok(response) => {
                answered += 1;
                format!("\nCareGraph:\n{}\n\n", render_answer(&response.answer))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Interactive question failed");
                format!("An error occurred: {e}\n\n")
            }
        };
        output.write_all(reply.as_bytes()).await?;
    }

    output.flush().await?;
    Ok(answered)
}
