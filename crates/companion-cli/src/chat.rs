use companion_agent::agent::CLARIFY_REPLY;
use companion_agent::{classify, ConversationalAgent, ReplyMode, TaskContext};
use companion_core::CompanionError;
use companion_gateway::error::UNREACHABLE_MESSAGE;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

/// Input that leaves the loop without a reply.
const EXIT_COMMAND: &str = "q";

/// Words that end the session once their reply is printed.
const FAREWELL_WORDS: &[&str] = &["quit", "stop"];

/// Reads lines from `input`, answers each on `output`, until EOF, `q`, or an
/// utterance containing one of [`FAREWELL_WORDS`].
pub async fn run_chat<R, W>(
    agent: &mut ConversationalAgent,
    task: &TaskContext,
    input: R,
    mut output: W,
    timeout: Duration,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output
        .write_all(b"Type 'q' to exit.\n")
        .await?;
    let mut lines = input.lines();

    loop {
        output.write_all(b"You: ").await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let text = line.trim();
        if text.eq_ignore_ascii_case(EXIT_COMMAND) {
            break;
        }
        if text.is_empty() {
            write_reply(&mut output, CLARIFY_REPLY).await?;
            continue;
        }

        let intent = classify(text);
        info!(intent = %intent, text_len = text.len(), "Console turn");
        let reply = match tokio::time::timeout(
            timeout,
            agent.respond(text, task, intent, ReplyMode::Reply),
        )
        .await
        {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => unreachable_reply(e),
            Err(_) => unreachable_reply(CompanionError::timeout(timeout)),
        };
        write_reply(&mut output, &reply).await?;

        let lowered = text.to_lowercase();
        if FAREWELL_WORDS.iter().any(|w| lowered.contains(w)) {
            break;
        }
    }

    Ok(())
}

fn unreachable_reply(err: CompanionError) -> String {
    warn!(error = %err, "Console turn failed");
    UNREACHABLE_MESSAGE.to_string()
}

async fn write_reply<W: AsyncWrite + Unpin>(output: &mut W, reply: &str) -> std::io::Result<()> {
    output
        .write_all(format!("Companion: {reply}\n").as_bytes())
        .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use companion_agent::{AgentSettings, GenerationBackend};
    use companion_core::CompanionResult;
    use std::sync::Arc;

    struct Parrot;

    #[async_trait]
    impl GenerationBackend for Parrot {
        async fn generate(&self, prompt: &str, _model: &str) -> CompanionResult<String> {
            let last_user = prompt
                .lines()
                .filter_map(|l| l.strip_prefix("USER: "))
                .last()
                .unwrap_or_default();
            Ok(format!("heard {last_user}"))
        }
    }

    struct Down;

    #[async_trait]
    impl GenerationBackend for Down {
        async fn generate(&self, _prompt: &str, _model: &str) -> CompanionResult<String> {
            Err(CompanionError::GenerationUnavailable("down".into()))
        }
    }

    async fn chat(backend: Arc<dyn GenerationBackend>, script: &str) -> (String, usize) {
        let mut agent = ConversationalAgent::new(backend, AgentSettings::default(), Some("Cook"));
        let mut out = Vec::new();
        run_chat(
            &mut agent,
            &TaskContext::new(),
            script.as_bytes(),
            &mut out,
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        (String::from_utf8(out).unwrap(), agent.history().len())
    }

    #[tokio::test]
    async fn test_q_exits_without_reply() {
        let (out, turns) = chat(Arc::new(Parrot), "hello\nq\nnever\n").await;
        assert!(out.contains("Companion: heard hello"));
        assert!(!out.contains("never"));
        assert_eq!(turns, 2);
    }

    #[tokio::test]
    async fn test_blank_line_gets_clarification() {
        let (out, turns) = chat(Arc::new(Parrot), "\n").await;
        assert!(out.contains(CLARIFY_REPLY));
        assert_eq!(turns, 0);
    }

    #[tokio::test]
    async fn test_stop_replies_then_exits() {
        let (out, turns) = chat(Arc::new(Parrot), "please stop\nafter\n").await;
        assert!(out.contains("Companion: heard please stop"));
        assert!(!out.contains("after"));
        assert_eq!(turns, 2);
    }

    #[tokio::test]
    async fn test_backend_failure_keeps_loop_running() {
        let (out, _) = chat(Arc::new(Down), "hello\nhey\n").await;
        assert_eq!(out.matches(UNREACHABLE_MESSAGE).count(), 2);
    }
}
