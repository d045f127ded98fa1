use super::ChatArgs;
use crate::{
    Result,
    config::Config,
    generator,
    service::{Response, Service, TextService},
};
use serde_json::json;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::info;
use uuid::Uuid;

pub async fn run(config: &Config, args: ChatArgs) -> Result<()> {
    let mut text_config = config.text.clone();
    if let Some(flavor) = args.flavor {
        text_config.flavor = flavor;
    }
    if let Some(backend) = args.backend {
        text_config.backend = backend;
    }

    let model = generator::text_model(&text_config)?;
    let service = Service::Text(TextService::new(model, text_config.flavor));

    // One conversation per process
    let user_id = Uuid::new_v4().to_string();
    info!("Starting {} chat session {}", service.name(), user_id);

    let mut stdout = std::io::stdout();
    writeln!(
        stdout,
        "Welcome to the Chatbot using the {} service! Type 'exit' to quit.",
        text_config.flavor
    )?;

    let stdin = BufReader::new(tokio::io::stdin());
    chat_loop(&service, &user_id, stdin, &mut stdout).await
}

/// Reads turns from `input` until `exit`, `quit` or end of input, printing
/// each reply to `out`.
pub async fn chat_loop<R, W>(service: &Service, user_id: &str, input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();

    loop {
        write!(out, "You: ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };

        if is_exit(&line) {
            writeln!(out, "Chatbot: Goodbye!")?;
            break;
        }

        let response = service
            .process_request(user_id, json!({ "input": line }))
            .await;
        writeln!(out, "{}", render(&response))?;
    }

    Ok(())
}

fn is_exit(line: &str) -> bool {
    let line = line.trim();
    line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit")
}

fn render(response: &Response) -> String {
    match response {
        Response::Text { response } => format!("Chatbot: {response}"),
        Response::Error { error } => format!("Error: {error}"),
        Response::Image { image_file_path } => format!("Chatbot: {}", image_file_path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::TextFlavor, generator::EchoTextModel};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn echo_service() -> Service {
        Service::Text(TextService::new(
            Arc::new(EchoTextModel::new()),
            TextFlavor::Dialogue,
        ))
    }

    #[tokio::test]
    async fn test_chat_loop_until_quit() {
        let service = echo_service();
        let mut out = Vec::new();

        chat_loop(&service, "tester", &b"hello\n\nQUIT\nnever read\n"[..], &mut out)
            .await
            .unwrap();

        let transcript = String::from_utf8(out).unwrap();
        assert_eq!(
            transcript,
            "You: Chatbot: [echo] hello\n\
             You: Error: No input text provided\n\
             You: Chatbot: Goodbye!\n"
        );
    }

    #[tokio::test]
    async fn test_chat_loop_stops_at_end_of_input() {
        let service = echo_service();
        let mut out = Vec::new();

        chat_loop(&service, "tester", &b"hi\n"[..], &mut out)
            .await
            .unwrap();

        let transcript = String::from_utf8(out).unwrap();
        assert!(transcript.ends_with("You: \n"));
        let Service::Text(text) = &service else {
            unreachable!()
        };
        assert!(text.sessions().contains("tester"));
    }

    #[test]
    fn test_exit_words_are_case_insensitive() {
        assert!(is_exit("exit"));
        assert!(is_exit("Exit"));
        assert!(is_exit("QUIT"));
        assert!(!is_exit("exit now"));
    }
}
