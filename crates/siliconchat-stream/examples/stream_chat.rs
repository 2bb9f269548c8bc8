use siliconchat_stream::prelude::*;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), ClientError> {
    let client = ChatClient::from_env()?;
    let mut stream = client.stream_message(
        ModelId::new(DEEPSEEK_R1),
        "Briefly: why is the sky blue?",
    );

    while let Some(event) = stream.next_event().await {
        match event {
            StreamEvent::TextDelta { text, .. } => print!("{text}"),
            StreamEvent::Completed { .. } => println!(),
            StreamEvent::Failed { error } => eprintln!("stream error: {error}"),
        }
    }
    Ok(())
}
