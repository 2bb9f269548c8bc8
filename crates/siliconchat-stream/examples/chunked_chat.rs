//! Drives the chunk-reader decoder over a manually opened byte stream,
//! including mid-stream cancellation from a second task.

use std::time::Duration;

use siliconchat_stream::prelude::*;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), ClientError> {
    let client = ChatClient::from_env()?;
    let model = ModelId::new(DEEPSEEK_R1);
    let bytes = client
        .open_completions_stream(&model, "Think briefly, then say hello.")
        .await?;

    let mut stream = decode_chunk_stream(model, bytes);
    let abort = stream.abort_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(30)).await;
        abort.abort();
    });

    while let Some(event) = stream.next_event().await {
        match event {
            StreamEvent::TextDelta { text, .. } => print!("{text}"),
            StreamEvent::Completed { reason } => {
                println!();
                if reason == StopReason::Cancelled {
                    eprintln!("stream cancelled");
                }
            }
            StreamEvent::Failed { error } => eprintln!("stream error: {error}"),
        }
    }
    Ok(())
}
