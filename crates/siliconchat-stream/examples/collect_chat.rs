use siliconchat_stream::prelude::*;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), ClientError> {
    let client = ChatClient::from_env()?;
    let text = client
        .stream_message(ModelId::new(DEEPSEEK_V3), "Say hello in one short sentence.")
        .collect_text()
        .await?;
    println!("{text}");
    Ok(())
}
