use bandwagon_http::BandwagonClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let vps = BandwagonClient::from_env()?;

    let info = vps.info().await?;
    println!("{} ({}, {})", info.hostname, info.node_location, info.os);
    println!("{info}");

    if let Some(command) = std::env::args().nth(1) {
        let reply = vps.command(&command).await?.into_result()?;
        println!("{}", reply.message.unwrap_or_default());
    }

    Ok(())
}
