mod cycle;
mod host;
mod ipmi;
mod scheduler;
#[cfg(test)]
mod testing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    host::run().await
}
